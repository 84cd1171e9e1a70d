//! Classification and pricing of SUS hospital admission (AIH) procedures.

pub mod config;
pub mod error;
pub mod imports;
pub mod pricing;
pub mod telemetry;
