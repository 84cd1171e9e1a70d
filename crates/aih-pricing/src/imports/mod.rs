//! CSV importers feeding the pricing engine: SIGTAP reference tables and
//! per-admission procedure lists.

mod normalizer;
pub mod procedures;
pub mod sigtap;

pub use normalizer::{parse_money, ReferenceValueError};
pub use procedures::ProcedureImporter;
pub use sigtap::SigtapTableImporter;

use crate::pricing::QuantityError;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read CSV input: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: column {column} has non-numeric value '{value}'")]
    Number {
        line: u64,
        column: &'static str,
        value: String,
    },
    #[error("line {line}: sequence must be a positive integer")]
    Sequence { line: u64 },
    #[error("line {line}: {source}")]
    Quantity { line: u64, source: QuantityError },
    #[error("line {line}, column {column}: {source}")]
    Money {
        line: u64,
        column: &'static str,
        source: ReferenceValueError,
    },
}
