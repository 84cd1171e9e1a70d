use aih_pricing::config::PricingConfig;
use aih_pricing::error::AppError;
use aih_pricing::pricing::{PricingEngine, ReferenceTable};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Engine and reference table shared by the pricing handlers.
#[derive(Clone)]
pub(crate) struct PricingState {
    pub(crate) engine: Arc<PricingEngine>,
    pub(crate) references: Arc<ReferenceTable>,
}

impl PricingState {
    pub(crate) fn new(engine: PricingEngine, references: ReferenceTable) -> Self {
        Self {
            engine: Arc::new(engine),
            references: Arc::new(references),
        }
    }

    pub(crate) fn load(config: &PricingConfig) -> Result<Self, AppError> {
        let rules = config.load_rules()?;
        let references = config.load_reference_table()?;
        info!(
            special_rules = rules.special_rules.len(),
            reference_entries = references.len(),
            "pricing tables ready"
        );
        Ok(Self::new(PricingEngine::new(rules), references))
    }
}
