use crate::infra::{AppState, PricingState};
use aih_pricing::error::AppError;
use aih_pricing::imports::ProcedureImporter;
use aih_pricing::pricing::{Admission, AdmissionPricing, ProcedureRecord, RuleSet};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;

#[derive(Debug, Deserialize)]
pub(crate) struct PriceAdmissionRequest {
    #[serde(default)]
    pub(crate) aih_number: Option<String>,
    #[serde(default)]
    pub(crate) principal_code: Option<String>,
    #[serde(default)]
    pub(crate) procedures: Vec<ProcedureRecord>,
    /// Procedure lines as CSV; replaces `procedures` when present.
    #[serde(default)]
    pub(crate) procedures_csv: Option<String>,
    #[serde(default)]
    pub(crate) quantity_edits: Vec<QuantityEdit>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct QuantityEdit {
    pub(crate) index: usize,
    pub(crate) quantity: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct PriceAdmissionResponse {
    pub(crate) data_source: AdmissionSource,
    #[serde(flatten)]
    pub(crate) pricing: AdmissionPricing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum AdmissionSource {
    Csv,
    Json,
}

pub(crate) fn with_pricing_routes(state: PricingState) -> Router {
    Router::new()
        .route("/api/v1/admissions/price", post(price_admission_endpoint))
        .route("/api/v1/rules", get(rules_endpoint))
        .with_state(state)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn rules_endpoint(State(state): State<PricingState>) -> Json<RuleSet> {
    Json(state.engine.rules().clone())
}

pub(crate) async fn price_admission_endpoint(
    State(state): State<PricingState>,
    Json(payload): Json<PriceAdmissionRequest>,
) -> Result<Json<PriceAdmissionResponse>, AppError> {
    let PriceAdmissionRequest {
        aih_number,
        principal_code,
        procedures,
        procedures_csv,
        quantity_edits,
    } = payload;

    let (mut admission, data_source) = if let Some(csv) = procedures_csv {
        let reader = Cursor::new(csv.into_bytes());
        let admission = ProcedureImporter::from_reader(reader, principal_code)?;
        (admission, AdmissionSource::Csv)
    } else {
        let admission = Admission {
            aih_number: None,
            principal_code,
            procedures,
        };
        (admission, AdmissionSource::Json)
    };
    admission.aih_number = aih_number;

    let mut pricing = state
        .engine
        .price_with_resolver(&admission, state.references.as_ref());
    for edit in quantity_edits {
        pricing.update_quantity(edit.index, edit.quantity)?;
    }

    Ok(Json(PriceAdmissionResponse {
        data_source,
        pricing,
    }))
}
