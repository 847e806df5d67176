//! HTTP handlers.
//!
//! Thin wrappers over [`IntakeService`]: read paths pass results through,
//! the write path only maps validation to 422.

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use valuegrid_core::{CurrentValues, RequestRecord};

use crate::IntakeService;
use crate::error::ApiError;

/// POST /values body. `index` may be a number or a numeric string.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub index: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitResponse {
    pub working: bool,
}

/// GET /values/all
pub async fn all_values(
    State(service): State<IntakeService>,
) -> Result<Json<Vec<RequestRecord>>, ApiError> {
    match service.all_values().await {
        Ok(records) => Ok(Json(records)),
        Err(e) => {
            error!(error = %e, "listing durable values failed");
            Err(e.into())
        }
    }
}

/// GET /values/current
pub async fn current_values(
    State(service): State<IntakeService>,
) -> Result<Json<CurrentValues>, ApiError> {
    match service.current_values().await {
        Ok(values) => Ok(Json(values)),
        Err(e) => {
            error!(error = %e, "reading current values failed");
            Err(e.into())
        }
    }
}

/// POST /values
pub async fn submit(
    State(service): State<IntakeService>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    match service.submit(&req.index) {
        Ok(_) => Ok(Json(SubmitResponse { working: true })),
        Err(e) => {
            info!(index = %req.index, reason = %e, "submission rejected");
            Err(e.into())
        }
    }
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
