//! Request handlers for the extraction endpoints.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::api::error::ApiError;
use crate::models::{
    EndpointRequest, ExtractionResponse, InteractionRequest, LeafletRequest,
    PrescriptionImageRequest, SideEffectRequest,
};
use crate::pipeline::Pipeline;
use crate::Error;

/// Shared handler state. The pipeline is read-only, so no locking is needed.
pub type AppState = Arc<Pipeline>;

impl IntoResponse for ExtractionResponse {
    fn into_response(self) -> Response {
        match self {
            ExtractionResponse::Leaflet(text) => (StatusCode::OK, text).into_response(),
            ExtractionResponse::Interaction(body) => (StatusCode::OK, Json(body)).into_response(),
            ExtractionResponse::SideEffect(body) => (StatusCode::OK, Json(body)).into_response(),
            ExtractionResponse::Prescription(body) => {
                (StatusCode::OK, Json(body)).into_response()
            }
        }
    }
}

/// Validate the body at the boundary, then hand it to the pipeline.
///
/// Unparseable bodies and missing fields are both validation failures, so neither the
/// acquirer nor the model runs for them.
async fn dispatch<R: EndpointRequest>(
    pipeline: &Pipeline,
    body: Result<Json<R>, JsonRejection>,
) -> Result<ExtractionResponse, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        ApiError::new(
            R::TASK,
            Error::Validation(format!(
                "{} ({})",
                R::TASK.validation_message(),
                rejection.body_text()
            )),
        )
    })?;

    let request = body.validate().map_err(|e| ApiError::new(R::TASK, e))?;

    pipeline
        .run(request)
        .await
        .map_err(|e| ApiError::new(R::TASK, e))
}

pub async fn leaflet_analysis(
    State(pipeline): State<AppState>,
    body: Result<Json<LeafletRequest>, JsonRejection>,
) -> Result<ExtractionResponse, ApiError> {
    dispatch(&pipeline, body).await
}

pub async fn interaction_check(
    State(pipeline): State<AppState>,
    body: Result<Json<InteractionRequest>, JsonRejection>,
) -> Result<ExtractionResponse, ApiError> {
    dispatch(&pipeline, body).await
}

pub async fn side_effect_check(
    State(pipeline): State<AppState>,
    body: Result<Json<SideEffectRequest>, JsonRejection>,
) -> Result<ExtractionResponse, ApiError> {
    dispatch(&pipeline, body).await
}

pub async fn prescription_image(
    State(pipeline): State<AppState>,
    body: Result<Json<PrescriptionImageRequest>, JsonRejection>,
) -> Result<ExtractionResponse, ApiError> {
    dispatch(&pipeline, body).await
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
