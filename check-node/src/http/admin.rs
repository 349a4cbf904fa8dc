//! Operator API: cluster-wide start, status and stop.

use crate::coordinator::{CoordinatorError, StartSummary, StopSummary};
use crate::server::CheckNode;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use check_types::{NodeReport, StartOptions};
use serde::Serialize;
use std::sync::Arc;

/// Error body returned by the operator API.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    error: String,
}

impl ApiError {
    fn new(status: StatusCode, error: impl ToString) -> Self {
        Self {
            status,
            error: error.to_string(),
        }
    }
}

impl From<CoordinatorError> for ApiError {
    fn from(err: CoordinatorError) -> Self {
        let status = match &err {
            CoordinatorError::Busy { .. } => StatusCode::SERVICE_UNAVAILABLE,
            CoordinatorError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CoordinatorError::StopFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// `POST /v1/debug/self_test/start`
pub async fn start_handler(
    Extension(node): Extension<Arc<CheckNode>>,
    options: Result<Json<StartOptions>, JsonRejection>,
) -> Result<Json<StartSummary>, ApiError> {
    let Json(options) = options.map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;
    let summary = node.coordinator().start(options).await?;
    Ok(Json(summary))
}

/// `GET /v1/debug/self_test/status`
pub async fn status_handler(Extension(node): Extension<Arc<CheckNode>>) -> Json<Vec<NodeReport>> {
    Json(node.coordinator().status().await)
}

/// `POST /v1/debug/self_test/stop`
pub async fn stop_handler(
    Extension(node): Extension<Arc<CheckNode>>,
) -> Result<Json<StopSummary>, ApiError> {
    Ok(Json(node.coordinator().stop().await?))
}
