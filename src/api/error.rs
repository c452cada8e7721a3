use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::ExtractionTask;
use crate::Error;

/// A pipeline failure bound to the endpoint it happened on.
///
/// Rendered as a plain-text body: validation failures carry their diagnostic with 400,
/// everything else gets the endpoint's failure prefix and 500.
#[derive(Debug)]
pub struct ApiError {
    task: ExtractionTask,
    error: Error,
}

impl ApiError {
    pub fn new(task: ExtractionTask, error: Error) -> Self {
        Self { task, error }
    }

    pub fn status(&self) -> StatusCode {
        if self.error.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    pub fn message(&self) -> String {
        if self.error.is_client_error() {
            self.error.to_string()
        } else {
            format!("{}{}", self.task.failure_prefix(), self.error)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(endpoint = %self.task, error = ?self.error, "Request failed");
        } else {
            tracing::warn!(endpoint = %self.task, "Rejected request: {}", self.error);
        }

        (status, self.message()).into_response()
    }
}
