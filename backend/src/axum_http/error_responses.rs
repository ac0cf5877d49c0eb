use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::usecases::UseCaseError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl IntoResponse for UseCaseError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            UseCaseError::Validation(_) | UseCaseError::NotFound(_) => self.to_string(),
            // Internal detail stays in the logs.
            UseCaseError::Upstream(err) => {
                error!(error = ?err, "http: upstream failure");
                "Payment provider error".to_string()
            }
            UseCaseError::Store(err) => {
                error!(db_error = ?err, "http: store failure");
                "Internal server error".to_string()
            }
        };

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<JsonRejection> for UseCaseError {
    fn from(rejection: JsonRejection) -> Self {
        UseCaseError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for UseCaseError {
    fn from(rejection: PathRejection) -> Self {
        UseCaseError::Validation(rejection.body_text())
    }
}
