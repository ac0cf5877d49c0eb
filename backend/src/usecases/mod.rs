pub mod account_provisioner;
pub mod payment_completion;
pub mod payment_reconciliation;
pub mod payments;
pub mod progress;
pub mod users;

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UseCaseError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("payment provider error: {0}")]
    Upstream(#[source] anyhow::Error),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl UseCaseError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UseCaseError::Validation(_) => StatusCode::BAD_REQUEST,
            UseCaseError::NotFound(_) => StatusCode::NOT_FOUND,
            UseCaseError::Upstream(_) => StatusCode::BAD_GATEWAY,
            UseCaseError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, UseCaseError>;
