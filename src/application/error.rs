use axum::http::StatusCode;
use axum::response::Response;
use thiserror::Error;

use crate::application::clients::UpstreamError;
use crate::domain::error::DomainError;
use crate::infra::error::InfraError;

/// Structured diagnostics carried on error responses as an extension,
/// consumed by the response-logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Service-level failure for content and catalog operations.
///
/// `Domain` covers not-found and validation outcomes; `Upstream` is a
/// network/API failure that could not be masked by stale data.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Top-level application error, used by the binary's startup path.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
