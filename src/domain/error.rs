use std::time::Duration;

use thiserror::Error;

use crate::api::ExtractError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No URL provided")]
    MissingUrl,

    #[error("Invalid Instagram URL")]
    InvalidDomain,

    #[error("Invalid Reel URL")]
    InvalidShapeForType,

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),
}

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error(transparent)]
    BadRequest(#[from] ValidationError),

    #[error("{0}")]
    ExtractionFailed(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Extraction timed out after {} seconds", .0.as_secs())]
    TimedOut(Duration),

    #[error("Extraction worker unavailable")]
    WorkerUnavailable,
}

impl From<ExtractError> for FetchError {
    fn from(err: ExtractError) -> Self {
        FetchError::ExtractionFailed(err.to_string())
    }
}
