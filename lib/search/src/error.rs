use crate::voice::TranscriptionError;
use shopmatch_vision::VisionError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

/// Outcomes of a search other than a non-empty result list
///
/// `EmptyResult` is a normal outcome ("nothing matched"), not a failure;
/// callers are expected to branch on it.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    EmptyResult(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Transcription failed: {0}")]
    Transcription(#[from] TranscriptionError),

    #[error("Data source error: {0}")]
    Data(#[source] shopmatch_core::Error),
}

impl SearchError {
    #[inline]
    pub fn is_empty_result(&self) -> bool {
        matches!(self, SearchError::EmptyResult(_))
    }

    #[inline]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, SearchError::InvalidInput(_))
    }
}

impl From<VisionError> for SearchError {
    fn from(e: VisionError) -> Self {
        match e {
            VisionError::Decode(inner) => SearchError::Decode(inner.to_string()),
            VisionError::Io(inner) => SearchError::Decode(inner.to_string()),
            VisionError::InvalidConfig(msg) => SearchError::InvalidConfig(msg),
        }
    }
}

impl From<shopmatch_core::Error> for SearchError {
    fn from(e: shopmatch_core::Error) -> Self {
        match e {
            shopmatch_core::Error::InvalidInput(msg) => SearchError::InvalidInput(msg),
            other => SearchError::Data(other),
        }
    }
}
