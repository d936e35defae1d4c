use faceflow_sdk::{
    DetectionError, EngineInitError, RecognitionError, SessionFailure, UserStorageError,
};
use thiserror::Error;

/// Errors surfaced by the adapter. Engine-originated errors pass through
/// unmodified; nothing in this layer retries. Session cancellation is not an
/// error and is reported as an empty optional instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("engine initialization: {0}")]
    EngineInit(#[from] EngineInitError),
    #[error("image decoding failed: {0}")]
    ImageDecoding(String),
    #[error("detection: {0}")]
    Detection(#[from] DetectionError),
    #[error("recognition: {0}")]
    Recognition(#[from] RecognitionError),
    #[error("user storage: {0}")]
    UserStorage(#[from] UserStorageError),
    #[error("session: {0}")]
    Session(#[from] SessionFailure),
    #[error("expected exactly one element, stream produced {0}")]
    ExactlyOneExpected(usize),
    #[error("background task failed: {0}")]
    Background(String),
}

impl From<image::ImageError> for FlowError {
    fn from(err: image::ImageError) -> Self {
        FlowError::ImageDecoding(err.to_string())
    }
}
