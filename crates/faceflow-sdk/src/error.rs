use thiserror::Error;

/// Engine construction failed. Not cached; the accessor may be retried after
/// the configuration is fixed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineInitError {
    #[error("invalid license or credentials: {0}")]
    InvalidLicense(String),
    #[error("engine construction failed: {0}")]
    Construction(String),
}

/// Detection failure reported by the engine, passed through verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("face detection failed: {0}")]
pub struct DetectionError(pub String);

/// Recognition or template-comparison failure reported by the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("face recognition failed: {0}")]
pub struct RecognitionError(pub String);

/// User-storage failure reported by the engine's enrollment subsystem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("user storage failed: {0}")]
pub struct UserStorageError(pub String);

/// Terminal failure reported by a capture session's delegate callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("capture session failed: {0}")]
pub struct SessionFailure(pub String);
