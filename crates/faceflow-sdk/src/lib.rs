//! faceflow-sdk — boundary types and contracts for the external biometric SDK.
//!
//! The detection, recognition and capture-session machinery live inside a
//! closed third-party engine. This crate pins down the shapes that cross that
//! boundary: face and template types, capture-session results, the [`Engine`]
//! trait describing the operations the adapter consumes, and the configuration
//! factories the engine is constructed from.

pub mod engine;
pub mod error;
pub mod types;

pub use engine::{
    DetectionConfig, DetectionConfigFactory, Engine, EngineConfig, EngineProvider,
    RecognitionConfig, RecognitionConfigFactory, SessionDelegate, UserStorageConfig,
    UserStorageConfigFactory,
};
pub use error::{
    DetectionError, EngineInitError, RecognitionError, SessionFailure, UserStorageError,
};
pub use types::{
    Attachment, Bearing, BoundingBox, DetectionOptions, Face, FaceTemplate, ImageRef,
    RecognizableFace, SampleFace, SessionResult, SessionSettings,
};
