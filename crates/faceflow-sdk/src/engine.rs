//! Engine construction seam and the consumed operation contracts.
//!
//! The engine is an expensive, stateful object owned by the closed SDK. It is
//! built from three configuration values, each produced by a pluggable
//! factory so that credentials and model locations can be swapped before the
//! first use.

use std::path::PathBuf;
use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{
    DetectionError, EngineInitError, RecognitionError, UserStorageError,
};
use crate::types::{
    DetectionOptions, Face, FaceTemplate, RecognizableFace, SessionResult, SessionSettings,
};

/// Configuration for the detection subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub model_path: PathBuf,
    pub confidence_threshold: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/detection.bin"),
            confidence_threshold: 0.5,
        }
    }
}

/// Configuration for the recognition subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionConfig {
    pub model_path: PathBuf,
    /// Similarity score at or above which authentication succeeds.
    pub authentication_threshold: f32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/recognition.bin"),
            authentication_threshold: 0.4,
        }
    }
}

/// Configuration for the enrolled-user storage subsystem.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserStorageConfig {
    pub db_path: Option<PathBuf>,
}

/// The three configuration values an engine is constructed from.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub detection: DetectionConfig,
    pub recognition: RecognitionConfig,
    pub user_storage: UserStorageConfig,
}

/// Produces the detection configuration an engine will be built with.
pub trait DetectionConfigFactory: Send + Sync {
    fn detection_config(&self) -> DetectionConfig;
}

impl DetectionConfigFactory for DetectionConfig {
    fn detection_config(&self) -> DetectionConfig {
        self.clone()
    }
}

/// Produces the recognition configuration an engine will be built with.
pub trait RecognitionConfigFactory: Send + Sync {
    fn recognition_config(&self) -> RecognitionConfig;
}

impl RecognitionConfigFactory for RecognitionConfig {
    fn recognition_config(&self) -> RecognitionConfig {
        self.clone()
    }
}

/// Produces the user-storage configuration an engine will be built with.
pub trait UserStorageConfigFactory: Send + Sync {
    fn user_storage_config(&self) -> UserStorageConfig;
}

impl UserStorageConfigFactory for UserStorageConfig {
    fn user_storage_config(&self) -> UserStorageConfig {
        self.clone()
    }
}

/// Constructs engine instances. Implemented by the SDK binding; construction
/// is expensive and may block.
pub trait EngineProvider: Send + Sync {
    fn create_engine(&self, config: EngineConfig) -> Result<Arc<dyn Engine>, EngineInitError>;
}

/// Receives the single terminal callback of a capture session.
///
/// The engine calls exactly one of these, exactly once, from its own thread.
pub trait SessionDelegate: Send + Sync {
    fn session_did_finish(&self, result: SessionResult);
    fn session_was_canceled(&self);
}

/// The biometric engine's imperative operation surface.
///
/// Every method may block; callers are expected to hop off their own thread
/// before invoking one. Errors are opaque and propagated verbatim.
pub trait Engine: Send + Sync {
    /// Detect up to `limit` faces, in the engine's own detection order.
    fn detect_faces(
        &self,
        image: &DynamicImage,
        limit: usize,
        options: &DetectionOptions,
    ) -> Result<Vec<Face>, DetectionError>;

    /// Extract recognition templates for previously detected faces.
    fn extract_templates(
        &self,
        faces: &[Face],
        image: &DynamicImage,
    ) -> Result<Vec<RecognizableFace>, RecognitionError>;

    /// Compare probe templates against a gallery, returning the engine's
    /// aggregate similarity score.
    fn compare_templates(
        &self,
        probe: &[FaceTemplate],
        gallery: &[FaceTemplate],
    ) -> Result<f32, RecognitionError>;

    /// Associate templates with a user, creating the user if needed.
    fn assign_templates(
        &self,
        faces: &[RecognizableFace],
        user_id: &str,
    ) -> Result<(), UserStorageError>;

    /// Delete users and every template assigned to them.
    fn delete_users(&self, user_ids: &[String]) -> Result<(), UserStorageError>;

    /// Enumerate enrolled user identifiers.
    fn users(&self) -> Result<Vec<String>, UserStorageError>;

    /// Templates enrolled for one user.
    fn faces_of_user(&self, user_id: &str) -> Result<Vec<RecognizableFace>, UserStorageError>;

    /// Similarity score at or above which authentication succeeds.
    fn authentication_threshold(&self) -> f32;

    /// Start a guided capture session. The delegate receives exactly one
    /// terminal callback: finished-with-result or canceled.
    fn start_capture_session(&self, settings: &SessionSettings, delegate: Arc<dyn SessionDelegate>);
}

impl std::fmt::Debug for dyn Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Engine")
    }
}
