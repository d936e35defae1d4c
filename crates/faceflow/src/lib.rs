//! faceflow — async adapter over an external face detection/recognition engine.
//!
//! The engine itself is a closed SDK reached through the contracts in
//! [`faceflow_sdk`]. This crate re-exposes its imperative, blocking operations
//! as asynchronous primitives: single results, optional results, ordered
//! streams and completion signals, each executed off the caller's task. On top
//! of those it composes the detect → recognize → identify pipelines, the
//! capture-session bridge and the session-result query views.
//!
//! The entry point is [`FaceFlow`], a cheaply clonable handle that lazily
//! constructs and caches one engine instance per handle family.

mod adapter;
pub mod config;
mod engine;
pub mod error;
mod imaging;
mod pipeline;
mod results;
mod session;

pub use config::FlowConfig;
pub use engine::FaceFlow;
pub use error::FlowError;
pub use results::FaceCapture;
pub use session::{CancelHandle, CaptureSession};

/// The SDK boundary this adapter wraps, re-exported for consumers.
pub use faceflow_sdk as sdk;
