//! Adapter configuration, loaded from `FACEFLOW_*` environment variables.

use std::time::Duration;

use faceflow_sdk::{Bearing, SessionSettings};

/// Consumer-facing defaults for sessions and detection.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Wall-clock budget for a capture session, in seconds.
    pub session_expiry_secs: u64,
    /// Samples a capture session collects per bearing.
    pub face_capture_count: u32,
    /// Default face limit handed to detection when a caller has no opinion.
    pub detection_limit: usize,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            session_expiry_secs: 30,
            face_capture_count: 1,
            detection_limit: 4,
        }
    }
}

impl FlowConfig {
    /// Load configuration from `FACEFLOW_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            session_expiry_secs: env_u64(
                "FACEFLOW_SESSION_EXPIRY_SECS",
                defaults.session_expiry_secs,
            ),
            face_capture_count: env_u32(
                "FACEFLOW_FACE_CAPTURE_COUNT",
                defaults.face_capture_count,
            ),
            detection_limit: env_usize("FACEFLOW_DETECTION_LIMIT", defaults.detection_limit),
        }
    }

    /// Session settings for a straight-bearing capture with these defaults.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            expiry: Duration::from_secs(self.session_expiry_secs),
            face_capture_count: self.face_capture_count,
            bearings: vec![Bearing::Straight],
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
