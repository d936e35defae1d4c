use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SessionFailure;

/// Bounding box for a detected face, in source-image pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A face found by the detection subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub bounds: BoundingBox,
    /// Detection quality in [0, 1]. Higher = sharper, better aligned.
    pub quality: f32,
}

/// Opaque recognition template with a format-version tag.
///
/// Templates of differing versions must not be compared; honoring that is the
/// engine's contract, not enforced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceTemplate {
    pub data: Vec<u8>,
    pub version: u32,
}

/// A detected face plus its extracted recognition template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizableFace {
    pub face: Face,
    pub template: FaceTemplate,
}

/// Face variant stored in a capture-session attachment.
///
/// Downstream filtering only branches on whether a recognition template is
/// present, so the two variants are a tagged union rather than a hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SampleFace {
    Detected(Face),
    Recognizable(RecognizableFace),
}

impl SampleFace {
    /// The detection-level face, regardless of variant.
    pub fn face(&self) -> &Face {
        match self {
            SampleFace::Detected(face) => face,
            SampleFace::Recognizable(recognizable) => &recognizable.face,
        }
    }

    /// The recognition-capable face, if this sample carries a template.
    pub fn recognizable(&self) -> Option<&RecognizableFace> {
        match self {
            SampleFace::Detected(_) => None,
            SampleFace::Recognizable(recognizable) => Some(recognizable),
        }
    }
}

impl AsRef<Face> for Face {
    fn as_ref(&self) -> &Face {
        self
    }
}

impl AsRef<Face> for RecognizableFace {
    fn as_ref(&self) -> &Face {
        &self.face
    }
}

/// Head-orientation label attached to a captured sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bearing {
    Straight,
    Up,
    RightUp,
    Right,
    RightDown,
    Down,
    LeftDown,
    Left,
    LeftUp,
}

/// Reference to one captured image: a URI plus the encoded bytes it resolves to.
#[derive(Debug, Clone)]
pub struct ImageRef {
    pub uri: String,
    pub data: Arc<[u8]>,
}

impl ImageRef {
    pub fn new(uri: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            uri: uri.into(),
            data: data.into(),
        }
    }
}

/// One sample collected during a capture session.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub face: SampleFace,
    pub image: Option<ImageRef>,
    pub bearing: Bearing,
}

/// Output of a guided capture session, produced entirely by the engine's
/// session state machine. This layer only reads it.
#[derive(Debug, Clone, Default)]
pub struct SessionResult {
    /// Samples in the order the session collected them.
    pub attachments: Vec<Attachment>,
    /// Terminal failure reported by the session, if any.
    pub error: Option<SessionFailure>,
}

impl SessionResult {
    /// Attachments' faces that carry a recognition template, optionally
    /// restricted to one bearing, in original attachment order.
    pub fn faces_suitable_for_recognition(&self, bearing: Option<Bearing>) -> Vec<RecognizableFace> {
        self.attachments
            .iter()
            .filter(|attachment| bearing.map_or(true, |b| attachment.bearing == b))
            .filter_map(|attachment| attachment.face.recognizable().cloned())
            .collect()
    }
}

/// Settings for a guided capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Wall-clock budget before the session expires on its own.
    pub expiry: Duration,
    /// Number of samples the session should collect per requested bearing.
    pub face_capture_count: u32,
    /// Bearings the session guides the subject through.
    pub bearings: Vec<Bearing>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            expiry: Duration::from_secs(30),
            face_capture_count: 1,
            bearings: vec![Bearing::Straight],
        }
    }
}

/// Opaque detection flags forwarded verbatim to the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionOptions {
    pub flags: u32,
}
