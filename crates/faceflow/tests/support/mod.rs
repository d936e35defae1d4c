//! In-memory fake of the external SDK, shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use faceflow::FaceFlow;
use faceflow_sdk::{
    Attachment, Bearing, BoundingBox, DetectionError, DetectionOptions, Engine, EngineConfig,
    EngineInitError, EngineProvider, Face, FaceTemplate, ImageRef, RecognizableFace, SampleFace,
    SessionDelegate, SessionResult, SessionSettings, UserStorageError,
};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn face(x: f32) -> Face {
    Face {
        bounds: BoundingBox { x, y: 0.0, width: 4.0, height: 4.0 },
        quality: 0.9,
    }
}

/// Template whose first byte encodes the similarity score the fake engine
/// reports for it (byte / 100.0).
pub fn template(score_byte: u8) -> FaceTemplate {
    FaceTemplate { data: vec![score_byte], version: 1 }
}

pub fn recognizable(score_byte: u8) -> RecognizableFace {
    RecognizableFace {
        face: face(score_byte as f32),
        template: template(score_byte),
    }
}

pub fn blank_image() -> DynamicImage {
    DynamicImage::new_rgba8(8, 8)
}

pub fn png_bytes(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(pixel));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn image_ref(uri: &str, bytes: Vec<u8>) -> ImageRef {
    ImageRef::new(uri, Arc::<[u8]>::from(bytes.into_boxed_slice()))
}

pub fn attachment(face: SampleFace, image: Option<ImageRef>, bearing: Bearing) -> Attachment {
    Attachment { face, image, bearing }
}

/// What the fake engine does when a capture session is started.
pub enum SessionScript {
    /// Fire the terminal finished callback from another thread.
    Finish(SessionResult),
    /// Fire the terminal canceled callback from another thread.
    Cancel,
    /// Never fire; park the delegate so tests can poke it manually.
    Hold,
}

pub struct FakeEngine {
    /// Faces "present" in whatever image detection is given.
    pub faces: Mutex<Vec<Face>>,
    pub detect_error: Mutex<Option<DetectionError>>,
    pub threshold: f32,
    pub store: Mutex<HashMap<String, Vec<RecognizableFace>>>,
    pub session_script: Mutex<SessionScript>,
    pub held_delegates: Mutex<Vec<Arc<dyn SessionDelegate>>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            faces: Mutex::new(Vec::new()),
            detect_error: Mutex::new(None),
            threshold: 0.4,
            store: Mutex::new(HashMap::new()),
            session_script: Mutex::new(SessionScript::Hold),
            held_delegates: Mutex::new(Vec::new()),
        }
    }

    pub fn put_faces(&self, faces: Vec<Face>) {
        *self.faces.lock().unwrap() = faces;
    }

    pub fn fail_detection(&self, message: &str) {
        *self.detect_error.lock().unwrap() = Some(DetectionError(message.to_string()));
    }

    pub fn enroll(&self, user: &str, score_bytes: &[u8]) {
        let faces = score_bytes.iter().map(|&b| recognizable(b)).collect();
        self.store.lock().unwrap().insert(user.to_string(), faces);
    }

    pub fn script_session(&self, script: SessionScript) {
        *self.session_script.lock().unwrap() = script;
    }

    pub fn held_delegate(&self) -> Arc<dyn SessionDelegate> {
        self.held_delegates.lock().unwrap()[0].clone()
    }
}

impl Engine for FakeEngine {
    fn detect_faces(
        &self,
        _image: &DynamicImage,
        limit: usize,
        _options: &DetectionOptions,
    ) -> Result<Vec<Face>, DetectionError> {
        if let Some(err) = self.detect_error.lock().unwrap().clone() {
            return Err(err);
        }
        let mut faces = self.faces.lock().unwrap().clone();
        faces.truncate(limit);
        Ok(faces)
    }

    fn extract_templates(
        &self,
        faces: &[Face],
        _image: &DynamicImage,
    ) -> Result<Vec<RecognizableFace>, faceflow_sdk::RecognitionError> {
        Ok(faces
            .iter()
            .map(|face| RecognizableFace {
                face: face.clone(),
                template: template(face.bounds.x as u8),
            })
            .collect())
    }

    fn compare_templates(
        &self,
        _probe: &[FaceTemplate],
        gallery: &[FaceTemplate],
    ) -> Result<f32, faceflow_sdk::RecognitionError> {
        let best = gallery
            .iter()
            .map(|t| t.data.first().copied().unwrap_or(0))
            .max()
            .unwrap_or(0);
        Ok(best as f32 / 100.0)
    }

    fn assign_templates(
        &self,
        faces: &[RecognizableFace],
        user_id: &str,
    ) -> Result<(), UserStorageError> {
        self.store
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_default()
            .extend_from_slice(faces);
        Ok(())
    }

    fn delete_users(&self, user_ids: &[String]) -> Result<(), UserStorageError> {
        let mut store = self.store.lock().unwrap();
        for user in user_ids {
            store.remove(user);
        }
        Ok(())
    }

    fn users(&self) -> Result<Vec<String>, UserStorageError> {
        let mut users: Vec<String> = self.store.lock().unwrap().keys().cloned().collect();
        users.sort();
        Ok(users)
    }

    fn faces_of_user(&self, user_id: &str) -> Result<Vec<RecognizableFace>, UserStorageError> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    fn authentication_threshold(&self) -> f32 {
        self.threshold
    }

    fn start_capture_session(
        &self,
        _settings: &SessionSettings,
        delegate: Arc<dyn SessionDelegate>,
    ) {
        match &*self.session_script.lock().unwrap() {
            SessionScript::Finish(result) => {
                let result = result.clone();
                std::thread::spawn(move || delegate.session_did_finish(result));
            }
            SessionScript::Cancel => {
                std::thread::spawn(move || delegate.session_was_canceled());
            }
            SessionScript::Hold => {
                self.held_delegates.lock().unwrap().push(delegate);
            }
        }
    }
}

pub struct FakeProvider {
    pub engine: Arc<FakeEngine>,
    pub constructions: AtomicUsize,
    /// Fail this many constructions before succeeding.
    pub failures_remaining: AtomicUsize,
    /// Delay applied inside create_engine, for concurrency tests.
    pub construction_delay_ms: u64,
}

impl FakeProvider {
    pub fn new(engine: Arc<FakeEngine>) -> Arc<Self> {
        Arc::new(Self {
            engine,
            constructions: AtomicUsize::new(0),
            failures_remaining: AtomicUsize::new(0),
            construction_delay_ms: 0,
        })
    }

    pub fn construction_count(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }
}

impl EngineProvider for FakeProvider {
    fn create_engine(&self, _config: EngineConfig) -> Result<Arc<dyn Engine>, EngineInitError> {
        if self.construction_delay_ms > 0 {
            std::thread::sleep(std::time::Duration::from_millis(self.construction_delay_ms));
        }
        if self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(EngineInitError::InvalidLicense("bad api secret".into()));
        }
        self.constructions.fetch_add(1, Ordering::SeqCst);
        Ok(self.engine.clone())
    }
}

/// A ready-to-use adapter plus handles to its fake internals.
pub fn flow() -> (FaceFlow, Arc<FakeEngine>, Arc<FakeProvider>) {
    let engine = Arc::new(FakeEngine::new());
    let provider = FakeProvider::new(engine.clone());
    let flow = FaceFlow::new(provider.clone());
    (flow, engine, provider)
}
