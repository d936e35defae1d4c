//! Lazy, invalidation-aware engine handle cache.
//!
//! A [`FaceFlow`] holds at most one engine instance, constructed on first use
//! from the three configuration factories and rebuilt after any factory is
//! reassigned. Reads and invalidations are serialized through one lock; the
//! lock is held across the check-and-construct sequence so concurrent callers
//! never race to build two engines.

use std::sync::Arc;

use faceflow_sdk::{
    DetectionConfigFactory, Engine, EngineConfig, EngineProvider, RecognitionConfigFactory,
    UserStorageConfigFactory,
};
use faceflow_sdk::{DetectionConfig, RecognitionConfig, UserStorageConfig};
use tokio::sync::Mutex;

use crate::error::FlowError;
use crate::session::SessionRegistry;

pub(crate) struct EngineCell {
    detection_factory: Arc<dyn DetectionConfigFactory>,
    recognition_factory: Arc<dyn RecognitionConfigFactory>,
    user_storage_factory: Arc<dyn UserStorageConfigFactory>,
    engine: Option<Arc<dyn Engine>>,
}

pub(crate) struct Inner {
    pub(crate) provider: Arc<dyn EngineProvider>,
    pub(crate) cell: Mutex<EngineCell>,
    pub(crate) sessions: Arc<SessionRegistry>,
}

/// Handle to the adapter. Clones share the same cached engine, configuration
/// factories and capture-session registry.
#[derive(Clone)]
pub struct FaceFlow {
    pub(crate) inner: Arc<Inner>,
}

impl FaceFlow {
    /// Create an adapter over the given SDK binding, with default
    /// configuration factories. No engine is constructed until first use.
    pub fn new(provider: Arc<dyn EngineProvider>) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                cell: Mutex::new(EngineCell {
                    detection_factory: Arc::new(DetectionConfig::default()),
                    recognition_factory: Arc::new(RecognitionConfig::default()),
                    user_storage_factory: Arc::new(UserStorageConfig::default()),
                    engine: None,
                }),
                sessions: Arc::new(SessionRegistry::default()),
            }),
        }
    }

    /// The shared engine instance, constructing it on first access.
    ///
    /// Construction runs on the blocking pool while the cache lock is held,
    /// so at most one construction executes at a time. A construction failure
    /// is returned and not cached; calling again retries.
    pub async fn engine(&self) -> Result<Arc<dyn Engine>, FlowError> {
        let mut cell = self.inner.cell.lock().await;
        if let Some(engine) = &cell.engine {
            return Ok(Arc::clone(engine));
        }

        let config = EngineConfig {
            detection: cell.detection_factory.detection_config(),
            recognition: cell.recognition_factory.recognition_config(),
            user_storage: cell.user_storage_factory.user_storage_config(),
        };
        tracing::debug!(?config, "constructing engine");

        let provider = Arc::clone(&self.inner.provider);
        let engine = tokio::task::spawn_blocking(move || provider.create_engine(config))
            .await
            .map_err(|err| FlowError::Background(err.to_string()))??;

        cell.engine = Some(Arc::clone(&engine));
        tracing::info!("engine constructed and cached");
        Ok(engine)
    }

    /// Replace the detection configuration factory, invalidating any cached
    /// engine in the same critical section.
    pub async fn set_detection_config_factory(
        &self,
        factory: impl DetectionConfigFactory + 'static,
    ) {
        let mut cell = self.inner.cell.lock().await;
        cell.detection_factory = Arc::new(factory);
        cell.engine = None;
        tracing::debug!("detection config factory replaced, engine cache cleared");
    }

    /// Replace the recognition configuration factory, invalidating any cached
    /// engine in the same critical section.
    pub async fn set_recognition_config_factory(
        &self,
        factory: impl RecognitionConfigFactory + 'static,
    ) {
        let mut cell = self.inner.cell.lock().await;
        cell.recognition_factory = Arc::new(factory);
        cell.engine = None;
        tracing::debug!("recognition config factory replaced, engine cache cleared");
    }

    /// Replace the user-storage configuration factory, invalidating any
    /// cached engine in the same critical section.
    pub async fn set_user_storage_config_factory(
        &self,
        factory: impl UserStorageConfigFactory + 'static,
    ) {
        let mut cell = self.inner.cell.lock().await;
        cell.user_storage_factory = Arc::new(factory);
        cell.engine = None;
        tracing::debug!("user storage config factory replaced, engine cache cleared");
    }
}
