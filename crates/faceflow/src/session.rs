//! Capture-session bridge: delegate callbacks mapped to one-shot futures.
//!
//! Sessions are keyed by id in a shared registry. Registering a session
//! associates it with a `oneshot` sender; the delegate relay the engine calls
//! back into holds only the id and a weak registry pointer. Settling removes
//! the registry entry first, so every later callback for the same session is
//! an inert no-op. A session therefore resolves exactly once: with a result,
//! with an error, or as empty when canceled.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use faceflow_sdk::{SessionDelegate, SessionResult, SessionSettings};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::engine::FaceFlow;
use crate::error::FlowError;

pub(crate) enum SessionEvent {
    Finished(SessionResult),
    Canceled,
}

#[derive(Default)]
pub(crate) struct SessionRegistry {
    entries: Mutex<HashMap<Uuid, oneshot::Sender<SessionEvent>>>,
}

impl SessionRegistry {
    fn register(&self) -> (Uuid, oneshot::Receiver<SessionEvent>) {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, tx);
        (id, rx)
    }

    /// Resolve a session. The entry is removed before sending, making
    /// subsequent callbacks for this id no-ops.
    pub(crate) fn settle(&self, id: Uuid, event: SessionEvent) {
        let sender = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if let Some(tx) = sender {
            let _ = tx.send(event);
        } else {
            tracing::debug!(session = %id, "callback for settled session ignored");
        }
    }
}

/// Delegate handed to the engine; forwards the single terminal callback into
/// the registry.
struct SessionRelay {
    id: Uuid,
    registry: Weak<SessionRegistry>,
}

impl SessionDelegate for SessionRelay {
    fn session_did_finish(&self, result: SessionResult) {
        if let Some(registry) = self.registry.upgrade() {
            registry.settle(self.id, SessionEvent::Finished(result));
        }
    }

    fn session_was_canceled(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.settle(self.id, SessionEvent::Canceled);
        }
    }
}

/// A running capture session. Await [`outcome`](Self::outcome) for the
/// terminal event, or cancel it from this handle or a [`CancelHandle`].
pub struct CaptureSession {
    id: Uuid,
    registry: Arc<SessionRegistry>,
    rx: oneshot::Receiver<SessionEvent>,
}

impl CaptureSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// A clonable handle for cancelling this session from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            id: self.id,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Cancel the session: the awaited outcome resolves as empty, and any
    /// delegate callback arriving afterwards is ignored.
    pub fn cancel(&self) {
        self.registry.settle(self.id, SessionEvent::Canceled);
    }

    /// Wait for the session's terminal event.
    ///
    /// - Finished without error: `Ok(Some(result))`
    /// - Finished with a session error: `Err(FlowError::Session(..))`
    /// - Canceled, or the registry slot vanished: `Ok(None)`
    pub async fn outcome(self) -> Result<Option<SessionResult>, FlowError> {
        match self.rx.await {
            Ok(SessionEvent::Finished(result)) => match result.error.clone() {
                Some(failure) => Err(FlowError::Session(failure)),
                None => Ok(Some(result)),
            },
            Ok(SessionEvent::Canceled) | Err(_) => Ok(None),
        }
    }
}

/// Cancels one capture session; see [`CaptureSession::cancel_handle`].
#[derive(Clone)]
pub struct CancelHandle {
    id: Uuid,
    registry: Arc<SessionRegistry>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.registry.settle(self.id, SessionEvent::Canceled);
    }
}

impl FaceFlow {
    /// Start a guided capture session and return a handle to its outcome.
    ///
    /// Cancellation is not an error: a canceled session resolves as empty.
    pub async fn capture_session(
        &self,
        settings: SessionSettings,
    ) -> Result<CaptureSession, FlowError> {
        let engine = self.engine().await?;
        let (id, rx) = self.inner.sessions.register();
        let relay: Arc<dyn SessionDelegate> = Arc::new(SessionRelay {
            id,
            registry: Arc::downgrade(&self.inner.sessions),
        });
        engine.start_capture_session(&settings, relay);
        tracing::debug!(session = %id, bearings = settings.bearings.len(), "capture session started");
        Ok(CaptureSession {
            id,
            registry: Arc::clone(&self.inner.sessions),
            rx,
        })
    }
}
