use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use enact_core_types::WindowId;

use crate::channel::FrameChannel;
use crate::protocol::{FrameEnvelope, FrameMessage, RequestId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameRequestError {
    #[error("frame request timed out")]
    Timeout,
    #[error("frame channel closed")]
    ChannelClosed,
}

type Handler = Box<dyn Fn(FrameEnvelope) + Send + Sync>;

/// Routes this endpoint's incoming messages.
///
/// Responses complete their pending request by correlation id; every other
/// command goes to the handler registered for its tag. One dispatch task
/// per bus, started at construction; messages without a handler are
/// dropped with a note.
pub struct FrameBus {
    channel: Arc<dyn FrameChannel>,
    handlers: Arc<DashMap<&'static str, Handler>>,
    pending: Arc<DashMap<RequestId, oneshot::Sender<FrameEnvelope>>>,
    next_request: AtomicU64,
    dispatch: Mutex<Option<JoinHandle<()>>>,
}

impl FrameBus {
    pub fn new(channel: Arc<dyn FrameChannel>) -> Arc<Self> {
        let handlers: Arc<DashMap<&'static str, Handler>> = Arc::new(DashMap::new());
        let pending: Arc<DashMap<RequestId, oneshot::Sender<FrameEnvelope>>> =
            Arc::new(DashMap::new());

        // Subscribe before spawning so nothing sent concurrently is lost.
        let mut rx = channel.incoming();
        let task_handlers = handlers.clone();
        let task_pending = pending.clone();
        let dispatch = tokio::spawn(async move {
            while let Ok(envelope) = rx.recv().await {
                if let Some(request_id) = envelope.message.response_id() {
                    match task_pending.remove(&request_id) {
                        Some((_, tx)) => {
                            let _ = tx.send(envelope);
                        }
                        None => debug!(request_id, "late response dropped"),
                    }
                    continue;
                }
                match task_handlers.get(envelope.message.cmd()) {
                    Some(handler) => handler(envelope),
                    None => debug!(cmd = envelope.message.cmd(), "message with no handler dropped"),
                }
            }
        });

        Arc::new(Self {
            channel,
            handlers,
            pending,
            next_request: AtomicU64::new(1),
            dispatch: Mutex::new(Some(dispatch)),
        })
    }

    /// Register the handler for one command tag, replacing any previous one.
    pub fn on(&self, cmd: &'static str, handler: impl Fn(FrameEnvelope) + Send + Sync + 'static) {
        self.handlers.insert(cmd, Box::new(handler));
    }

    pub async fn send(&self, to: &WindowId, message: FrameMessage) {
        self.channel.send(to, message).await;
    }

    pub async fn ping(&self, window: &WindowId, timeout: Duration) -> bool {
        self.channel.ping(window, timeout).await
    }

    /// Send the request built from a fresh correlation id and await its
    /// reply. The pending slot is cleared on every exit.
    pub async fn request<F>(
        &self,
        to: &WindowId,
        timeout: Duration,
        build: F,
    ) -> Result<FrameEnvelope, FrameRequestError>
    where
        F: FnOnce(RequestId) -> FrameMessage,
    {
        let request_id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(request_id, tx);
        self.channel.send(to, build(request_id)).await;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(envelope)) => Ok(envelope),
            Ok(Err(_)) => {
                self.pending.remove(&request_id);
                Err(FrameRequestError::ChannelClosed)
            }
            Err(_) => {
                self.pending.remove(&request_id);
                Err(FrameRequestError::Timeout)
            }
        }
    }
}

impl Drop for FrameBus {
    fn drop(&mut self) {
        if let Some(task) = self.dispatch.lock().take() {
            task.abort();
        }
    }
}
