use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::task::JoinHandle;

use enact_core_types::WindowId;

/// Handle on a scheduled delayed step start. Cancelling it keeps the step
/// from starting; used when a run is stopped while a delay is pending.
#[derive(Debug)]
pub struct DelayHandle {
    handle: JoinHandle<()>,
}

impl DelayHandle {
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for DelayHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Mutable per-run state shared between the engine and the embedder's step
/// machinery.
#[derive(Debug, Default)]
pub struct StepState {
    /// Number of the step currently running, counted from zero.
    pub step: i64,
    pub step_name: Option<String>,
    /// Set while an async action (or action series) is in flight. At most
    /// one action may be in flight per iterator.
    pub in_async_action: bool,
    /// Opaque blob the embedder's steps read and write; wait conditions are
    /// evaluated against it.
    pub shared_data: Value,
    /// Pending delayed step start, if any.
    pub step_delay: Option<DelayHandle>,
    /// Frame window whose document load the runner is waiting on before the
    /// current step can run inside it.
    pub awaited_frame: Option<WindowId>,
    /// Frame window currently running a delegated step.
    pub delegated_frame: Option<WindowId>,
    /// Set between beforeunload and the unload outcome; suspends step
    /// resumption while a navigation or download is being disambiguated.
    pub page_unloading: bool,
}

/// Shared handle on the step state.
pub type SharedStepState = Arc<RwLock<StepState>>;

pub fn shared_step_state() -> SharedStepState {
    Arc::new(RwLock::new(StepState::default()))
}
