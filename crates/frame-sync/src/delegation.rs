use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::debug;

use enact_core_types::timing::FRAME_EXISTENCE_WATCH;
use enact_core_types::{ErrorKind, ErrorRecord, WindowId};

use crate::bus::FrameBus;
use crate::protocol::FrameMessage;

/// Where a delegated step currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DelegationPhase {
    Idle,
    Pinging,
    AwaitingFrameCompletion,
}

/// How a delegated step ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DelegationOutcome {
    /// The frame reported step completion.
    Resumed,
    /// The frame element left the document while the step ran. Treated as
    /// silent completion; pages are allowed to remove their own frames.
    FrameLost,
}

/// Drives one step handed to a nested frame.
///
/// The caller routes the frame's step-completed command into `complete`;
/// everything else (existence ping, run command, removal watch) lives here.
/// The removal watch is part of the select below, so it is dropped on every
/// exit path.
pub struct StepDelegation {
    bus: Arc<FrameBus>,
    phase: Mutex<DelegationPhase>,
    completed: Mutex<Arc<Notify>>,
}

impl StepDelegation {
    pub fn new(bus: Arc<FrameBus>) -> Arc<Self> {
        Arc::new(Self {
            bus,
            phase: Mutex::new(DelegationPhase::Idle),
            completed: Mutex::new(Arc::new(Notify::new())),
        })
    }

    pub fn phase(&self) -> DelegationPhase {
        *self.phase.lock()
    }

    /// The delegated frame reported completion. Safe to call at any time;
    /// a completion landing before the wait starts is kept.
    pub fn complete(&self) {
        self.completed.lock().notify_one();
    }

    /// Run one step inside `frame`: ping it, hand the step over, then wait
    /// for completion while watching that the frame element stays in the
    /// document (`still_attached`, re-checked on the existence cadence).
    pub async fn run<F, Fut>(
        &self,
        frame: &WindowId,
        step_name: &str,
        step_num: i64,
        body: Value,
        ping_timeout: Duration,
        still_attached: F,
    ) -> Result<DelegationOutcome, ErrorRecord>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = bool>,
    {
        // Fresh completion slot so nothing from an earlier step leaks in.
        let completed = {
            let mut slot = self.completed.lock();
            *slot = Arc::new(Notify::new());
            slot.clone()
        };

        *self.phase.lock() = DelegationPhase::Pinging;
        if !self.bus.ping(frame, ping_timeout).await {
            *self.phase.lock() = DelegationPhase::Idle;
            debug!(window = %frame, "frame did not answer the existence ping");
            return Err(ErrorRecord::new(ErrorKind::InIFrameTargetLoadingTimeout));
        }

        self.bus
            .send(
                frame,
                FrameMessage::RunStep {
                    step_name: step_name.to_string(),
                    step_num,
                    body,
                },
            )
            .await;
        *self.phase.lock() = DelegationPhase::AwaitingFrameCompletion;

        let watch = async {
            loop {
                sleep(FRAME_EXISTENCE_WATCH).await;
                if !still_attached().await {
                    break;
                }
            }
        };
        tokio::pin!(watch);

        let outcome = tokio::select! {
            _ = completed.notified() => DelegationOutcome::Resumed,
            _ = &mut watch => {
                debug!(window = %frame, "frame element left the document; resuming locally");
                DelegationOutcome::FrameLost
            }
        };
        *self.phase.lock() = DelegationPhase::Idle;
        Ok(outcome)
    }
}
