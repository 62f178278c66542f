//! In-memory step iterator used by the engine's tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::warn;

use enact_core_types::ErrorRecord;

use crate::iterator::{ActionFuture, ActionSeries, StepIterator, WaitingFlags};
use crate::state::{shared_step_state, SharedStepState};

/// Step iterator that records every interaction instead of driving real
/// test code. Tests seed the step context, run gestures, then assert on the
/// ordered op log, the collected errors and the notification payloads.
pub struct RecordingStepIterator {
    state: SharedStepState,
    ops: Mutex<Vec<String>>,
    errors: Mutex<Vec<ErrorRecord>>,
    waiting: Mutex<Vec<WaitingFlags>>,
}

impl RecordingStepIterator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: shared_step_state(),
            ops: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            waiting: Mutex::new(Vec::new()),
        })
    }

    /// Seed the current step number and name.
    pub fn set_step(&self, step: i64, name: &str) {
        let mut state = self.state.write();
        state.step = step;
        state.step_name = Some(name.to_string());
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().clone()
    }

    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.errors.lock().clone()
    }

    pub fn last_error(&self) -> Option<ErrorRecord> {
        self.errors.lock().last().cloned()
    }

    pub fn waiting_flags(&self) -> Vec<WaitingFlags> {
        self.waiting.lock().clone()
    }

    fn push_op(&self, op: impl Into<String>) {
        self.ops.lock().push(op.into());
    }

    fn enter_action(&self) {
        let mut state = self.state.write();
        if state.in_async_action {
            warn!("async action started while another is in flight");
        }
        state.in_async_action = true;
    }

    fn leave_action(&self) {
        self.state.write().in_async_action = false;
    }
}

#[async_trait]
impl StepIterator for RecordingStepIterator {
    async fn async_action(&self, action: ActionFuture) -> Result<(), ErrorRecord> {
        self.enter_action();
        self.push_op("async_action");
        let result = action.await;
        self.leave_action();
        result
    }

    async fn async_action_series(&self, mut series: ActionSeries) -> Result<(), ErrorRecord> {
        self.enter_action();
        self.push_op("series");
        let mut result = Ok(());
        while let Some(action) = series() {
            self.push_op("series_item");
            result = action.await;
            if result.is_err() {
                break;
            }
        }
        self.leave_action();
        result
    }

    fn on_error(&self, record: ErrorRecord) {
        let record = if record.needs_step_context() {
            let state = self.state.read();
            let name = state.step_name.clone().unwrap_or_default();
            record.with_step(name, state.step)
        } else {
            record
        };
        self.push_op(format!("error {}", record.kind));
        self.errors.lock().push(record);
    }

    fn on_target_waiting_started(&self, flags: WaitingFlags) {
        self.push_op("waiting_started");
        self.waiting.lock().push(flags);
    }

    fn on_action_run(&self) {
        self.push_op("action_run");
    }

    fn shared_data(&self) -> Value {
        self.state.read().shared_data.clone()
    }

    fn set_shared_data(&self, data: Value) {
        self.state.write().shared_data = data;
    }

    fn current_step(&self) -> i64 {
        self.state.read().step
    }

    fn current_step_name(&self) -> Option<String> {
        self.state.read().step_name.clone()
    }

    fn state(&self) -> SharedStepState {
        self.state.clone()
    }

    fn resume_step(&self) {
        self.push_op("resume_step");
    }

    fn run_next_step(&self) {
        self.push_op("run_next_step");
    }

    fn rerun_last_step(&self) {
        self.push_op("rerun_last_step");
    }

    fn stop(&self) {
        if let Some(delay) = self.state.write().step_delay.take() {
            delay.cancel();
        }
        self.push_op("stop");
    }

    fn on_frame_action_completed(&self) {
        self.push_op("frame_action_completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enact_core_types::{ErrorKind, GestureName};

    #[tokio::test]
    async fn async_action_brackets_the_in_flight_flag() {
        let iterator = RecordingStepIterator::new();
        let state = iterator.state();

        let observed = Arc::new(Mutex::new(false));
        let observed_in_action = observed.clone();
        let state_in_action = state.clone();
        iterator
            .async_action(Box::pin(async move {
                *observed_in_action.lock() = state_in_action.read().in_async_action;
                Ok(())
            }))
            .await
            .unwrap();

        assert!(*observed.lock());
        assert!(!state.read().in_async_action);
    }

    #[tokio::test]
    async fn series_stops_at_first_failure() {
        let iterator = RecordingStepIterator::new();
        let mut remaining = 3u32;
        let series: ActionSeries = Box::new(move || {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            let fail = remaining == 1;
            Some(Box::pin(async move {
                if fail {
                    Err(ErrorRecord::new(ErrorKind::UncaughtJsError))
                } else {
                    Ok(())
                }
            }) as ActionFuture)
        });

        let result = iterator.async_action_series(series).await;
        assert!(result.is_err());
        let items = iterator
            .ops()
            .iter()
            .filter(|op| *op == "series_item")
            .count();
        assert_eq!(items, 2);
    }

    #[tokio::test]
    async fn on_error_fills_missing_step_context() {
        let iterator = RecordingStepIterator::new();
        iterator.set_step(4, "fill the form");

        iterator.on_error(
            ErrorRecord::new(ErrorKind::InvisibleActionElement).with_action(GestureName::Click),
        );
        let filled = iterator.last_error().unwrap();
        assert_eq!(filled.step_num, Some(4));
        assert_eq!(filled.step_name.as_deref(), Some("fill the form"));

        iterator.on_error(
            ErrorRecord::new(ErrorKind::UncaughtJsError).with_step("earlier step", 2),
        );
        let kept = iterator.last_error().unwrap();
        assert_eq!(kept.step_num, Some(2));
        assert_eq!(kept.step_name.as_deref(), Some("earlier step"));
    }

    #[tokio::test]
    async fn shared_data_round_trips() {
        let iterator = RecordingStepIterator::new();
        iterator.set_shared_data(serde_json::json!({ "counter": 7 }));
        assert_eq!(iterator.shared_data()["counter"], 7);
    }
}
