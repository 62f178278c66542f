use futures::future::BoxFuture;
use serde_json::Value;

use async_trait::async_trait;
use enact_core_types::ErrorRecord;

use crate::state::SharedStepState;

/// Boxed body of one async action.
pub type ActionFuture = BoxFuture<'static, Result<(), ErrorRecord>>;

/// Lazily built series of async actions. Called once per item; `None` ends
/// the series. Laziness matters: later items must observe the page state
/// left behind by earlier ones.
pub type ActionSeries = Box<dyn FnMut() -> Option<ActionFuture> + Send>;

/// Payload of the target-waiting-started notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WaitingFlags {
    /// Upper bound on the wait, when the caller knows one.
    pub max_timeout_ms: Option<i64>,
    /// Set by the explicit wait-for gesture.
    pub is_wait_action: bool,
}

/// The embedder's step machinery as the engine sees it.
///
/// The engine runs gestures through `async_action`/`async_action_series`,
/// reports failures through `on_error` and raises the two progress
/// notifications; the runner additionally drives the step controls when
/// frames and unloads get involved.
#[async_trait]
pub trait StepIterator: Send + Sync {
    /// Run one async action under the in-async-action flag.
    async fn async_action(&self, action: ActionFuture) -> Result<(), ErrorRecord>;

    /// Run actions strictly one after another, stopping at the first
    /// failure. The whole series counts as a single async action.
    async fn async_action_series(&self, series: ActionSeries) -> Result<(), ErrorRecord>;

    /// Fail the current step. Records that carry no step context yet are
    /// stamped with the iterator's current step.
    fn on_error(&self, record: ErrorRecord);

    /// First target of the current gesture is being waited on.
    fn on_target_waiting_started(&self, flags: WaitingFlags);

    /// The gesture passed its checks and is about to run.
    fn on_action_run(&self);

    fn shared_data(&self) -> Value;
    fn set_shared_data(&self, data: Value);

    fn current_step(&self) -> i64;
    fn current_step_name(&self) -> Option<String>;

    fn state(&self) -> SharedStepState;

    /// Resume the step suspended on a frame load or unload outcome.
    fn resume_step(&self);

    /// Start the next step.
    fn run_next_step(&self);

    /// Run the last step again; used after a page load interrupted it.
    fn rerun_last_step(&self);

    /// Stop the step machinery; cancels a pending delayed start.
    fn stop(&self);

    /// A step delegated to a child frame reported completion.
    fn on_frame_action_completed(&self);
}
