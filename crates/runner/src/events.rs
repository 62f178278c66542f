use serde_json::Value;

use enact_core_types::ErrorRecord;
use enact_step_context::WaitingFlags;

/// Progress notifications the runner publishes over the event bus.
///
/// `TestFailed` and `AssertionFailed` number the step that was running when
/// the failure surfaced, which is one behind the iterator's own counter.
#[derive(Clone, Debug)]
pub enum RunnerEvent {
    TestStarted,
    TestCompleted,
    NextStepStarted { step: i64 },
    ActionTargetWaitingStarted { flags: WaitingFlags },
    ActionRun,
    TestFailed { step_num: i64, record: ErrorRecord },
    AssertionFailed { step_num: i64, err: Value },
    ScreenshotStarted { file_path: String },
    ScreenshotFinished { file_path: String },
    NativeDialogsInfoChanged { info: Value },
}
