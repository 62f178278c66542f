use serde::{Deserialize, Serialize};
use serde_json::Value;

use enact_core_types::{ErrorRecord, WindowId};

/// Correlates a request with its response across the frame boundary.
pub type RequestId = u64;

/// Command tags as they appear on the wire. Handler registration uses the
/// same constants.
pub mod cmd {
    pub const STEP_COMPLETED: &str = "stepCompleted";
    pub const ERROR: &str = "error";
    pub const FAILED_ASSERTION: &str = "failedAssertion";
    pub const GET_SHARED_DATA_REQUEST: &str = "getSharedDataRequest";
    pub const GET_SHARED_DATA_RESPONSE: &str = "getSharedDataResponse";
    pub const SET_SHARED_DATA: &str = "setSharedData";
    pub const NEXT_STEP_STARTED: &str = "nextStepStarted";
    pub const ACTION_TARGET_WAITING_STARTED: &str = "actionTargetWaitingStarted";
    pub const ACTION_RUN: &str = "actionRun";
    pub const TAKE_SCREENSHOT_REQUEST: &str = "takeScreenshotRequest";
    pub const TAKE_SCREENSHOT_RESPONSE: &str = "takeScreenshotResponse";
    pub const NATIVE_DIALOGS_INFO_CHANGED: &str = "nativeDialogsInfoChanged";
    pub const BEFORE_UNLOAD_REQUEST: &str = "beforeUnloadRequest";
    pub const BEFORE_UNLOAD_RESPONSE: &str = "beforeUnloadResponse";
    pub const WAITING_STEP_COMPLETION_REQUEST: &str = "waitingStepCompletionRequest";
    pub const WAITING_STEP_COMPLETION_RESPONSE: &str = "waitingStepCompletionResponse";
    pub const RUN_STEP: &str = "runStep";
}

/// One cross-frame command. Every variant is a flat tagged record; requests
/// and responses pair up through `request_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum FrameMessage {
    /// Frame finished the step the parent delegated to it.
    StepCompleted,
    /// Error raised inside a frame. Step fields may be unset; the parent
    /// back-fills them from its own context.
    Error { record: ErrorRecord },
    /// Assertion failure relayed from a frame; the parent renumbers the
    /// step before reporting.
    FailedAssertion { err: Value },
    #[serde(rename_all = "camelCase")]
    GetSharedDataRequest { request_id: RequestId },
    #[serde(rename_all = "camelCase")]
    GetSharedDataResponse { request_id: RequestId, data: Value },
    SetSharedData { data: Value },
    /// Also cancels the receiver's download watch.
    NextStepStarted,
    #[serde(rename_all = "camelCase")]
    ActionTargetWaitingStarted {
        max_timeout_ms: Option<i64>,
        is_wait_action: bool,
    },
    ActionRun,
    #[serde(rename_all = "camelCase")]
    TakeScreenshotRequest {
        request_id: RequestId,
        file_path: String,
    },
    #[serde(rename_all = "camelCase")]
    TakeScreenshotResponse { request_id: RequestId },
    NativeDialogsInfoChanged { info: Value },
    #[serde(rename_all = "camelCase")]
    BeforeUnloadRequest { request_id: RequestId },
    #[serde(rename_all = "camelCase")]
    BeforeUnloadResponse { request_id: RequestId },
    /// Asks the receiver whether it is waiting on the sender's step. Only
    /// answered when it is; the reply itself is the answer.
    #[serde(rename_all = "camelCase")]
    WaitingStepCompletionRequest { request_id: RequestId },
    #[serde(rename_all = "camelCase")]
    WaitingStepCompletionResponse { request_id: RequestId },
    #[serde(rename_all = "camelCase")]
    RunStep {
        step_name: String,
        step_num: i64,
        body: Value,
    },
}

impl FrameMessage {
    /// The wire tag, used for handler registration and logs.
    pub fn cmd(&self) -> &'static str {
        match self {
            Self::StepCompleted => cmd::STEP_COMPLETED,
            Self::Error { .. } => cmd::ERROR,
            Self::FailedAssertion { .. } => cmd::FAILED_ASSERTION,
            Self::GetSharedDataRequest { .. } => cmd::GET_SHARED_DATA_REQUEST,
            Self::GetSharedDataResponse { .. } => cmd::GET_SHARED_DATA_RESPONSE,
            Self::SetSharedData { .. } => cmd::SET_SHARED_DATA,
            Self::NextStepStarted => cmd::NEXT_STEP_STARTED,
            Self::ActionTargetWaitingStarted { .. } => cmd::ACTION_TARGET_WAITING_STARTED,
            Self::ActionRun => cmd::ACTION_RUN,
            Self::TakeScreenshotRequest { .. } => cmd::TAKE_SCREENSHOT_REQUEST,
            Self::TakeScreenshotResponse { .. } => cmd::TAKE_SCREENSHOT_RESPONSE,
            Self::NativeDialogsInfoChanged { .. } => cmd::NATIVE_DIALOGS_INFO_CHANGED,
            Self::BeforeUnloadRequest { .. } => cmd::BEFORE_UNLOAD_REQUEST,
            Self::BeforeUnloadResponse { .. } => cmd::BEFORE_UNLOAD_RESPONSE,
            Self::WaitingStepCompletionRequest { .. } => cmd::WAITING_STEP_COMPLETION_REQUEST,
            Self::WaitingStepCompletionResponse { .. } => cmd::WAITING_STEP_COMPLETION_RESPONSE,
            Self::RunStep { .. } => cmd::RUN_STEP,
        }
    }

    /// The correlation id of a response message, if this is one.
    pub fn response_id(&self) -> Option<RequestId> {
        match self {
            Self::GetSharedDataResponse { request_id, .. }
            | Self::TakeScreenshotResponse { request_id }
            | Self::BeforeUnloadResponse { request_id }
            | Self::WaitingStepCompletionResponse { request_id } => Some(*request_id),
            _ => None,
        }
    }
}

/// One message together with the window it came from. The source window is
/// transport metadata; it never travels in the payload.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameEnvelope {
    pub from: WindowId,
    pub message: FrameMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn messages_serialize_as_flat_tagged_records() {
        let msg = FrameMessage::RunStep {
            step_name: "fill the form".to_string(),
            step_num: 4,
            body: json!({ "source": "act()" }),
        };
        let wire = serde_json::to_value(&msg).unwrap();
        assert_eq!(wire["cmd"], "runStep");
        assert_eq!(wire["stepName"], "fill the form");
        assert_eq!(wire["stepNum"], 4);

        let back: FrameMessage = serde_json::from_value(wire).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn waiting_notification_carries_flat_flags() {
        let wire = serde_json::to_value(FrameMessage::ActionTargetWaitingStarted {
            max_timeout_ms: Some(10_000),
            is_wait_action: true,
        })
        .unwrap();
        assert_eq!(wire["cmd"], "actionTargetWaitingStarted");
        assert_eq!(wire["maxTimeoutMs"], 10_000);
        assert_eq!(wire["isWaitAction"], true);
    }

    #[test]
    fn only_responses_carry_a_correlation_id() {
        assert_eq!(
            FrameMessage::TakeScreenshotResponse { request_id: 9 }.response_id(),
            Some(9)
        );
        assert_eq!(
            FrameMessage::TakeScreenshotRequest {
                request_id: 9,
                file_path: "a.png".to_string(),
            }
            .response_id(),
            None
        );
        assert_eq!(FrameMessage::StepCompleted.response_id(), None);
    }

    #[test]
    fn cmd_matches_the_wire_tag_for_every_variant() {
        let samples = vec![
            FrameMessage::StepCompleted,
            FrameMessage::FailedAssertion { err: json!({}) },
            FrameMessage::GetSharedDataRequest { request_id: 1 },
            FrameMessage::SetSharedData { data: json!(null) },
            FrameMessage::NextStepStarted,
            FrameMessage::ActionRun,
            FrameMessage::NativeDialogsInfoChanged { info: json!({}) },
            FrameMessage::BeforeUnloadRequest { request_id: 2 },
            FrameMessage::WaitingStepCompletionRequest { request_id: 3 },
        ];
        for msg in samples {
            let wire = serde_json::to_value(&msg).unwrap();
            assert_eq!(wire["cmd"], msg.cmd());
        }
    }
}
