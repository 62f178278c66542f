//! Test-run error taxonomy.
//!
//! Every failure the engine can produce is one tagged record. Records carry
//! context only (step, gesture, element description, dialog info, file
//! paths); behavior lives with whoever receives them. They serialize with the
//! script-facing camelCase tags so they can cross the frame channel intact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::GestureName;

/// Kind tag of a test-run failure.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// The gesture's first argument never produced an element before the
    /// availability timeout elapsed.
    #[error("the action target was not found")]
    EmptyFirstArgument,

    /// The target element never became visible, or the automation lost it
    /// mid-run.
    #[error("the action element is invisible")]
    InvisibleActionElement,

    /// An additional element required by the automation became invisible.
    #[error("an additional action element is invisible")]
    ActionAdditionalElementIsInvisibleError,

    #[error("the second drag argument is not a destination element or offset pair")]
    IncorrectDraggingSecondArgument,

    #[error("the select action arguments are malformed")]
    IncorrectSelectActionArguments,

    #[error("the type action text is empty")]
    EmptyTypeActionArgument,

    #[error("the press action key sequence can not be parsed")]
    IncorrectPressActionArgument,

    #[error("the wait action milliseconds argument is not a non-negative number")]
    IncorrectWaitActionMillisecondsArgument,

    #[error("the waitFor action event argument is not a callback or selector list")]
    IncorrectWaitForActionEventArgument,

    #[error("the waitFor action timeout argument is not a non-negative number")]
    IncorrectWaitForActionTimeoutArgument,

    #[error("the waitFor condition was not reached before the timeout")]
    WaitForActionTimeoutExceeded,

    #[error("the upload file path argument is not a string or string array")]
    UploadInvalidFilePathArgument,

    #[error("the upload target is not a file input")]
    UploadElementIsNotFileInput,

    #[error("a file to upload can not be found")]
    UploadCanNotFindFileToUpload,

    #[error("the iframe argument is malformed")]
    IncorrectIFrameArgument,

    #[error("the iframe argument matched no element")]
    EmptyIFrameArgument,

    #[error("the iframe argument matched several elements")]
    MultipleIFrameArgument,

    #[error("the iframe argument element is not an iframe")]
    IframeArgumentIsNotIFrame,

    #[error("the iframe did not respond to the existence probe in time")]
    InIFrameTargetLoadingTimeout,

    #[serde(rename = "uncaughtJSError")]
    #[error("an uncaught JavaScript error occurred on the page")]
    UncaughtJsError,

    #[error("an unexpected native dialog appeared")]
    UnexpectedDialog,

    #[error("an expected native dialog did not appear")]
    ExpectedDialogDoesntAppear,
}

/// One reported failure. Purely informational; the step fields are filled by
/// whichever side owns the step context when the record is raised (a parent
/// document back-fills records relayed from frames).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_num: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<GestureName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_err: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub page_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_dest_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialog: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialog_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_paths: Option<Vec<String>>,
    pub raised_at: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            step_name: None,
            step_num: None,
            action: None,
            element: None,
            source_index: None,
            script_err: None,
            page_error: false,
            page_dest_url: None,
            dialog: None,
            dialog_message: None,
            file_paths: None,
            raised_at: Utc::now(),
        }
    }

    pub fn with_action(mut self, action: GestureName) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_element(mut self, description: impl Into<String>) -> Self {
        self.element = Some(description.into());
        self
    }

    pub fn with_step(mut self, name: impl Into<String>, num: i64) -> Self {
        self.step_name = Some(name.into());
        self.step_num = Some(num);
        self
    }

    pub fn with_source_index(mut self, index: u32) -> Self {
        self.source_index = Some(index);
        self
    }

    pub fn with_script_err(mut self, err: impl Into<String>) -> Self {
        self.script_err = Some(err.into());
        self
    }

    /// Mark the record as a page-level error raised at `dest_url`.
    pub fn with_page_error(mut self, dest_url: impl Into<String>) -> Self {
        self.page_error = true;
        self.page_dest_url = Some(dest_url.into());
        self
    }

    pub fn with_dialog(mut self, dialog: impl Into<String>) -> Self {
        self.dialog = Some(dialog.into());
        self
    }

    pub fn with_dialog_message(mut self, message: impl Into<String>) -> Self {
        self.dialog_message = Some(message.into());
        self
    }

    pub fn with_file_paths(mut self, paths: Vec<String>) -> Self {
        self.file_paths = Some(paths);
        self
    }

    /// Whether the step context is still unset and should be back-filled by
    /// the receiving side.
    pub fn needs_step_context(&self) -> bool {
        self.step_num.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_use_script_names() {
        let json = serde_json::to_string(&ErrorKind::EmptyFirstArgument).unwrap();
        assert_eq!(json, "\"emptyFirstArgument\"");
        let json = serde_json::to_string(&ErrorKind::UncaughtJsError).unwrap();
        assert_eq!(json, "\"uncaughtJSError\"");
        let json = serde_json::to_string(&ErrorKind::InIFrameTargetLoadingTimeout).unwrap();
        assert_eq!(json, "\"inIFrameTargetLoadingTimeout\"");
        let json = serde_json::to_string(&ErrorKind::IframeArgumentIsNotIFrame).unwrap();
        assert_eq!(json, "\"iframeArgumentIsNotIFrame\"");
    }

    #[test]
    fn record_round_trips_through_the_wire_form() {
        let record = ErrorRecord::new(ErrorKind::InvisibleActionElement)
            .with_action(GestureName::Click)
            .with_element("<button id=\"go\">")
            .with_step("Open the form", 3);

        let json = serde_json::to_string(&record).unwrap();
        let back: ErrorRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert!(json.contains("\"type\":\"invisibleActionElement\""));
        assert!(json.contains("\"action\":\"click\""));
    }

    #[test]
    fn step_context_backfill_detection() {
        let record = ErrorRecord::new(ErrorKind::UncaughtJsError);
        assert!(record.needs_step_context());
        let record = record.with_step("step", 1);
        assert!(!record.needs_step_context());
    }
}
