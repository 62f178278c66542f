//! Shared primitives for the enact engine crates.
//!
//! Everything that crosses a crate boundary more than once lives here:
//! opaque page/node identifiers, the gesture vocabulary, the test-run error
//! taxonomy, the runner settings surface and the shared polling helpers.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;
pub mod timing;

pub use error::{ErrorKind, ErrorRecord};

/// Opaque reference to a DOM node minted by the page collaborator.
///
/// Elements and text nodes share the id space; the DOM inspector classifies a
/// given id when the distinction matters (the `select` gesture accepts text
/// nodes, everything else expects elements).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A frame window. The top document has one as well; gesture automations are
/// always constructed in the context of the window owning their target.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub String);

impl WindowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for WindowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A concrete element paired with its owning frame window.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    pub node: NodeId,
    pub window: WindowId,
}

impl ResolvedTarget {
    pub fn new(node: NodeId, window: WindowId) -> Self {
        Self { node, window }
    }
}

/// The gesture vocabulary. Wire names match the script-facing action names
/// carried inside error records.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GestureName {
    Click,
    Rclick,
    Dblclick,
    Drag,
    Select,
    Type,
    Hover,
    Press,
    Wait,
    WaitFor,
    NavigateTo,
    Upload,
    Screenshot,
}

impl GestureName {
    pub fn as_str(&self) -> &'static str {
        match self {
            GestureName::Click => "click",
            GestureName::Rclick => "rclick",
            GestureName::Dblclick => "dblclick",
            GestureName::Drag => "drag",
            GestureName::Select => "select",
            GestureName::Type => "type",
            GestureName::Hover => "hover",
            GestureName::Press => "press",
            GestureName::Wait => "wait",
            GestureName::WaitFor => "waitFor",
            GestureName::NavigateTo => "navigateTo",
            GestureName::Upload => "upload",
            GestureName::Screenshot => "screenshot",
        }
    }
}

impl fmt::Display for GestureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runner configuration consulted by the engine.
///
/// `selector_timeout_ms` bounds both target resolution and visibility
/// polling. The request-collection delays are used only while preparing the
/// first step, never inside gestures.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunnerSettings {
    pub selector_timeout_ms: u64,
    pub requests_collection_delay_ms: u64,
    pub additional_requests_collection_delay_ms: u64,
    pub skip_js_errors: bool,
    pub recording: bool,
    pub playback: bool,
    pub native_dialogs_info: Option<serde_json::Value>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            selector_timeout_ms: 10_000,
            requests_collection_delay_ms: 300,
            additional_requests_collection_delay_ms: 100,
            skip_js_errors: false,
            recording: false,
            playback: false,
            native_dialogs_info: None,
        }
    }
}

impl RunnerSettings {
    /// Test hook: shrink the availability/visibility timeout at runtime.
    pub fn set_selector_timeout(&mut self, ms: u64) {
        self.selector_timeout_ms = ms;
    }

    pub fn selector_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.selector_timeout_ms)
    }
}

/// Settings handle shared across the per-run context; every poll reads the
/// current value so the test hook takes effect immediately.
pub type SharedSettings = Arc<RwLock<RunnerSettings>>;

pub fn shared_settings(settings: RunnerSettings) -> SharedSettings {
    Arc::new(RwLock::new(settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gesture_names_match_wire_form() {
        assert_eq!(GestureName::WaitFor.as_str(), "waitFor");
        assert_eq!(GestureName::NavigateTo.as_str(), "navigateTo");
        let json = serde_json::to_string(&GestureName::Dblclick).unwrap();
        assert_eq!(json, "\"dblclick\"");
    }

    #[test]
    fn settings_timeout_hook() {
        let settings = shared_settings(RunnerSettings::default());
        assert_eq!(settings.read().selector_timeout_ms, 10_000);
        settings.write().set_selector_timeout(400);
        assert_eq!(
            settings.read().selector_timeout(),
            std::time::Duration::from_millis(400)
        );
    }

    #[test]
    fn node_ids_are_unique() {
        assert_ne!(NodeId::new(), NodeId::new());
    }
}
