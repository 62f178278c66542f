use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use enact_core_types::{NodeId, WindowId};

use crate::keys::KeyCombinations;
use crate::options::{ClickOptions, MouseOptions, SelectionSpan, TypeOptions};

/// Selector capability of the page. Returns whatever nodes currently match,
/// in document order; an unknown or malformed selector matches nothing.
#[async_trait]
pub trait ElementQuery: Send + Sync {
    async fn query(&self, selector: &str) -> Vec<NodeId>;
}

/// Node predicates and geometry answered against the live DOM.
///
/// Node handles can dangle once the page mutates; predicates on a dangling
/// handle answer `false`/`None` rather than failing.
#[async_trait]
pub trait DomInspector: Send + Sync {
    async fn is_element(&self, node: &NodeId) -> bool;
    async fn is_text_node(&self, node: &NodeId) -> bool;
    /// Element visibility as the gesture gate sees it.
    async fn is_visible(&self, node: &NodeId) -> bool;
    /// Visibility check that also accepts text nodes by looking at the
    /// nearest parent element.
    async fn is_visible_node(&self, node: &NodeId) -> bool;
    /// `true` for option and optgroup elements, which live inside a closed
    /// dropdown and never pass the plain visibility check.
    async fn is_option_like(&self, node: &NodeId) -> bool;
    /// Visibility rule for option-like elements.
    async fn is_option_visible(&self, node: &NodeId) -> bool;
    async fn is_file_input(&self, node: &NodeId) -> bool;
    async fn is_content_editable(&self, node: &NodeId) -> bool;
    async fn is_multiline_input(&self, node: &NodeId) -> bool;
    async fn is_iframe_element(&self, node: &NodeId) -> bool;
    async fn is_in_document(&self, node: &NodeId) -> bool;
    async fn parent_element(&self, node: &NodeId) -> Option<NodeId>;
    async fn nearest_common_ancestor(&self, a: &NodeId, b: &NodeId) -> Option<NodeId>;
    /// The window owning the node's document.
    async fn owner_window(&self, node: &NodeId) -> WindowId;
    /// For iframe elements, the window of the framed document.
    async fn content_window(&self, node: &NodeId) -> Option<WindowId>;
    /// Human-readable description used in error records.
    async fn describe(&self, node: &NodeId) -> String;
    /// Resolve a requested pointer offset, defaulting to the element center.
    async fn offset_for(&self, node: &NodeId, requested: Option<(i32, i32)>) -> (i32, i32);
}

/// Why a page-side automation refused to simulate its gesture.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AutomationRejection {
    /// The element lost visibility between the gate check and the gesture.
    #[error("element is not visible")]
    ElementInvisible {
        /// Set when the invisible element is an auxiliary one (for example a
        /// drag destination) rather than the gesture target itself.
        additional: bool,
    },
    /// Upload could not map one or more file paths onto real files.
    #[error("can not find files to upload: {0:?}")]
    UnresolvedFilePaths(Vec<String>),
    /// Anything else the page-side automation reported.
    #[error("{0}")]
    Other(String),
}

/// A single prepared gesture simulation. Running it drives the page until
/// the gesture and its dependent events have finished.
#[async_trait]
pub trait Automation: Send + Sync {
    async fn run(&self) -> Result<(), AutomationRejection>;
}

/// Constructors for the page-side gesture automations of one window.
pub trait AutomationSet: Send + Sync {
    fn click(&self, node: &NodeId, options: ClickOptions) -> Box<dyn Automation>;
    /// Click driven through the parent select element, used for option and
    /// optgroup children.
    fn select_child_click(&self, node: &NodeId) -> Box<dyn Automation>;
    fn rclick(&self, node: &NodeId, options: ClickOptions) -> Box<dyn Automation>;
    fn dblclick(&self, node: &NodeId, options: ClickOptions) -> Box<dyn Automation>;
    fn drag_to_element(
        &self,
        node: &NodeId,
        destination: &NodeId,
        options: MouseOptions,
    ) -> Box<dyn Automation>;
    fn drag_to_offset(&self, node: &NodeId, dx: i32, dy: i32, options: MouseOptions)
        -> Box<dyn Automation>;
    fn select_text(&self, node: &NodeId, span: SelectionSpan) -> Box<dyn Automation>;
    /// Selection between two endpoints of a content-editable root.
    fn select_editable_content(&self, start: &NodeId, end: &NodeId) -> Box<dyn Automation>;
    fn type_text(&self, node: &NodeId, text: &str, options: TypeOptions) -> Box<dyn Automation>;
    fn hover(&self, node: &NodeId, options: MouseOptions) -> Box<dyn Automation>;
    fn press(&self, combinations: KeyCombinations) -> Box<dyn Automation>;
    fn upload(&self, node: &NodeId, file_paths: &[String]) -> Box<dyn Automation>;
}

/// Hands out the automation set bound to a given window. Gestures always run
/// against the automations of the window owning their target.
pub trait AutomationProvider: Send + Sync {
    fn automations(&self, window: &WindowId) -> Arc<dyn AutomationSet>;
}

/// Captures the page into a file. Returning means both the capture and the
/// write finished; failures are the implementation's business to log.
#[async_trait]
pub trait ScreenshotTaker: Send + Sync {
    async fn take(&self, file_path: &str);
}

/// Drives top-level navigation.
#[async_trait]
pub trait PageNavigator: Send + Sync {
    async fn navigate_to(&self, url: &str);
}

/// Browser-side plumbing that outlives any single page.
#[async_trait]
pub trait BrowserTransport: Send + Sync {
    /// Reads and clears the file-downloading flag in one step.
    async fn take_file_downloading_flag(&self) -> bool;
}

/// Page load state used by the run-start preparation.
#[async_trait]
pub trait PageReadiness: Send + Sync {
    /// Resolves once the document has finished loading.
    async fn document_ready(&self);
    /// Resolves once in-flight page requests have settled. The delays come
    /// from the runner settings and bound how long the barrier collects.
    async fn requests_settled(&self, collection_delay: Duration, additional_delay: Duration);
}
