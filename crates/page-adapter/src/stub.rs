//! In-memory page used by the engine's tests.
//!
//! `StubPage` implements every collaborator port against scripted state:
//! selectors can start matching after the n-th query, elements can turn
//! visible after the n-th check, automations can be told to reject or to
//! take simulated time. Every interesting call lands in a single ordered
//! log so tests can assert strict sequencing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::{sleep, Instant};

use enact_core_types::{NodeId, WindowId};
use enact_event_bus::InMemoryBus;

use crate::events::{DialogEvent, PageEvent};
use crate::keys::KeyCombinations;
use crate::options::{ClickOptions, MouseOptions, SelectionSpan, TypeOptions};
use crate::ports::{
    Automation, AutomationProvider, AutomationRejection, AutomationSet, BrowserTransport,
    DomInspector, ElementQuery, PageNavigator, PageReadiness, ScreenshotTaker,
};

/// One recorded collaborator call. Entries appear in call order; `at` uses
/// the tokio clock so paused-time tests get deterministic timestamps.
#[derive(Clone, Debug)]
pub struct CallRecord {
    pub op: String,
    pub detail: String,
    pub at: Instant,
}

/// Declarative node description used to seed the stub page.
#[derive(Clone, Debug)]
pub struct StubNode {
    description: String,
    text_node: bool,
    visible: bool,
    option_like: bool,
    option_visible: bool,
    file_input: bool,
    content_editable: bool,
    multiline: bool,
    in_document: bool,
    parent: Option<NodeId>,
    window: Option<WindowId>,
    content_window: Option<WindowId>,
    center: (i32, i32),
}

impl StubNode {
    pub fn element(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            text_node: false,
            visible: true,
            option_like: false,
            option_visible: false,
            file_input: false,
            content_editable: false,
            multiline: false,
            in_document: true,
            parent: None,
            window: None,
            content_window: None,
            center: (0, 0),
        }
    }

    pub fn text(description: impl Into<String>) -> Self {
        let mut node = Self::element(description);
        node.text_node = true;
        node
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn option_like(mut self, visible: bool) -> Self {
        self.option_like = true;
        self.option_visible = visible;
        self
    }

    pub fn file_input(mut self) -> Self {
        self.file_input = true;
        self
    }

    pub fn content_editable(mut self) -> Self {
        self.content_editable = true;
        self
    }

    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    pub fn detached(mut self) -> Self {
        self.in_document = false;
        self
    }

    pub fn parent(mut self, parent: &NodeId) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn in_window(mut self, window: &WindowId) -> Self {
        self.window = Some(window.clone());
        self
    }

    /// Mark this node as an iframe element framing `window`.
    pub fn iframe_to(mut self, window: &WindowId) -> Self {
        self.content_window = Some(window.clone());
        self
    }

    pub fn center(mut self, x: i32, y: i32) -> Self {
        self.center = (x, y);
        self
    }
}

#[derive(Clone, Debug)]
struct NodeState {
    node: StubNode,
    /// When set, `is_visible` answers true from this 1-based check onward.
    visible_from_check: Option<u32>,
}

#[derive(Clone, Debug)]
struct SelectorScript {
    nodes: Vec<NodeId>,
    /// 1-based query number from which the selector starts matching.
    match_from_query: u32,
}

#[derive(Default)]
struct Inner {
    nodes: HashMap<NodeId, NodeState>,
    selectors: HashMap<String, SelectorScript>,
    log: Vec<CallRecord>,
    query_counts: HashMap<String, u32>,
    visibility_counts: HashMap<NodeId, u32>,
    rejections: HashMap<String, Vec<AutomationRejection>>,
    run_delays: HashMap<String, Duration>,
    screenshots: Vec<String>,
    navigations: Vec<String>,
    downloading: bool,
    ready_delay: Duration,
    pending_request_rounds: u32,
}

/// In-memory implementation of every page collaborator port.
pub struct StubPage {
    top: WindowId,
    inner: Arc<Mutex<Inner>>,
    dialog_bus: Arc<InMemoryBus<DialogEvent>>,
    page_bus: Arc<InMemoryBus<PageEvent>>,
}

impl StubPage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            top: WindowId::new(),
            inner: Arc::new(Mutex::new(Inner::default())),
            dialog_bus: InMemoryBus::new(32),
            page_bus: InMemoryBus::new(32),
        })
    }

    pub fn top_window(&self) -> WindowId {
        self.top.clone()
    }

    pub fn dialog_events(&self) -> Arc<InMemoryBus<DialogEvent>> {
        self.dialog_bus.clone()
    }

    pub fn page_events(&self) -> Arc<InMemoryBus<PageEvent>> {
        self.page_bus.clone()
    }

    /// Register a node and return its handle.
    pub fn add_node(&self, node: StubNode) -> NodeId {
        let id = NodeId::new();
        self.inner.lock().nodes.insert(
            id.clone(),
            NodeState {
                node,
                visible_from_check: None,
            },
        );
        id
    }

    /// Make a selector match the given nodes from the first query on.
    pub fn set_matches(&self, selector: impl Into<String>, nodes: Vec<NodeId>) {
        self.appear_after_queries(selector, nodes, 1);
    }

    /// Make a selector match only from the `from_query`-th query onward
    /// (1-based), simulating content that appears later.
    pub fn appear_after_queries(
        &self,
        selector: impl Into<String>,
        nodes: Vec<NodeId>,
        from_query: u32,
    ) {
        self.inner.lock().selectors.insert(
            selector.into(),
            SelectorScript {
                nodes,
                match_from_query: from_query.max(1),
            },
        );
    }

    pub fn set_visible(&self, node: &NodeId, visible: bool) {
        let mut inner = self.inner.lock();
        if let Some(state) = inner.nodes.get_mut(node) {
            state.node.visible = visible;
            state.visible_from_check = None;
        }
    }

    /// Make `is_visible` answer true from the `from_check`-th check onward.
    pub fn show_after_checks(&self, node: &NodeId, from_check: u32) {
        let mut inner = self.inner.lock();
        if let Some(state) = inner.nodes.get_mut(node) {
            state.visible_from_check = Some(from_check.max(1));
        }
    }

    /// Detach a node from its document.
    pub fn remove_from_document(&self, node: &NodeId) {
        let mut inner = self.inner.lock();
        if let Some(state) = inner.nodes.get_mut(node) {
            state.node.in_document = false;
        }
    }

    /// Queue a rejection for the next run of the named automation.
    pub fn script_rejection(&self, op: &str, rejection: AutomationRejection) {
        self.inner
            .lock()
            .rejections
            .entry(op.to_string())
            .or_default()
            .push(rejection);
    }

    /// Give every run of the named automation a fixed simulated duration.
    pub fn script_run_delay(&self, op: &str, delay: Duration) {
        self.inner.lock().run_delays.insert(op.to_string(), delay);
    }

    pub fn set_downloading(&self, on: bool) {
        self.inner.lock().downloading = on;
    }

    pub fn script_ready_delay(&self, delay: Duration) {
        self.inner.lock().ready_delay = delay;
    }

    /// Simulate `rounds` extra request-barrier collection rounds.
    pub fn script_pending_requests(&self, rounds: u32) {
        self.inner.lock().pending_request_rounds = rounds;
    }

    pub fn log(&self) -> Vec<CallRecord> {
        self.inner.lock().log.clone()
    }

    /// The `op` column of the log, in call order.
    pub fn ops(&self) -> Vec<String> {
        self.inner.lock().log.iter().map(|r| r.op.clone()).collect()
    }

    pub fn query_count(&self, selector: &str) -> u32 {
        self.inner
            .lock()
            .query_counts
            .get(selector)
            .copied()
            .unwrap_or(0)
    }

    pub fn visibility_checks(&self, node: &NodeId) -> u32 {
        self.inner
            .lock()
            .visibility_counts
            .get(node)
            .copied()
            .unwrap_or(0)
    }

    pub fn screenshots(&self) -> Vec<String> {
        self.inner.lock().screenshots.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.inner.lock().navigations.clone()
    }

    pub fn raise_js_error(&self, message: &str, page_url: &str, in_iframe: bool) {
        self.page_bus.publish_lossy(PageEvent::UncaughtJsError {
            message: message.to_string(),
            page_url: page_url.to_string(),
            in_iframe,
        });
    }

    pub fn raise_before_unload(&self) {
        self.page_bus.publish_lossy(PageEvent::BeforeUnload);
    }

    pub fn raise_unload(&self) {
        self.page_bus.publish_lossy(PageEvent::Unload);
    }

    pub fn raise_unexpected_dialog(&self, dialog: &str, message: &str) {
        self.dialog_bus.publish_lossy(DialogEvent::Unexpected {
            dialog: dialog.to_string(),
            message: message.to_string(),
        });
    }

    pub fn raise_expected_dialog_missing(&self, dialog: &str) {
        self.dialog_bus.publish_lossy(DialogEvent::ExpectedMissing {
            dialog: dialog.to_string(),
        });
    }

    pub fn raise_dialogs_info(&self, info: serde_json::Value) {
        self.dialog_bus
            .publish_lossy(DialogEvent::InfoChanged { info });
    }

    fn record(&self, op: &str, detail: impl Into<String>) {
        self.inner.lock().log.push(CallRecord {
            op: op.to_string(),
            detail: detail.into(),
            at: Instant::now(),
        });
    }

    fn with_node<T>(&self, node: &NodeId, read: impl FnOnce(&StubNode) -> T, missing: T) -> T {
        let inner = self.inner.lock();
        match inner.nodes.get(node) {
            Some(state) => read(&state.node),
            None => missing,
        }
    }
}

#[async_trait]
impl ElementQuery for StubPage {
    async fn query(&self, selector: &str) -> Vec<NodeId> {
        let mut inner = self.inner.lock();
        let count = inner.query_counts.entry(selector.to_string()).or_insert(0);
        *count += 1;
        let seen = *count;
        inner.log.push(CallRecord {
            op: "query".to_string(),
            detail: selector.to_string(),
            at: Instant::now(),
        });
        match inner.selectors.get(selector) {
            Some(script) if seen >= script.match_from_query => script.nodes.clone(),
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl DomInspector for StubPage {
    async fn is_element(&self, node: &NodeId) -> bool {
        self.with_node(node, |n| !n.text_node, false)
    }

    async fn is_text_node(&self, node: &NodeId) -> bool {
        self.with_node(node, |n| n.text_node, false)
    }

    async fn is_visible(&self, node: &NodeId) -> bool {
        let mut inner = self.inner.lock();
        let count = inner.visibility_counts.entry(node.clone()).or_insert(0);
        *count += 1;
        let seen = *count;
        inner.log.push(CallRecord {
            op: "isVisible".to_string(),
            detail: node.to_string(),
            at: Instant::now(),
        });
        match inner.nodes.get(node) {
            Some(state) => match state.visible_from_check {
                Some(from) => seen >= from,
                None => state.node.visible,
            },
            None => false,
        }
    }

    async fn is_visible_node(&self, node: &NodeId) -> bool {
        let inner = self.inner.lock();
        let mut current = node.clone();
        loop {
            match inner.nodes.get(&current) {
                Some(state) if state.node.text_node => match &state.node.parent {
                    Some(parent) => current = parent.clone(),
                    None => return false,
                },
                Some(state) => return state.node.visible,
                None => return false,
            }
        }
    }

    async fn is_option_like(&self, node: &NodeId) -> bool {
        self.with_node(node, |n| n.option_like, false)
    }

    async fn is_option_visible(&self, node: &NodeId) -> bool {
        self.with_node(node, |n| n.option_visible, false)
    }

    async fn is_file_input(&self, node: &NodeId) -> bool {
        self.with_node(node, |n| n.file_input, false)
    }

    async fn is_content_editable(&self, node: &NodeId) -> bool {
        self.with_node(node, |n| n.content_editable, false)
    }

    async fn is_multiline_input(&self, node: &NodeId) -> bool {
        self.with_node(node, |n| n.multiline, false)
    }

    async fn is_iframe_element(&self, node: &NodeId) -> bool {
        self.with_node(node, |n| n.content_window.is_some(), false)
    }

    async fn is_in_document(&self, node: &NodeId) -> bool {
        self.with_node(node, |n| n.in_document, false)
    }

    async fn parent_element(&self, node: &NodeId) -> Option<NodeId> {
        self.with_node(node, |n| n.parent.clone(), None)
    }

    async fn nearest_common_ancestor(&self, a: &NodeId, b: &NodeId) -> Option<NodeId> {
        let inner = self.inner.lock();
        let mut chain = Vec::new();
        let mut current = Some(a.clone());
        while let Some(id) = current {
            chain.push(id.clone());
            current = inner.nodes.get(&id).and_then(|s| s.node.parent.clone());
        }
        let mut current = Some(b.clone());
        while let Some(id) = current {
            if chain.contains(&id) {
                return Some(id);
            }
            current = inner.nodes.get(&id).and_then(|s| s.node.parent.clone());
        }
        None
    }

    async fn owner_window(&self, node: &NodeId) -> WindowId {
        self.with_node(node, |n| n.window.clone(), None)
            .unwrap_or_else(|| self.top.clone())
    }

    async fn content_window(&self, node: &NodeId) -> Option<WindowId> {
        self.with_node(node, |n| n.content_window.clone(), None)
    }

    async fn describe(&self, node: &NodeId) -> String {
        self.with_node(node, |n| n.description.clone(), format!("<{node}>"))
    }

    async fn offset_for(&self, node: &NodeId, requested: Option<(i32, i32)>) -> (i32, i32) {
        match requested {
            Some(offset) => offset,
            None => self.with_node(node, |n| n.center, (0, 0)),
        }
    }
}

impl AutomationProvider for StubPage {
    fn automations(&self, window: &WindowId) -> Arc<dyn AutomationSet> {
        self.record("automations", window.to_string());
        Arc::new(StubAutomations {
            inner: self.inner.clone(),
        })
    }
}

#[async_trait]
impl ScreenshotTaker for StubPage {
    async fn take(&self, file_path: &str) {
        self.record("screenshot", file_path);
        self.inner.lock().screenshots.push(file_path.to_string());
    }
}

#[async_trait]
impl PageNavigator for StubPage {
    async fn navigate_to(&self, url: &str) {
        self.record("navigate", url);
        self.inner.lock().navigations.push(url.to_string());
    }
}

#[async_trait]
impl BrowserTransport for StubPage {
    async fn take_file_downloading_flag(&self) -> bool {
        let mut inner = self.inner.lock();
        let was = inner.downloading;
        inner.downloading = false;
        inner.log.push(CallRecord {
            op: "downloadFlag".to_string(),
            detail: was.to_string(),
            at: Instant::now(),
        });
        was
    }
}

#[async_trait]
impl PageReadiness for StubPage {
    async fn document_ready(&self) {
        let delay = self.inner.lock().ready_delay;
        if !delay.is_zero() {
            sleep(delay).await;
        }
        self.record("documentReady", "");
    }

    async fn requests_settled(&self, collection_delay: Duration, additional_delay: Duration) {
        let rounds = self.inner.lock().pending_request_rounds;
        sleep(collection_delay).await;
        for _ in 0..rounds {
            sleep(additional_delay).await;
        }
        self.record("requestsSettled", "");
    }
}

struct StubAutomations {
    inner: Arc<Mutex<Inner>>,
}

impl StubAutomations {
    fn automation(&self, op: &str, detail: String) -> Box<dyn Automation> {
        Box::new(StubAutomation {
            inner: self.inner.clone(),
            op: op.to_string(),
            detail,
        })
    }
}

impl AutomationSet for StubAutomations {
    fn click(&self, node: &NodeId, options: ClickOptions) -> Box<dyn Automation> {
        self.automation("click", format!("{node} {:?}", options.offset))
    }

    fn select_child_click(&self, node: &NodeId) -> Box<dyn Automation> {
        self.automation("selectChildClick", node.to_string())
    }

    fn rclick(&self, node: &NodeId, options: ClickOptions) -> Box<dyn Automation> {
        self.automation("rclick", format!("{node} {:?}", options.offset))
    }

    fn dblclick(&self, node: &NodeId, options: ClickOptions) -> Box<dyn Automation> {
        self.automation("dblclick", format!("{node} {:?}", options.offset))
    }

    fn drag_to_element(
        &self,
        node: &NodeId,
        destination: &NodeId,
        _options: MouseOptions,
    ) -> Box<dyn Automation> {
        self.automation("dragToElement", format!("{node} -> {destination}"))
    }

    fn drag_to_offset(
        &self,
        node: &NodeId,
        dx: i32,
        dy: i32,
        _options: MouseOptions,
    ) -> Box<dyn Automation> {
        self.automation("dragToOffset", format!("{node} by ({dx}, {dy})"))
    }

    fn select_text(&self, node: &NodeId, span: SelectionSpan) -> Box<dyn Automation> {
        self.automation("selectText", format!("{node} {span:?}"))
    }

    fn select_editable_content(&self, start: &NodeId, end: &NodeId) -> Box<dyn Automation> {
        self.automation("selectEditableContent", format!("{start} -> {end}"))
    }

    fn type_text(&self, node: &NodeId, text: &str, _options: TypeOptions) -> Box<dyn Automation> {
        self.automation("type", format!("{node} '{text}'"))
    }

    fn hover(&self, node: &NodeId, _options: MouseOptions) -> Box<dyn Automation> {
        self.automation("hover", node.to_string())
    }

    fn press(&self, combinations: KeyCombinations) -> Box<dyn Automation> {
        self.automation("press", combinations.combinations.join(" "))
    }

    fn upload(&self, node: &NodeId, file_paths: &[String]) -> Box<dyn Automation> {
        self.automation("upload", format!("{node} {}", file_paths.join(", ")))
    }
}

struct StubAutomation {
    inner: Arc<Mutex<Inner>>,
    op: String,
    detail: String,
}

#[async_trait]
impl Automation for StubAutomation {
    async fn run(&self) -> Result<(), AutomationRejection> {
        let (outcome, delay) = {
            let mut inner = self.inner.lock();
            inner.log.push(CallRecord {
                op: format!("run {}", self.op),
                detail: self.detail.clone(),
                at: Instant::now(),
            });
            let outcome = inner
                .rejections
                .get_mut(&self.op)
                .and_then(|queued| (!queued.is_empty()).then(|| queued.remove(0)));
            let delay = inner
                .run_delays
                .get(&self.op)
                .copied()
                .unwrap_or(Duration::ZERO);
            (outcome, delay)
        };
        if !delay.is_zero() {
            sleep(delay).await;
        }
        self.inner.lock().log.push(CallRecord {
            op: format!("done {}", self.op),
            detail: self.detail.clone(),
            at: Instant::now(),
        });
        match outcome {
            Some(rejection) => Err(rejection),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn selector_appearance_schedule_counts_queries() {
        let page = StubPage::new();
        let node = page.add_node(StubNode::element("div#late"));
        page.appear_after_queries("#late", vec![node.clone()], 3);

        assert!(page.query("#late").await.is_empty());
        assert!(page.query("#late").await.is_empty());
        assert_eq!(page.query("#late").await, vec![node]);
        assert_eq!(page.query_count("#late"), 3);
    }

    #[tokio::test]
    async fn visibility_schedule_counts_checks() {
        let page = StubPage::new();
        let node = page.add_node(StubNode::element("div#shy").visible(false));
        page.show_after_checks(&node, 2);

        assert!(!page.is_visible(&node).await);
        assert!(page.is_visible(&node).await);
        assert_eq!(page.visibility_checks(&node), 2);
    }

    #[tokio::test]
    async fn scripted_rejection_is_consumed_once() {
        let page = StubPage::new();
        let node = page.add_node(StubNode::element("button"));
        page.script_rejection("click", AutomationRejection::ElementInvisible { additional: false });

        let set = page.automations(&page.top_window());
        let first = set.click(&node, ClickOptions::default()).run().await;
        let second = set.click(&node, ClickOptions::default()).run().await;
        assert!(first.is_err());
        assert!(second.is_ok());

        let ops = page.ops();
        assert!(ops.contains(&"run click".to_string()));
        assert!(ops.contains(&"done click".to_string()));
    }

    #[tokio::test]
    async fn text_node_visibility_follows_parent() {
        let page = StubPage::new();
        let parent = page.add_node(StubNode::element("p").visible(false));
        let text = page.add_node(StubNode::text("'hello'").parent(&parent));

        assert!(!page.is_visible_node(&text).await);
        page.set_visible(&parent, true);
        assert!(page.is_visible_node(&text).await);
    }

    #[tokio::test]
    async fn common_ancestor_walks_parent_chains() {
        let page = StubPage::new();
        let root = page.add_node(StubNode::element("article"));
        let left = page.add_node(StubNode::element("p.left").parent(&root));
        let right = page.add_node(StubNode::element("p.right").parent(&root));
        let leaf = page.add_node(StubNode::text("'x'").parent(&left));

        assert_eq!(
            page.nearest_common_ancestor(&leaf, &right).await,
            Some(root.clone())
        );
        assert_eq!(page.nearest_common_ancestor(&leaf, &left).await, Some(left));
    }

    #[tokio::test]
    async fn download_flag_clears_on_read() {
        let page = StubPage::new();
        page.set_downloading(true);
        assert!(page.take_file_downloading_flag().await);
        assert!(!page.take_file_downloading_flag().await);
    }
}
