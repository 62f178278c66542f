use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use enact_core_types::timing::{poll_until, PollSchedule};
use enact_core_types::{ErrorKind, ErrorRecord, GestureName, NodeId, ResolvedTarget, SharedSettings};
use enact_page_adapter::DomInspector;

/// Callback invoked once when a gate call starts actually waiting.
pub type WaitNotifier = Arc<dyn Fn() + Send + Sync>;

/// Holds a gesture until its target is visible, or fails the gesture with
/// the element's description.
#[async_trait]
pub trait VisibilityGate: Send + Sync {
    async fn await_visible(
        &self,
        target: &ResolvedTarget,
        gesture: GestureName,
    ) -> Result<(), ErrorRecord>;
}

/// Gate polling plain elements on the availability cadence. Option-like
/// elements are decided immediately by the option visibility rule.
pub struct PollingGate {
    inspector: Arc<dyn DomInspector>,
    settings: SharedSettings,
    on_wait_begin: Option<WaitNotifier>,
}

impl PollingGate {
    pub fn new(inspector: Arc<dyn DomInspector>, settings: SharedSettings) -> Self {
        Self {
            inspector,
            settings,
            on_wait_begin: None,
        }
    }

    /// Notify `notifier` the first time a gate call misses and starts
    /// polling. Immediately visible targets never notify.
    pub fn with_wait_notifier(mut self, notifier: WaitNotifier) -> Self {
        self.on_wait_begin = Some(notifier);
        self
    }

    async fn invisible(&self, node: &NodeId, gesture: GestureName) -> ErrorRecord {
        ErrorRecord::new(ErrorKind::InvisibleActionElement)
            .with_element(self.inspector.describe(node).await)
            .with_action(gesture)
    }
}

#[async_trait]
impl VisibilityGate for PollingGate {
    async fn await_visible(
        &self,
        target: &ResolvedTarget,
        gesture: GestureName,
    ) -> Result<(), ErrorRecord> {
        let node = &target.node;

        if self.inspector.is_option_like(node).await {
            if self.inspector.is_option_visible(node).await {
                return Ok(());
            }
            return Err(self.invisible(node, gesture).await);
        }

        let timeout = self.settings.read().selector_timeout();
        let schedule = PollSchedule::target_availability(timeout);
        let notified = AtomicBool::new(false);
        let notified = &notified;
        let visible = poll_until(schedule, || async move {
            if self.inspector.is_visible(node).await {
                Some(())
            } else {
                if !notified.swap(true, Ordering::Relaxed) {
                    if let Some(notify) = &self.on_wait_begin {
                        notify();
                    }
                }
                None
            }
        })
        .await;

        match visible {
            Some(()) => Ok(()),
            None => {
                debug!(action = gesture.as_str(), "target never became visible");
                Err(self.invisible(node, gesture).await)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    use tokio::time::Instant;

    use enact_core_types::{shared_settings, RunnerSettings};
    use enact_page_adapter::{StubNode, StubPage};

    fn gate_over(page: &Arc<StubPage>, timeout_ms: u64) -> PollingGate {
        let mut settings = RunnerSettings::default();
        settings.set_selector_timeout(timeout_ms);
        PollingGate::new(page.clone(), shared_settings(settings))
    }

    fn target(page: &Arc<StubPage>, node: NodeId) -> ResolvedTarget {
        ResolvedTarget {
            node,
            window: page.top_window(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn visible_element_passes_on_the_first_check() {
        let page = StubPage::new();
        let node = page.add_node(StubNode::element("button#ok"));
        let gate = gate_over(&page, 500);

        let started = Instant::now();
        gate.await_visible(&target(&page, node.clone()), GestureName::Click)
            .await
            .unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(page.visibility_checks(&node), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn option_rule_is_immediate_both_ways() {
        let page = StubPage::new();
        let shown = page.add_node(StubNode::element("option[value=a]").option_like(true));
        let hidden = page.add_node(StubNode::element("option[value=b]").option_like(false));
        let gate = gate_over(&page, 500);

        let started = Instant::now();
        gate.await_visible(&target(&page, shown.clone()), GestureName::Click)
            .await
            .unwrap();
        let err = gate
            .await_visible(&target(&page, hidden.clone()), GestureName::Click)
            .await
            .unwrap_err();

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(err.kind, ErrorKind::InvisibleActionElement);
        assert_eq!(err.element.as_deref(), Some("option[value=b]"));
        // The plain visibility poll never ran for either option.
        assert_eq!(page.visibility_checks(&shown), 0);
        assert_eq!(page.visibility_checks(&hidden), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn element_turning_visible_passes_mid_poll() {
        let page = StubPage::new();
        let node = page.add_node(StubNode::element("div#late").visible(false));
        page.show_after_checks(&node, 3);
        let gate = gate_over(&page, 10_000);

        let started = Instant::now();
        gate.await_visible(&target(&page, node.clone()), GestureName::Type)
            .await
            .unwrap();
        assert_eq!(started.elapsed(), Duration::from_millis(400));
        assert_eq!(page.visibility_checks(&node), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_carries_description_and_gesture_and_stops_polling() {
        let page = StubPage::new();
        let node = page.add_node(StubNode::element("div#hidden").visible(false));
        let gate = gate_over(&page, 500);

        let err = gate
            .await_visible(&target(&page, node.clone()), GestureName::Rclick)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvisibleActionElement);
        assert_eq!(err.element.as_deref(), Some("div#hidden"));
        assert_eq!(err.action, Some(GestureName::Rclick));

        let checks = page.visibility_checks(&node);
        assert_eq!(checks, 4);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(page.visibility_checks(&node), checks);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_notifier_fires_only_when_waiting_begins() {
        let page = StubPage::new();
        let instant = page.add_node(StubNode::element("a#now"));
        let late = page.add_node(StubNode::element("a#late").visible(false));
        page.show_after_checks(&late, 4);

        let notifications = Arc::new(AtomicU32::new(0));
        let counter = notifications.clone();
        let mut settings = RunnerSettings::default();
        settings.set_selector_timeout(10_000);
        let gate = PollingGate::new(page.clone(), shared_settings(settings)).with_wait_notifier(
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        gate.await_visible(&target(&page, instant), GestureName::Click)
            .await
            .unwrap();
        assert_eq!(notifications.load(Ordering::SeqCst), 0);

        gate.await_visible(&target(&page, late), GestureName::Click)
            .await
            .unwrap();
        assert_eq!(notifications.load(Ordering::SeqCst), 1);
    }
}
