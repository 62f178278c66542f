use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use enact_core_types::timing::{poll_until, PollSchedule};
use enact_core_types::{ErrorKind, ErrorRecord, GestureName, NodeId, ResolvedTarget, SharedSettings};
use enact_page_adapter::{ActionTargetSpec, DomInspector, ElementQuery};

/// Callback invoked once when a resolve call starts actually waiting.
pub type WaitNotifier = Arc<dyn Fn() + Send + Sync>;

/// Turns one target descriptor into concrete targets, waiting out content
/// that has not appeared yet. Exactly one success or failure per call.
#[async_trait]
pub trait TargetResolver: Send + Sync {
    async fn resolve(
        &self,
        spec: &ActionTargetSpec,
        gesture: GestureName,
    ) -> Result<Vec<ResolvedTarget>, ErrorRecord>;
}

/// Resolver that re-evaluates selectors and producers on the availability
/// cadence, bounded by the settings' selector timeout.
pub struct PollingResolver {
    query: Arc<dyn ElementQuery>,
    inspector: Arc<dyn DomInspector>,
    settings: SharedSettings,
    on_wait_begin: Option<WaitNotifier>,
}

impl PollingResolver {
    pub fn new(
        query: Arc<dyn ElementQuery>,
        inspector: Arc<dyn DomInspector>,
        settings: SharedSettings,
    ) -> Self {
        Self {
            query,
            inspector,
            settings,
            on_wait_begin: None,
        }
    }

    /// Notify `notifier` the first time a resolve call misses and starts
    /// polling. Immediately available targets never notify.
    pub fn with_wait_notifier(mut self, notifier: WaitNotifier) -> Self {
        self.on_wait_begin = Some(notifier);
        self
    }

    async fn targets_for(&self, nodes: Vec<NodeId>) -> Vec<ResolvedTarget> {
        let mut targets = Vec::with_capacity(nodes.len());
        for node in nodes {
            let window = self.inspector.owner_window(&node).await;
            targets.push(ResolvedTarget { node, window });
        }
        targets
    }

    async fn evaluate(&self, spec: &ActionTargetSpec) -> Vec<NodeId> {
        match spec {
            ActionTargetSpec::Selector(selector) => self.query.query(selector).await,
            ActionTargetSpec::Producer(produce) => produce(),
            ActionTargetSpec::Node(node) => vec![node.clone()],
            ActionTargetSpec::Nodes(nodes) => nodes.clone(),
        }
    }
}

#[async_trait]
impl TargetResolver for PollingResolver {
    async fn resolve(
        &self,
        spec: &ActionTargetSpec,
        gesture: GestureName,
    ) -> Result<Vec<ResolvedTarget>, ErrorRecord> {
        match spec {
            ActionTargetSpec::Node(node) => Ok(self.targets_for(vec![node.clone()]).await),
            ActionTargetSpec::Nodes(nodes) => {
                if nodes.is_empty() {
                    return Err(empty_first_argument(gesture));
                }
                Ok(self.targets_for(nodes.clone()).await)
            }
            ActionTargetSpec::Selector(_) | ActionTargetSpec::Producer(_) => {
                let timeout = self.settings.read().selector_timeout();
                let schedule = PollSchedule::target_availability(timeout);
                let notified = AtomicBool::new(false);
                let notified = &notified;
                let found = poll_until(schedule, || async move {
                    let nodes = self.evaluate(spec).await;
                    if nodes.is_empty() {
                        if !notified.swap(true, Ordering::Relaxed) {
                            if let Some(notify) = &self.on_wait_begin {
                                notify();
                            }
                        }
                        None
                    } else {
                        Some(nodes)
                    }
                })
                .await;
                match found {
                    Some(nodes) => Ok(self.targets_for(nodes).await),
                    None => {
                        debug!(action = gesture.as_str(), "target never appeared");
                        Err(empty_first_argument(gesture))
                    }
                }
            }
        }
    }
}

fn empty_first_argument(gesture: GestureName) -> ErrorRecord {
    ErrorRecord::new(ErrorKind::EmptyFirstArgument).with_action(gesture)
}
