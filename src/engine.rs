//! One-stop wiring of the gesture surface and the run orchestration.

use std::sync::Arc;

use enact_core_types::SharedSettings;
use enact_frame_sync::FrameChannel;
use enact_gesture_dispatch::{ActionDispatcher, RunContext};
use enact_runner::{Runner, RunnerContext};

/// A dispatcher and a runner over one window's page.
///
/// The two halves stay independent: the dispatcher executes gesture calls
/// against the local document while the runner handles everything around
/// them (frame delegation, unload handling, run events). The engine only
/// ties their construction together and keeps the shared settings handle
/// reachable. Both contexts are expected to carry the same settings handle;
/// the runner's wins when they differ.
pub struct Engine {
    dispatcher: Arc<ActionDispatcher>,
    runner: Arc<Runner>,
    settings: SharedSettings,
}

impl Engine {
    pub fn new(
        gestures: RunContext,
        orchestration: RunnerContext,
        channel: Arc<dyn FrameChannel>,
    ) -> Self {
        let settings = orchestration.settings.clone();
        Self {
            dispatcher: ActionDispatcher::new(gestures),
            runner: Runner::new(orchestration, channel),
            settings,
        }
    }

    /// Gesture command surface.
    pub fn dispatcher(&self) -> &Arc<ActionDispatcher> {
        &self.dispatcher
    }

    /// Run orchestration.
    pub fn runner(&self) -> &Arc<Runner> {
        &self.runner
    }

    /// Live settings consulted by both halves.
    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }
}

#[cfg(feature = "stub")]
impl Engine {
    /// Engine wired entirely to one stub page, with one settings handle
    /// shared by both halves.
    pub fn stubbed(
        page: &Arc<enact_page_adapter::StubPage>,
        iterator: Arc<dyn enact_step_context::StepIterator>,
        network: &Arc<enact_frame_sync::InMemoryFrameNetwork>,
    ) -> Self {
        let gestures = RunContext::stubbed(page, iterator.clone());
        let mut orchestration = RunnerContext::stubbed(page, iterator);
        orchestration.settings = gestures.settings.clone();
        Self::new(
            gestures,
            orchestration,
            network.endpoint(&page.top_window()),
        )
    }
}

#[cfg(all(test, feature = "stub"))]
mod tests {
    use super::*;

    use enact_event_bus::EventBus;
    use enact_frame_sync::InMemoryFrameNetwork;
    use enact_page_adapter::{ClickOptions, StubNode, StubPage};
    use enact_runner::RunnerEvent;
    use enact_step_context::RecordingStepIterator;

    #[tokio::test]
    async fn both_halves_share_one_page_and_settings() {
        let page = StubPage::new();
        let iterator = RecordingStepIterator::new();
        let network = InMemoryFrameNetwork::new();
        let engine = Engine::stubbed(&page, iterator.clone(), &network);

        engine.settings().write().selector_timeout_ms = 2_000;
        assert_eq!(engine.settings().read().selector_timeout_ms, 2_000);

        let mut events = engine.runner().events().subscribe();
        engine.runner().start(true).await;
        assert!(matches!(events.try_recv(), Ok(RunnerEvent::TestStarted)));

        let button = page.add_node(StubNode::element("button").visible(true));
        engine
            .dispatcher()
            .click(button, ClickOptions::default())
            .await
            .unwrap();
        assert_eq!(page.ops().last().map(String::as_str), Some("click"));
    }
}
