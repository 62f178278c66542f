//! Collaborator bundle the runner is wired to for one run.

use std::sync::Arc;

use enact_core_types::{SharedSettings, WindowId};
use enact_event_bus::EventBus;
use enact_page_adapter::{
    BrowserTransport, DialogEvent, DomInspector, ElementQuery, PageEvent, PageReadiness,
    ScreenshotTaker,
};
use enact_step_context::StepIterator;

/// Everything the runner needs besides the frame channel. Cloning is cheap;
/// all members are shared handles.
#[derive(Clone)]
pub struct RunnerContext {
    pub iterator: Arc<dyn StepIterator>,
    pub query: Arc<dyn ElementQuery>,
    pub inspector: Arc<dyn DomInspector>,
    pub screenshots: Arc<dyn ScreenshotTaker>,
    pub transport: Arc<dyn BrowserTransport>,
    pub readiness: Arc<dyn PageReadiness>,
    pub dialog_events: Arc<dyn EventBus<DialogEvent>>,
    pub page_events: Arc<dyn EventBus<PageEvent>>,
    pub settings: SharedSettings,
    /// Window this runner's document lives in.
    pub local_window: WindowId,
}

#[cfg(feature = "stub")]
impl RunnerContext {
    /// Context wired entirely to one stub page, with default settings.
    pub fn stubbed(
        page: &Arc<enact_page_adapter::StubPage>,
        iterator: Arc<dyn StepIterator>,
    ) -> Self {
        use enact_core_types::{shared_settings, RunnerSettings};

        Self {
            iterator,
            query: page.clone(),
            inspector: page.clone(),
            screenshots: page.clone(),
            transport: page.clone(),
            readiness: page.clone(),
            dialog_events: page.dialog_events(),
            page_events: page.page_events(),
            settings: shared_settings(RunnerSettings::default()),
            local_window: page.top_window(),
        }
    }
}
