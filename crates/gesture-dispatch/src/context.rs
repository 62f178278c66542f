//! Collaborator bundle the dispatcher runs against.

use std::sync::Arc;

use enact_core_types::{SharedSettings, WindowId};
use enact_page_adapter::{
    AutomationProvider, DomInspector, ElementQuery, KeySequenceParser, PageNavigator,
    ScreenshotTaker,
};
use enact_step_context::StepIterator;

/// Everything a dispatcher needs to act on one window's page. Cloning is
/// cheap; all members are shared handles.
#[derive(Clone)]
pub struct RunContext {
    pub iterator: Arc<dyn StepIterator>,
    pub query: Arc<dyn ElementQuery>,
    pub inspector: Arc<dyn DomInspector>,
    pub automations: Arc<dyn AutomationProvider>,
    pub key_parser: Arc<dyn KeySequenceParser>,
    pub screenshots: Arc<dyn ScreenshotTaker>,
    pub navigator: Arc<dyn PageNavigator>,
    pub settings: SharedSettings,
    /// Window this dispatcher is local to. Keyboard automations run here.
    pub local_window: WindowId,
}

#[cfg(feature = "stub")]
impl RunContext {
    /// Context wired entirely to one stub page, with default settings.
    pub fn stubbed(
        page: &Arc<enact_page_adapter::StubPage>,
        iterator: Arc<dyn StepIterator>,
    ) -> Self {
        use enact_core_types::{shared_settings, RunnerSettings};
        use enact_page_adapter::DefaultKeyParser;

        Self {
            iterator,
            query: page.clone(),
            inspector: page.clone(),
            automations: page.clone(),
            key_parser: Arc::new(DefaultKeyParser),
            screenshots: page.clone(),
            navigator: page.clone(),
            settings: shared_settings(RunnerSettings::default()),
            local_window: page.top_window(),
        }
    }
}
