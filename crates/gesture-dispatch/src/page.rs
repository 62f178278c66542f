use std::sync::Arc;

use tokio::time::sleep;

use enact_core_types::timing::NAVIGATION_SETTLE_DELAY;
use enact_core_types::ErrorRecord;
use enact_step_context::ActionFuture;

use crate::dispatcher::ActionDispatcher;

impl ActionDispatcher {
    /// Navigate the page and give the load a moment to settle before the
    /// next step starts.
    pub async fn navigate_to(self: &Arc<Self>, url: impl Into<String>) -> Result<(), ErrorRecord> {
        let url = url.into();
        let this = Arc::clone(self);
        let action: ActionFuture = Box::pin(async move {
            this.ctx.navigator.navigate_to(&url).await;
            sleep(NAVIGATION_SETTLE_DELAY).await;
            Ok(())
        });
        self.ctx.iterator.async_action(action).await
    }

    /// Capture the page into `file_path`. Resolves once the capture is
    /// written.
    pub async fn screenshot(
        self: &Arc<Self>,
        file_path: impl Into<String>,
    ) -> Result<(), ErrorRecord> {
        let file_path = file_path.into();
        let this = Arc::clone(self);
        let action: ActionFuture = Box::pin(async move {
            this.ctx.screenshots.take(&file_path).await;
            Ok(())
        });
        self.ctx.iterator.async_action(action).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::time::Instant;

    use enact_page_adapter::StubPage;
    use enact_step_context::RecordingStepIterator;

    use crate::context::RunContext;

    fn dispatcher_over(page: &Arc<StubPage>) -> (Arc<ActionDispatcher>, Arc<RecordingStepIterator>) {
        let iterator = RecordingStepIterator::new();
        let ctx = RunContext::stubbed(page, iterator.clone());
        (ActionDispatcher::new(ctx), iterator)
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_settles_after_the_standard_delay() {
        let page = StubPage::new();
        let (dispatcher, iterator) = dispatcher_over(&page);

        let started = Instant::now();
        dispatcher.navigate_to("https://app.test/login").await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_millis(1000));
        assert_eq!(page.navigations(), vec!["https://app.test/login".to_string()]);
        assert_eq!(iterator.ops(), vec!["async_action"]);
    }

    #[tokio::test]
    async fn screenshot_records_the_file_path() {
        let page = StubPage::new();
        let (dispatcher, _) = dispatcher_over(&page);

        dispatcher.screenshot("shots/step-3.png").await.unwrap();

        assert_eq!(page.screenshots(), vec!["shots/step-3.png".to_string()]);
    }
}
