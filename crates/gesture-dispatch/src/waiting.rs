use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use enact_core_types::timing::{CONDITION_POLL, WAIT_FOR_DEFAULT_TIMEOUT};
use enact_core_types::{ErrorKind, ErrorRecord, GestureName};
use enact_step_context::{ActionFuture, WaitingFlags};

use crate::args::{DoneSignal, WaitCondition, WaitForTarget};
use crate::dispatcher::ActionDispatcher;

impl ActionDispatcher {
    /// Pause for `ms` milliseconds. With a condition, the pause ends at the
    /// first condition poll that holds against the shared data; `ms` is a
    /// ceiling either way.
    pub async fn wait(
        self: &Arc<Self>,
        ms: i64,
        condition: Option<WaitCondition>,
    ) -> Result<(), ErrorRecord> {
        if ms < 0 {
            let record = ErrorRecord::new(ErrorKind::IncorrectWaitActionMillisecondsArgument)
                .with_action(GestureName::Wait);
            return Err(self.fail(record));
        }
        let this = Arc::clone(self);
        let action: ActionFuture = Box::pin(async move {
            let deadline = sleep(Duration::from_millis(ms as u64));
            tokio::pin!(deadline);
            match condition {
                None => deadline.await,
                Some(check) => loop {
                    tokio::select! {
                        _ = &mut deadline => break,
                        _ = sleep(CONDITION_POLL) => {
                            if check(&this.ctx.iterator.shared_data()) {
                                break;
                            }
                        }
                    }
                },
            }
            Ok(())
        });
        self.ctx.iterator.async_action(action).await
    }

    /// Wait until the page satisfies `target`, bounded by `timeout_ms` (the
    /// standard wait-for timeout when unset). Announces the wait up front
    /// and the action run once the target is satisfied.
    pub async fn wait_for(
        self: &Arc<Self>,
        target: WaitForTarget,
        timeout_ms: Option<i64>,
    ) -> Result<(), ErrorRecord> {
        if timeout_ms.is_some_and(|ms| ms < 0) {
            let record = ErrorRecord::new(ErrorKind::IncorrectWaitForActionTimeoutArgument)
                .with_action(GestureName::WaitFor);
            return Err(self.fail(record));
        }
        if matches!(&target, WaitForTarget::Selectors(selectors) if selectors.is_empty()) {
            let record = ErrorRecord::new(ErrorKind::IncorrectWaitForActionEventArgument)
                .with_action(GestureName::WaitFor);
            return Err(self.fail(record));
        }
        let timeout = timeout_ms
            .map(|ms| Duration::from_millis(ms as u64))
            .unwrap_or(WAIT_FOR_DEFAULT_TIMEOUT);

        self.ctx.iterator.on_target_waiting_started(WaitingFlags {
            max_timeout_ms: Some(timeout.as_millis() as i64),
            is_wait_action: true,
        });

        let this = Arc::clone(self);
        let action: ActionFuture = Box::pin(async move {
            let watch = this.watch_wait_for_target(target);
            tokio::pin!(watch);
            tokio::select! {
                _ = &mut watch => {
                    this.ctx.iterator.on_action_run();
                    Ok(())
                }
                _ = sleep(timeout) => {
                    let record = ErrorRecord::new(ErrorKind::WaitForActionTimeoutExceeded)
                        .with_action(GestureName::WaitFor);
                    Err(this.fail(record))
                }
            }
        });
        self.ctx.iterator.async_action(action).await
    }

    async fn watch_wait_for_target(&self, target: WaitForTarget) {
        match target {
            WaitForTarget::Selector(selector) => self.watch_selectors(vec![selector]).await,
            WaitForTarget::Selectors(selectors) => self.watch_selectors(selectors).await,
            WaitForTarget::Callback(callback) => {
                let (signal, rx) = DoneSignal::new();
                callback(signal);
                if rx.await.is_err() {
                    // Signal dropped without completing; only the timeout
                    // can end the wait now.
                    futures::future::pending::<()>().await;
                }
            }
        }
    }

    /// Poll on the condition cadence until every selector matches in the
    /// same round.
    async fn watch_selectors(&self, selectors: Vec<String>) {
        loop {
            sleep(CONDITION_POLL).await;
            let mut all_match = true;
            for selector in &selectors {
                if self.ctx.query.query(selector).await.is_empty() {
                    all_match = false;
                    break;
                }
            }
            if all_match {
                return;
            }
        }
    }
}
