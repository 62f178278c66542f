use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use enact_core_types::{ErrorKind, ErrorRecord, GestureName, ResolvedTarget};
use enact_page_adapter::{
    ActionTargetSpec, Automation, AutomationRejection, AutomationSet, ClickOptions, MouseOptions,
    SelectionSpan, TargetInput, TypeOptions,
};
use enact_step_context::{ActionSeries, WaitingFlags};
use enact_target_resolver::{PollingResolver, TargetResolver, WaitNotifier};
use enact_visibility_gate::{PollingGate, VisibilityGate};

use crate::args::{DragDestination, SelectParsed, SpanArgs};
use crate::context::RunContext;

/// A fully parsed gesture, ready to be instantiated per resolved target.
#[derive(Clone, Debug)]
pub(crate) enum TargetGesture {
    Click(ClickOptions),
    Rclick(ClickOptions),
    Dblclick(ClickOptions),
    Hover(MouseOptions),
    Drag {
        destination: DragDestination,
        options: MouseOptions,
    },
    Select(SelectParsed),
    Type {
        text: String,
        options: TypeOptions,
    },
    Upload {
        file_paths: Vec<String>,
    },
}

/// Entry point for gesture calls against one window's page.
///
/// One dispatcher handles one gesture call at a time; the step machinery
/// never overlaps async actions. Target-bound gestures run through
/// resolve, visibility gating and the page-side automation, in strict
/// target order; failures are reported to the step iterator exactly once
/// and returned to the caller.
pub struct ActionDispatcher {
    pub(crate) ctx: RunContext,
    pub(crate) resolver: Arc<dyn TargetResolver>,
    pub(crate) gate: Arc<dyn VisibilityGate>,
    /// Armed (false) for the duration of one gesture call; flips to true on
    /// the first wait so the notification fires at most once per call.
    waiting_latch: Arc<AtomicBool>,
    source_index: Mutex<Option<u32>>,
}

impl ActionDispatcher {
    pub fn new(ctx: RunContext) -> Arc<Self> {
        let waiting_latch = Arc::new(AtomicBool::new(true));
        let notify: WaitNotifier = {
            let latch = waiting_latch.clone();
            let iterator = ctx.iterator.clone();
            Arc::new(move || {
                if !latch.swap(true, Ordering::SeqCst) {
                    iterator.on_target_waiting_started(WaitingFlags::default());
                }
            })
        };
        let resolver =
            PollingResolver::new(ctx.query.clone(), ctx.inspector.clone(), ctx.settings.clone())
                .with_wait_notifier(notify.clone());
        let gate = PollingGate::new(ctx.inspector.clone(), ctx.settings.clone())
            .with_wait_notifier(notify);
        Arc::new(Self {
            ctx,
            resolver: Arc::new(resolver),
            gate: Arc::new(gate),
            waiting_latch,
            source_index: Mutex::new(None),
        })
    }

    /// Position of the current call in its source step, stamped onto every
    /// error the call raises.
    pub fn set_source_index(&self, index: Option<u32>) {
        *self.source_index.lock() = index;
    }

    /// Report `record` to the step iterator and hand it back to the caller.
    /// Every failure of a gesture call funnels through here once.
    pub(crate) fn fail(&self, mut record: ErrorRecord) -> ErrorRecord {
        if let Some(index) = *self.source_index.lock() {
            record = record.with_source_index(index);
        }
        self.ctx.iterator.on_error(record.clone());
        record
    }

    /// Run `parsed` against every descriptor in `input`, strictly in order,
    /// as one async action series. Stops at the first failure.
    pub(crate) async fn dispatch_series(
        self: &Arc<Self>,
        input: TargetInput,
        gesture: GestureName,
        parsed: TargetGesture,
    ) -> Result<(), ErrorRecord> {
        if input.is_empty() {
            let record = ErrorRecord::new(ErrorKind::EmptyFirstArgument).with_action(gesture);
            return Err(self.fail(record));
        }
        debug!(action = gesture.as_str(), descriptors = input.specs.len(), "dispatching gesture");

        self.waiting_latch.store(false, Ordering::SeqCst);
        let action_started = Arc::new(AtomicBool::new(false));
        let parsed = Arc::new(parsed);
        let mut specs = input.specs.into_iter();
        let this = Arc::clone(self);
        let series: ActionSeries = Box::new(move || {
            let spec = specs.next()?;
            let this = Arc::clone(&this);
            let parsed = Arc::clone(&parsed);
            let started = Arc::clone(&action_started);
            Some(Box::pin(async move {
                this.run_one_spec(spec, gesture, parsed, started).await
            }))
        });
        let result = self.ctx.iterator.async_action_series(series).await;
        self.waiting_latch.store(true, Ordering::SeqCst);
        result
    }

    async fn run_one_spec(
        self: Arc<Self>,
        spec: ActionTargetSpec,
        gesture: GestureName,
        parsed: Arc<TargetGesture>,
        action_started: Arc<AtomicBool>,
    ) -> Result<(), ErrorRecord> {
        let targets = match self.resolver.resolve(&spec, gesture).await {
            Ok(targets) => targets,
            Err(record) => return Err(self.fail(record)),
        };

        for target in targets {
            if let Err(record) = self.gate.await_visible(&target, gesture).await {
                return Err(self.fail(record));
            }
            if !action_started.swap(true, Ordering::SeqCst) {
                self.ctx.iterator.on_action_run();
            }

            let set = self.ctx.automations.automations(&target.window);
            let automation = match self.build_automation(set.as_ref(), &target, &parsed).await {
                Ok(automation) => automation,
                Err(record) => return Err(self.fail(record)),
            };
            if let Err(rejection) = automation.run().await {
                let record = self.classify_rejection(rejection, gesture, &target, &parsed).await;
                return Err(self.fail(record));
            }
        }
        Ok(())
    }

    /// Instantiate the page-side automation for one target. Validation that
    /// needs the resolved target happens here.
    async fn build_automation(
        &self,
        set: &dyn AutomationSet,
        target: &ResolvedTarget,
        parsed: &TargetGesture,
    ) -> Result<Box<dyn Automation>, ErrorRecord> {
        let inspector = &self.ctx.inspector;
        let node = &target.node;
        match parsed {
            TargetGesture::Click(options) => {
                if inspector.is_option_like(node).await {
                    return Ok(set.select_child_click(node));
                }
                let mut options = options.clone();
                options.offset = Some(inspector.offset_for(node, options.offset).await);
                Ok(set.click(node, options))
            }
            TargetGesture::Rclick(options) => {
                let mut options = options.clone();
                options.offset = Some(inspector.offset_for(node, options.offset).await);
                Ok(set.rclick(node, options))
            }
            TargetGesture::Dblclick(options) => {
                let mut options = options.clone();
                options.offset = Some(inspector.offset_for(node, options.offset).await);
                Ok(set.dblclick(node, options))
            }
            TargetGesture::Hover(options) => {
                let mut options = options.clone();
                options.offset = Some(inspector.offset_for(node, options.offset).await);
                Ok(set.hover(node, options))
            }
            TargetGesture::Drag {
                destination,
                options,
            } => {
                let mut options = options.clone();
                options.offset = Some(inspector.offset_for(node, options.offset).await);
                match destination {
                    DragDestination::Element(dest) => Ok(set.drag_to_element(node, dest, options)),
                    DragDestination::Offset { dx, dy } => {
                        Ok(set.drag_to_offset(node, *dx, *dy, options))
                    }
                }
            }
            TargetGesture::Select(SelectParsed::Range { end }) => {
                let editable = inspector.is_content_editable(node).await
                    && inspector.is_content_editable(end).await;
                let shares_root = inspector.nearest_common_ancestor(node, end).await.is_some();
                if !editable || !shares_root || !inspector.is_visible_node(end).await {
                    return Err(ErrorRecord::new(ErrorKind::IncorrectSelectActionArguments)
                        .with_action(GestureName::Select));
                }
                Ok(set.select_editable_content(node, end))
            }
            TargetGesture::Select(SelectParsed::Span(span)) => {
                let span = match span {
                    SpanArgs::All => SelectionSpan::All,
                    SpanArgs::Offset(offset) => SelectionSpan::Offset(*offset),
                    SpanArgs::Positions { start, end } => SelectionSpan::Positions {
                        start: *start,
                        end: *end,
                    },
                    SpanArgs::Quad([a, b, c, d]) => {
                        if inspector.is_multiline_input(node).await {
                            SelectionSpan::LinePositions {
                                start_line: *a,
                                start_pos: *b,
                                end_line: *c,
                                end_pos: *d,
                            }
                        } else {
                            SelectionSpan::Positions { start: *a, end: *b }
                        }
                    }
                };
                Ok(set.select_text(node, span))
            }
            TargetGesture::Type { text, options } => {
                Ok(set.type_text(node, text, options.clone()))
            }
            TargetGesture::Upload { file_paths } => {
                if !inspector.is_file_input(node).await {
                    return Err(ErrorRecord::new(ErrorKind::UploadElementIsNotFileInput)
                        .with_element(inspector.describe(node).await)
                        .with_action(GestureName::Upload));
                }
                Ok(set.upload(node, file_paths))
            }
        }
    }

    /// Map a page-side rejection onto the error taxonomy.
    async fn classify_rejection(
        &self,
        rejection: AutomationRejection,
        gesture: GestureName,
        target: &ResolvedTarget,
        parsed: &TargetGesture,
    ) -> ErrorRecord {
        match rejection {
            AutomationRejection::ElementInvisible { additional: false } => {
                ErrorRecord::new(ErrorKind::InvisibleActionElement)
                    .with_element(self.ctx.inspector.describe(&target.node).await)
                    .with_action(gesture)
            }
            AutomationRejection::ElementInvisible { additional: true } => {
                let mut record = ErrorRecord::new(ErrorKind::ActionAdditionalElementIsInvisibleError)
                    .with_action(gesture);
                if let TargetGesture::Drag {
                    destination: DragDestination::Element(dest),
                    ..
                } = parsed
                {
                    record = record.with_element(self.ctx.inspector.describe(dest).await);
                }
                record
            }
            AutomationRejection::UnresolvedFilePaths(paths) => {
                ErrorRecord::new(ErrorKind::UploadCanNotFindFileToUpload)
                    .with_file_paths(paths)
                    .with_action(gesture)
            }
            AutomationRejection::Other(message) => ErrorRecord::new(ErrorKind::UncaughtJsError)
                .with_script_err(message)
                .with_action(gesture),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enact_page_adapter::StubPage;
    use enact_step_context::RecordingStepIterator;

    fn dispatcher_over(page: &Arc<StubPage>) -> (Arc<ActionDispatcher>, Arc<RecordingStepIterator>) {
        let iterator = RecordingStepIterator::new();
        let ctx = RunContext::stubbed(page, iterator.clone());
        (ActionDispatcher::new(ctx), iterator)
    }

    #[tokio::test]
    async fn empty_input_fails_without_touching_the_page() {
        let page = StubPage::new();
        let (dispatcher, iterator) = dispatcher_over(&page);

        let err = dispatcher
            .dispatch_series(
                TargetInput::many(Vec::new()),
                GestureName::Click,
                TargetGesture::Click(ClickOptions::default()),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::EmptyFirstArgument);
        assert_eq!(err.action, Some(GestureName::Click));
        assert_eq!(iterator.errors().len(), 1);
        assert!(page.log().is_empty());
    }

    #[tokio::test]
    async fn source_index_is_stamped_on_reported_errors() {
        let page = StubPage::new();
        let (dispatcher, iterator) = dispatcher_over(&page);
        dispatcher.set_source_index(Some(7));

        let err = dispatcher
            .dispatch_series(
                TargetInput::many(Vec::new()),
                GestureName::Hover,
                TargetGesture::Hover(MouseOptions::default()),
            )
            .await
            .unwrap_err();

        assert_eq!(err.source_index, Some(7));
        assert_eq!(iterator.last_error().and_then(|e| e.source_index), Some(7));

        dispatcher.set_source_index(None);
        let err = dispatcher
            .dispatch_series(
                TargetInput::many(Vec::new()),
                GestureName::Hover,
                TargetGesture::Hover(MouseOptions::default()),
            )
            .await
            .unwrap_err();
        assert_eq!(err.source_index, None);
    }
}
