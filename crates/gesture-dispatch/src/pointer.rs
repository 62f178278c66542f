use std::sync::Arc;

use enact_core_types::{ErrorKind, ErrorRecord, GestureName};
use enact_page_adapter::{ClickOptions, MouseOptions, TargetInput};

use crate::args::{parse_drag_destination, CallArg};
use crate::dispatcher::{ActionDispatcher, TargetGesture};

impl ActionDispatcher {
    pub async fn click(
        self: &Arc<Self>,
        input: impl Into<TargetInput>,
        options: ClickOptions,
    ) -> Result<(), ErrorRecord> {
        self.dispatch_series(input.into(), GestureName::Click, TargetGesture::Click(options))
            .await
    }

    pub async fn rclick(
        self: &Arc<Self>,
        input: impl Into<TargetInput>,
        options: ClickOptions,
    ) -> Result<(), ErrorRecord> {
        self.dispatch_series(input.into(), GestureName::Rclick, TargetGesture::Rclick(options))
            .await
    }

    pub async fn dblclick(
        self: &Arc<Self>,
        input: impl Into<TargetInput>,
        options: ClickOptions,
    ) -> Result<(), ErrorRecord> {
        self.dispatch_series(
            input.into(),
            GestureName::Dblclick,
            TargetGesture::Dblclick(options),
        )
        .await
    }

    pub async fn hover(
        self: &Arc<Self>,
        input: impl Into<TargetInput>,
        options: MouseOptions,
    ) -> Result<(), ErrorRecord> {
        self.dispatch_series(input.into(), GestureName::Hover, TargetGesture::Hover(options))
            .await
    }

    /// Drag the targets to a destination element or by a pixel offset. The
    /// destination arguments are checked before any target resolves; an
    /// unusable destination fails the whole call.
    pub async fn drag(
        self: &Arc<Self>,
        input: impl Into<TargetInput>,
        args: Vec<CallArg>,
        options: MouseOptions,
    ) -> Result<(), ErrorRecord> {
        let destination = match parse_drag_destination(&args, &self.ctx.query).await {
            Some(destination) => destination,
            None => {
                let record = ErrorRecord::new(ErrorKind::IncorrectDraggingSecondArgument)
                    .with_action(GestureName::Drag);
                return Err(self.fail(record));
            }
        };
        self.dispatch_series(
            input.into(),
            GestureName::Drag,
            TargetGesture::Drag {
                destination,
                options,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::time::Instant;

    use enact_page_adapter::{ActionTargetSpec, AutomationRejection, StubNode, StubPage};
    use enact_step_context::RecordingStepIterator;

    use crate::context::RunContext;

    fn dispatcher_over(page: &Arc<StubPage>) -> (Arc<ActionDispatcher>, Arc<RecordingStepIterator>) {
        let iterator = RecordingStepIterator::new();
        let ctx = RunContext::stubbed(page, iterator.clone());
        (ActionDispatcher::new(ctx), iterator)
    }

    fn count(ops: &[String], op: &str) -> usize {
        ops.iter().filter(|o| *o == op).count()
    }

    #[tokio::test(start_paused = true)]
    async fn click_waits_out_the_selector_then_runs_the_automation() {
        let page = StubPage::new();
        let node = page.add_node(StubNode::element("button#go"));
        page.appear_after_queries("#go", vec![node], 2);
        let (dispatcher, iterator) = dispatcher_over(&page);

        let started = Instant::now();
        dispatcher
            .click("#go", ClickOptions::default())
            .await
            .unwrap();

        assert_eq!(started.elapsed(), Duration::from_millis(200));
        assert_eq!(
            iterator.ops(),
            vec!["series", "series_item", "waiting_started", "action_run"]
        );
        assert_eq!(
            page.ops(),
            vec!["query", "query", "isVisible", "automations", "run click", "done click"]
        );
    }

    #[tokio::test]
    async fn option_children_go_through_the_parent_select() {
        let page = StubPage::new();
        let option = page.add_node(StubNode::element("option[value=b]").option_like(true));
        page.set_matches("select option", vec![option]);
        let (dispatcher, _) = dispatcher_over(&page);

        dispatcher
            .click("select option", ClickOptions::default())
            .await
            .unwrap();

        let ops = page.ops();
        assert!(ops.contains(&"run selectChildClick".to_string()));
        assert!(!ops.contains(&"run click".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn each_target_finishes_before_the_next_resolves() {
        let page = StubPage::new();
        let first = page.add_node(StubNode::element("li#first"));
        let second = page.add_node(StubNode::element("li#second"));
        page.set_matches("#first", vec![first]);
        page.set_matches("#second", vec![second]);
        page.script_run_delay("click", Duration::from_millis(100));
        let (dispatcher, iterator) = dispatcher_over(&page);

        dispatcher
            .click(
                TargetInput::many(vec![
                    ActionTargetSpec::selector("#first"),
                    ActionTargetSpec::selector("#second"),
                ]),
                ClickOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(
            page.ops(),
            vec![
                "query", "isVisible", "automations", "run click", "done click", "query",
                "isVisible", "automations", "run click", "done click",
            ]
        );
        let log = page.log();
        assert_eq!(log[0].detail, "#first");
        assert_eq!(log[5].detail, "#second");
        assert!(log[5].at - log[0].at >= Duration::from_millis(100));

        let ops = iterator.ops();
        assert_eq!(count(&ops, "series_item"), 2);
        assert_eq!(count(&ops, "action_run"), 1);
    }

    #[tokio::test]
    async fn rejected_automation_stops_the_series() {
        let page = StubPage::new();
        let first = page.add_node(StubNode::element("a#one"));
        page.set_matches("#one", vec![first]);
        page.script_rejection(
            "click",
            AutomationRejection::ElementInvisible { additional: false },
        );
        let (dispatcher, iterator) = dispatcher_over(&page);

        let err = dispatcher
            .click(
                TargetInput::many(vec![
                    ActionTargetSpec::selector("#one"),
                    ActionTargetSpec::selector("#two"),
                ]),
                ClickOptions::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::InvisibleActionElement);
        assert_eq!(err.element.as_deref(), Some("a#one"));
        assert_eq!(err.action, Some(GestureName::Click));
        assert_eq!(iterator.errors().len(), 1);
        assert_eq!(page.query_count("#two"), 0);
    }

    #[tokio::test]
    async fn pointer_offset_defaults_to_the_element_center() {
        let page = StubPage::new();
        let node = page.add_node(StubNode::element("div#pad").center(40, 12));
        let (dispatcher, _) = dispatcher_over(&page);

        dispatcher
            .click(node.clone(), ClickOptions::default())
            .await
            .unwrap();
        dispatcher
            .click(
                node,
                ClickOptions {
                    offset: Some((3, 4)),
                    ..ClickOptions::default()
                },
            )
            .await
            .unwrap();

        let runs: Vec<String> = page
            .log()
            .into_iter()
            .filter(|r| r.op == "run click")
            .map(|r| r.detail)
            .collect();
        assert!(runs[0].contains("Some((40, 12))"));
        assert!(runs[1].contains("Some((3, 4))"));
    }

    #[tokio::test]
    async fn drag_handles_offset_and_element_destinations() {
        let page = StubPage::new();
        let source = page.add_node(StubNode::element("div#src"));
        let dest = page.add_node(StubNode::element("div#dst"));
        let (dispatcher, _) = dispatcher_over(&page);

        dispatcher
            .drag(
                source.clone(),
                vec![CallArg::Int(10), CallArg::Int(20)],
                MouseOptions::default(),
            )
            .await
            .unwrap();
        dispatcher
            .drag(source, vec![CallArg::Node(dest)], MouseOptions::default())
            .await
            .unwrap();

        let ops = page.ops();
        assert!(ops.contains(&"run dragToOffset".to_string()));
        assert!(ops.contains(&"run dragToElement".to_string()));
    }

    #[tokio::test]
    async fn unusable_drag_destination_fails_before_resolving_targets() {
        let page = StubPage::new();
        let (dispatcher, iterator) = dispatcher_over(&page);

        let err = dispatcher
            .drag("#src", vec![CallArg::Bool(true)], MouseOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::IncorrectDraggingSecondArgument);
        assert_eq!(err.action, Some(GestureName::Drag));
        assert_eq!(iterator.errors().len(), 1);
        assert_eq!(page.query_count("#src"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn invisible_target_reports_its_description() {
        let page = StubPage::new();
        let node = page.add_node(StubNode::element("div#hidden").visible(false));
        page.set_matches("#hidden", vec![node]);
        let (dispatcher, iterator) = dispatcher_over(&page);

        let err = dispatcher
            .click("#hidden", ClickOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::InvisibleActionElement);
        assert_eq!(err.element.as_deref(), Some("div#hidden"));
        assert_eq!(err.action, Some(GestureName::Click));
        assert_eq!(iterator.last_error().map(|e| e.kind), Some(err.kind));
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_is_announced_once_per_call_at_most() {
        let page = StubPage::new();
        let node = page.add_node(StubNode::element("p#slow").visible(false));
        page.appear_after_queries("#slow", vec![node.clone()], 2);
        page.show_after_checks(&node, 3);
        let (dispatcher, iterator) = dispatcher_over(&page);

        // Both the resolver and the gate wait; one notification.
        dispatcher
            .click("#slow", ClickOptions::default())
            .await
            .unwrap();
        assert_eq!(count(&iterator.ops(), "waiting_started"), 1);

        // Immediately available target; no new notification.
        let quick = page.add_node(StubNode::element("p#quick"));
        dispatcher
            .click(quick, ClickOptions::default())
            .await
            .unwrap();
        assert_eq!(count(&iterator.ops(), "waiting_started"), 1);
    }
}
