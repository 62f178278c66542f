//! Boundary types for the dynamically shaped gesture arguments.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use enact_core_types::NodeId;
use enact_page_adapter::ElementQuery;

/// One loosely typed argument as recorded test steps carry them. The
/// dispatcher parses these eagerly at the call boundary.
#[derive(Clone, Debug)]
pub enum CallArg {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Node(NodeId),
    List(Vec<CallArg>),
}

impl CallArg {
    /// Number reading with string coercion, as the drag destination check
    /// applies it.
    fn as_number(&self) -> Option<f64> {
        match self {
            CallArg::Int(n) => Some(*n as f64),
            CallArg::Float(f) => f.is_finite().then_some(*f),
            CallArg::Str(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Selection positions accept genuine non-negative integers only; no
    /// string coercion.
    fn as_select_position(&self) -> Option<u32> {
        match self {
            CallArg::Int(n) if *n >= 0 => u32::try_from(*n).ok(),
            CallArg::Float(f) if *f >= 0.0 && f.fract() == 0.0 && *f <= u32::MAX as f64 => {
                Some(*f as u32)
            }
            _ => None,
        }
    }

    fn is_falsy(&self) -> bool {
        match self {
            CallArg::Null => true,
            CallArg::Bool(b) => !b,
            CallArg::Int(n) => *n == 0,
            CallArg::Float(f) => *f == 0.0,
            CallArg::Str(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl From<i64> for CallArg {
    fn from(n: i64) -> Self {
        CallArg::Int(n)
    }
}

impl From<f64> for CallArg {
    fn from(f: f64) -> Self {
        CallArg::Float(f)
    }
}

impl From<&str> for CallArg {
    fn from(s: &str) -> Self {
        CallArg::Str(s.to_string())
    }
}

impl From<NodeId> for CallArg {
    fn from(node: NodeId) -> Self {
        CallArg::Node(node)
    }
}

/// Where a drag ends up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragDestination {
    Element(NodeId),
    Offset { dx: i32, dy: i32 },
}

/// Resolve the positional arguments after the drag target. A leading pair
/// of numbers (string-coerced, rounded) wins over everything else; a
/// selector destination gets exactly one immediate query, no polling.
pub(crate) async fn parse_drag_destination(
    args: &[CallArg],
    query: &Arc<dyn ElementQuery>,
) -> Option<DragDestination> {
    let first = args.first()?;
    if args.len() >= 2 {
        if let (Some(dx), Some(dy)) = (first.as_number(), args[1].as_number()) {
            return Some(DragDestination::Offset {
                dx: dx.round() as i32,
                dy: dy.round() as i32,
            });
        }
    }
    match first {
        CallArg::Node(node) => Some(DragDestination::Element(node.clone())),
        CallArg::Str(selector) => query
            .query(selector)
            .await
            .into_iter()
            .next()
            .map(DragDestination::Element),
        _ => None,
    }
}

/// Positional span of a select call, before the multiline decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SpanArgs {
    All,
    Offset(u32),
    Positions { start: u32, end: u32 },
    /// Four positions; read as line/column pairs on multiline inputs and as
    /// the first two positions everywhere else.
    Quad([u32; 4]),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SelectParsed {
    Span(SpanArgs),
    /// Selection from the target to another node of the same
    /// content-editable root.
    Range { end: NodeId },
}

pub(crate) fn parse_select_args(args: &[CallArg]) -> Option<SelectParsed> {
    if args.is_empty() {
        return Some(SelectParsed::Span(SpanArgs::All));
    }
    if args.len() == 1 {
        if let CallArg::Node(node) = &args[0] {
            return Some(SelectParsed::Range { end: node.clone() });
        }
    }
    let mut positions = Vec::with_capacity(args.len());
    for arg in args {
        positions.push(arg.as_select_position()?);
    }
    match positions.as_slice() {
        [offset] => Some(SelectParsed::Span(SpanArgs::Offset(*offset))),
        [start, end] => Some(SelectParsed::Span(SpanArgs::Positions {
            start: *start,
            end: *end,
        })),
        [a, b, c, d] => Some(SelectParsed::Span(SpanArgs::Quad([*a, *b, *c, *d]))),
        _ => None,
    }
}

/// Shape of the upload paths argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum FilePathsArg {
    /// Nothing to attach; not an error.
    Empty,
    Valid(Vec<String>),
    /// Present but not a string or string list; reported, then treated as
    /// empty.
    Invalid,
}

impl FilePathsArg {
    pub(crate) fn paths(&self) -> Vec<String> {
        match self {
            FilePathsArg::Valid(paths) => paths.clone(),
            _ => Vec::new(),
        }
    }
}

pub(crate) fn parse_file_paths(arg: &CallArg) -> FilePathsArg {
    if arg.is_falsy() {
        return FilePathsArg::Empty;
    }
    match arg {
        CallArg::Str(path) => FilePathsArg::Valid(vec![path.clone()]),
        CallArg::List(items) => {
            let mut paths = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    CallArg::Str(path) => paths.push(path.clone()),
                    _ => return FilePathsArg::Invalid,
                }
            }
            FilePathsArg::Valid(paths)
        }
        _ => FilePathsArg::Invalid,
    }
}

/// Condition a wait call checks against the shared data blob.
pub type WaitCondition = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Completion handle passed into a wait-for callback. Calling `done` ends
/// the wait; calls after the wait already ended are ignored.
#[derive(Clone)]
pub struct DoneSignal {
    tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl DoneSignal {
    pub(crate) fn new() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                tx: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    pub fn done(&self) {
        if let Some(tx) = self.tx.lock().take() {
            let _ = tx.send(());
        }
    }
}

impl fmt::Debug for DoneSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DoneSignal")
    }
}

/// Callback form of a wait-for target. Invoked exactly once.
pub type WaitForCallback = Arc<dyn Fn(DoneSignal) + Send + Sync>;

/// What a wait-for call waits on.
#[derive(Clone)]
pub enum WaitForTarget {
    /// One selector that must match.
    Selector(String),
    /// Several selectors that must all match at the same time.
    Selectors(Vec<String>),
    /// A callback that signals completion itself.
    Callback(WaitForCallback),
}

impl fmt::Debug for WaitForTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector(s) => f.debug_tuple("Selector").field(s).finish(),
            Self::Selectors(s) => f.debug_tuple("Selectors").field(s).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enact_page_adapter::{StubNode, StubPage};

    #[test]
    fn select_args_cover_the_count_based_shapes() {
        assert_eq!(
            parse_select_args(&[]),
            Some(SelectParsed::Span(SpanArgs::All))
        );
        assert_eq!(
            parse_select_args(&[CallArg::Int(5)]),
            Some(SelectParsed::Span(SpanArgs::Offset(5)))
        );
        assert_eq!(
            parse_select_args(&[CallArg::Int(2), CallArg::Int(9)]),
            Some(SelectParsed::Span(SpanArgs::Positions { start: 2, end: 9 }))
        );
        assert_eq!(
            parse_select_args(&[
                CallArg::Int(0),
                CallArg::Int(1),
                CallArg::Int(2),
                CallArg::Int(3)
            ]),
            Some(SelectParsed::Span(SpanArgs::Quad([0, 1, 2, 3])))
        );
    }

    #[test]
    fn select_args_reject_bad_shapes() {
        // Three positions are never valid.
        assert_eq!(
            parse_select_args(&[CallArg::Int(1), CallArg::Int(2), CallArg::Int(3)]),
            None
        );
        assert_eq!(parse_select_args(&[CallArg::Int(-1)]), None);
        assert_eq!(parse_select_args(&[CallArg::Float(1.5)]), None);
        // No string coercion for selection positions.
        assert_eq!(parse_select_args(&[CallArg::Str("3".into())]), None);
    }

    #[test]
    fn single_node_argument_means_range_selection() {
        let node = NodeId::new();
        assert_eq!(
            parse_select_args(&[CallArg::Node(node.clone())]),
            Some(SelectParsed::Range { end: node })
        );
    }

    #[tokio::test]
    async fn drag_offsets_win_over_destinations_and_coerce_strings() {
        let page = StubPage::new();
        let query: Arc<dyn ElementQuery> = page.clone();

        let parsed = parse_drag_destination(&[CallArg::Int(10), CallArg::Int(-4)], &query).await;
        assert_eq!(parsed, Some(DragDestination::Offset { dx: 10, dy: -4 }));

        let parsed =
            parse_drag_destination(&[CallArg::Str("12.6".into()), CallArg::Float(3.2)], &query)
                .await;
        assert_eq!(parsed, Some(DragDestination::Offset { dx: 13, dy: 3 }));
    }

    #[tokio::test]
    async fn drag_selector_destination_gets_one_immediate_query() {
        let page = StubPage::new();
        let dest = page.add_node(StubNode::element("div#drop"));
        page.set_matches("#drop", vec![dest.clone()]);
        let query: Arc<dyn ElementQuery> = page.clone();

        let parsed = parse_drag_destination(&[CallArg::Str("#drop".into())], &query).await;
        assert_eq!(parsed, Some(DragDestination::Element(dest)));
        assert_eq!(page.query_count("#drop"), 1);

        let parsed = parse_drag_destination(&[CallArg::Str("#missing".into())], &query).await;
        assert_eq!(parsed, None);
        assert_eq!(page.query_count("#missing"), 1);
    }

    #[tokio::test]
    async fn drag_rejects_a_lone_number_and_empty_args() {
        let page = StubPage::new();
        let query: Arc<dyn ElementQuery> = page.clone();
        assert_eq!(parse_drag_destination(&[CallArg::Int(5)], &query).await, None);
        assert_eq!(parse_drag_destination(&[], &query).await, None);
    }

    #[test]
    fn file_paths_distinguish_empty_valid_and_invalid() {
        assert_eq!(parse_file_paths(&CallArg::Null), FilePathsArg::Empty);
        assert_eq!(parse_file_paths(&CallArg::Str("".into())), FilePathsArg::Empty);
        assert_eq!(parse_file_paths(&CallArg::Bool(false)), FilePathsArg::Empty);
        assert_eq!(
            parse_file_paths(&CallArg::Str("a.txt".into())),
            FilePathsArg::Valid(vec!["a.txt".to_string()])
        );
        assert_eq!(
            parse_file_paths(&CallArg::List(vec![
                CallArg::Str("a.txt".into()),
                CallArg::Str("b.txt".into())
            ])),
            FilePathsArg::Valid(vec!["a.txt".to_string(), "b.txt".to_string()])
        );
        assert_eq!(parse_file_paths(&CallArg::Int(42)), FilePathsArg::Invalid);
        assert_eq!(
            parse_file_paths(&CallArg::List(vec![CallArg::Str("a".into()), CallArg::Int(2)])),
            FilePathsArg::Invalid
        );
    }

    #[test]
    fn done_signal_fires_once() {
        let (signal, mut rx) = DoneSignal::new();
        signal.done();
        signal.done();
        assert!(rx.try_recv().is_ok());
    }
}
