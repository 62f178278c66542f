use std::fmt;
use std::sync::Arc;

use enact_core_types::NodeId;

/// Callback form of a target descriptor. Re-invoked on every availability
/// poll so the caller can point at nodes that do not exist yet.
pub type NodeProducer = Arc<dyn Fn() -> Vec<NodeId> + Send + Sync>;

/// One target descriptor of a gesture call.
///
/// Concrete nodes are used as-is; `Selector` and `Producer` are re-evaluated
/// on every availability poll until they yield at least one node.
#[derive(Clone)]
pub enum ActionTargetSpec {
    /// A single already-resolved node.
    Node(NodeId),
    /// A flattened collection of nodes. Empty means the call had nothing to
    /// act on and fails immediately.
    Nodes(Vec<NodeId>),
    /// A selector string evaluated through `ElementQuery`.
    Selector(String),
    /// A producer callback returning the current candidate nodes.
    Producer(NodeProducer),
}

impl ActionTargetSpec {
    pub fn selector(selector: impl Into<String>) -> Self {
        Self::Selector(selector.into())
    }

    pub fn producer<F>(produce: F) -> Self
    where
        F: Fn() -> Vec<NodeId> + Send + Sync + 'static,
    {
        Self::Producer(Arc::new(produce))
    }
}

impl fmt::Debug for ActionTargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(id) => f.debug_tuple("Node").field(id).finish(),
            Self::Nodes(ids) => f.debug_tuple("Nodes").field(ids).finish(),
            Self::Selector(selector) => f.debug_tuple("Selector").field(selector).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

impl From<NodeId> for ActionTargetSpec {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<Vec<NodeId>> for ActionTargetSpec {
    fn from(nodes: Vec<NodeId>) -> Self {
        Self::Nodes(nodes)
    }
}

impl From<&str> for ActionTargetSpec {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

/// The first argument of a gesture call: one or several target descriptors,
/// processed strictly in call order.
#[derive(Clone, Debug)]
pub struct TargetInput {
    pub specs: Vec<ActionTargetSpec>,
}

impl TargetInput {
    pub fn one(spec: impl Into<ActionTargetSpec>) -> Self {
        Self {
            specs: vec![spec.into()],
        }
    }

    pub fn many(specs: Vec<ActionTargetSpec>) -> Self {
        Self { specs }
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl From<ActionTargetSpec> for TargetInput {
    fn from(spec: ActionTargetSpec) -> Self {
        Self::one(spec)
    }
}

impl From<Vec<ActionTargetSpec>> for TargetInput {
    fn from(specs: Vec<ActionTargetSpec>) -> Self {
        Self::many(specs)
    }
}

impl From<NodeId> for TargetInput {
    fn from(node: NodeId) -> Self {
        Self::one(ActionTargetSpec::Node(node))
    }
}

impl From<&str> for TargetInput {
    fn from(selector: &str) -> Self {
        Self::one(ActionTargetSpec::selector(selector))
    }
}
