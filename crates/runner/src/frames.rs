//! Frame-argument normalization for steps that run inside a frame.

use std::sync::Arc;

use async_recursion::async_recursion;

use enact_core_types::{ErrorKind, NodeId};
use enact_page_adapter::{ActionTargetSpec, DomInspector, ElementQuery};

/// Reduce a frame argument to the single iframe element it denotes.
///
/// Selectors and producers collapse to their match list first, so a
/// selector matching two frames is rejected the same way a two-node
/// collection is.
#[async_recursion]
pub(crate) async fn normalize_frame_target(
    spec: &ActionTargetSpec,
    query: &Arc<dyn ElementQuery>,
    inspector: &Arc<dyn DomInspector>,
) -> Result<NodeId, ErrorKind> {
    match spec {
        ActionTargetSpec::Node(node) => {
            if !inspector.is_element(node).await {
                return Err(ErrorKind::IncorrectIFrameArgument);
            }
            if !inspector.is_iframe_element(node).await {
                return Err(ErrorKind::IframeArgumentIsNotIFrame);
            }
            Ok(node.clone())
        }
        ActionTargetSpec::Nodes(nodes) => match nodes.as_slice() {
            [] => Err(ErrorKind::EmptyIFrameArgument),
            [node] => {
                normalize_frame_target(&ActionTargetSpec::Node(node.clone()), query, inspector)
                    .await
            }
            _ => Err(ErrorKind::MultipleIFrameArgument),
        },
        ActionTargetSpec::Selector(selector) => {
            let nodes = query.query(selector).await;
            normalize_frame_target(&ActionTargetSpec::Nodes(nodes), query, inspector).await
        }
        ActionTargetSpec::Producer(produce) => {
            let nodes = produce();
            normalize_frame_target(&ActionTargetSpec::Nodes(nodes), query, inspector).await
        }
    }
}
