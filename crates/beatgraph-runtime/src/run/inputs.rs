//! Job input resolution.

use std::collections::HashSet;

use beatgraph_core::NodeId;
use serde_json::Value;

use crate::TRACING_TARGET_RUN;
use crate::graph::{Edge, Graph, GraphNode, NodeData};
use crate::registry::NodeKindId;

/// Separator placed between prompts joined by a merge node.
pub const MERGE_SEPARATOR: &str = "\n";

/// Builds the inputs sent with a node's job.
///
/// Starts from the node's persistent data and adds, for every incoming
/// edge, the value the source node publishes on its port, keyed by the
/// target port id. Several edges into one port collect into an array in
/// edge order. Sources that have not published anything yet are skipped.
///
/// Flow nodes are never executed, so a flow source without a published
/// value is resolved from its own upstream: a splitter forwards its prompt
/// and a merge joins its prompts with [`MERGE_SEPARATOR`].
///
/// Returns `None` when the node does not exist.
pub fn resolve_inputs(graph: &Graph, node_id: NodeId) -> Option<NodeData> {
    let node = graph.node(node_id)?;
    let mut visiting = HashSet::from([node_id]);

    let mut inputs = node.persistent_data();
    for (port, values) in wired_values(graph, node_id, &mut visiting) {
        inputs.insert(port.to_owned(), collapse(values));
    }

    Some(inputs)
}

/// Collects upstream values per target port, in edge order.
fn wired_values<'g>(
    graph: &'g Graph,
    node_id: NodeId,
    visiting: &mut HashSet<NodeId>,
) -> Vec<(&'g str, Vec<Value>)> {
    let mut wired: Vec<(&str, Vec<Value>)> = Vec::new();

    for edge in graph.incoming(node_id) {
        let Some(value) = source_value(graph, edge, visiting) else {
            tracing::debug!(
                target: TRACING_TARGET_RUN,
                node_id = %node_id,
                source = %edge.source,
                port = %edge.target_port,
                "Upstream value not available"
            );
            continue;
        };

        let port = edge.target_port.as_str();
        match wired.iter_mut().find(|(key, _)| *key == port) {
            Some((_, values)) => values.push(value),
            None => wired.push((port, vec![value])),
        }
    }

    wired
}

fn source_value(graph: &Graph, edge: &Edge, visiting: &mut HashSet<NodeId>) -> Option<Value> {
    let source = graph.node(edge.source)?;
    if let Some(value) = source.published(&edge.source_port) {
        return Some(value.clone());
    }

    // Cyclic edges survive sanitization, so guard the walk.
    if !visiting.insert(source.id) {
        return None;
    }
    let value = forwarded(graph, source, visiting);
    visiting.remove(&source.id);
    value
}

/// Derives the value of a flow node from its upstream.
fn forwarded(graph: &Graph, node: &GraphNode, visiting: &mut HashSet<NodeId>) -> Option<Value> {
    let port_values = |port: &str, visiting: &mut HashSet<NodeId>| {
        wired_values(graph, node.id, visiting)
            .into_iter()
            .find(|(key, _)| *key == port)
            .map(|(_, values)| values)
    };

    match node.kind {
        NodeKindId::PromptSplitter => port_values("prompt", visiting).map(collapse),
        NodeKindId::PromptMerge => {
            let parts: Vec<String> = port_values("prompts", visiting)?
                .iter()
                .filter_map(prompt_text)
                .collect();
            (!parts.is_empty()).then(|| Value::String(parts.join(MERGE_SEPARATOR)))
        }
        _ => None,
    }
}

/// Flattens a prompt value to text; arrays are joined in order.
fn prompt_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(prompt_text).collect();
            (!parts.is_empty()).then(|| parts.join(MERGE_SEPARATOR))
        }
        other => Some(other.to_string()),
    }
}

fn collapse(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        values.swap_remove(0)
    } else {
        Value::Array(values)
    }
}
