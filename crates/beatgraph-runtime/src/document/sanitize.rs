//! Document sanitization.

use std::collections::HashSet;

use serde::Serialize;

use super::GraphDocument;
use crate::TRACING_TARGET_DOCUMENT;
use crate::graph::{Edge, EdgeType, Graph, GraphNode, strip_transient};
use crate::registry::{NodeKindId, Registry};

/// What was dropped while rebuilding a graph from a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizeReport {
    /// Nodes of unknown kind or with a repeated id.
    pub dropped_nodes: usize,
    /// Edges that are dangling, mistyped, repeated or misdirected.
    pub dropped_edges: usize,
    /// Edge style tags replaced with the default.
    pub coerced_edge_types: usize,
}

impl SanitizeReport {
    /// Returns whether the document was already clean.
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Rebuilds a graph from `document`, keeping only what validates.
///
/// Nodes whose kind is not in `registry` are dropped together with their
/// edges. Transient data keys are stripped and unknown edge styles fall
/// back to the default. Every drop is logged at `warn`. Edges that close a
/// cycle are kept; the scheduler reports them.
pub fn sanitize(document: &GraphDocument, registry: &Registry) -> (Graph, SanitizeReport) {
    let mut report = SanitizeReport::default();
    let mut graph = Graph::default();
    graph.viewport = document.viewport;
    if document.version != graph.version {
        tracing::debug!(
            target: TRACING_TARGET_DOCUMENT,
            version = document.version,
            "Upgrading graph document"
        );
    }

    let mut node_ids = HashSet::new();
    for node in &document.nodes {
        let kind = node
            .kind
            .parse::<NodeKindId>()
            .ok()
            .filter(|kind| registry.contains(*kind));
        let Some(kind) = kind else {
            tracing::warn!(
                target: TRACING_TARGET_DOCUMENT,
                node_id = %node.id,
                kind = %node.kind,
                "Dropping node of unknown kind"
            );
            report.dropped_nodes += 1;
            continue;
        };

        if !node_ids.insert(node.id) {
            tracing::warn!(
                target: TRACING_TARGET_DOCUMENT,
                node_id = %node.id,
                "Dropping node with duplicate id"
            );
            report.dropped_nodes += 1;
            continue;
        }

        graph.push_node(GraphNode {
            id: node.id,
            kind,
            position: node.position,
            data: strip_transient(&node.data),
            disabled: node.disabled,
        });
    }

    let mut edge_ids = HashSet::new();
    for stored in &document.edges {
        let edge_type = EdgeType::normalize(&stored.edge_type);
        if edge_type.as_ref() != stored.edge_type.trim().to_ascii_lowercase() {
            report.coerced_edge_types += 1;
        }

        let edge = Edge {
            id: stored.id,
            source: stored.source,
            source_port: stored.source_port.clone(),
            target: stored.target,
            target_port: stored.target_port.clone(),
            edge_type,
            color: stored.color.clone(),
        };

        if !edge_ids.insert(edge.id) {
            tracing::warn!(
                target: TRACING_TARGET_DOCUMENT,
                edge_id = %edge.id,
                "Dropping edge with duplicate id"
            );
            report.dropped_edges += 1;
            continue;
        }

        if let Err(error) = graph.validate_endpoints(&edge) {
            tracing::warn!(
                target: TRACING_TARGET_DOCUMENT,
                edge_id = %edge.id,
                error = %error,
                "Dropping invalid edge"
            );
            report.dropped_edges += 1;
            continue;
        }

        if graph.edges().iter().any(|existing| existing.same_endpoints(&edge)) {
            tracing::warn!(
                target: TRACING_TARGET_DOCUMENT,
                edge_id = %edge.id,
                "Dropping edge repeating an existing link"
            );
            report.dropped_edges += 1;
            continue;
        }

        graph.push_edge(edge);
    }

    if !report.is_clean() {
        tracing::info!(
            target: TRACING_TARGET_DOCUMENT,
            dropped_nodes = report.dropped_nodes,
            dropped_edges = report.dropped_edges,
            coerced_edge_types = report.coerced_edge_types,
            "Graph document sanitized"
        );
    }

    (graph, report)
}
