//! Versioned graph documents.
//!
//! A [`GraphDocument`] is what the graph store keeps. Writing one is
//! lossless apart from transient node data; reading one re-validates
//! everything, since stored documents may predate current rules or have
//! been edited by hand.

mod sanitize;

use beatgraph_core::{EdgeId, NodeId, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use sanitize::{SanitizeReport, sanitize};

use crate::graph::{GRAPH_FORMAT_VERSION, Graph, NodeData, Position, Viewport};
use crate::registry::Registry;

/// Persisted form of a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Format version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Nodes in insertion order.
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
    /// Edges in insertion order.
    #[serde(default)]
    pub edges: Vec<EdgeDocument>,
    /// Canvas pan and zoom.
    #[serde(default)]
    pub viewport: Viewport,
}

fn default_version() -> u32 {
    GRAPH_FORMAT_VERSION
}

/// Persisted form of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    /// Node id.
    pub id: NodeId,
    /// Kind wire id; kept as a string so unknown kinds can be dropped
    /// instead of failing the whole document.
    pub kind: String,
    /// Canvas position.
    #[serde(default)]
    pub position: Position,
    /// Kind-specific payload.
    #[serde(default)]
    pub data: NodeData,
    /// Disabled flag.
    #[serde(default)]
    pub disabled: bool,
}

/// Persisted form of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDocument {
    /// Edge id.
    pub id: EdgeId,
    /// Upstream node.
    pub source: NodeId,
    /// Output port on the upstream node.
    pub source_port: String,
    /// Downstream node.
    pub target: NodeId,
    /// Input port on the downstream node.
    pub target_port: String,
    /// Rendering style tag.
    #[serde(rename = "type", default)]
    pub edge_type: String,
    /// Rendering color hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl GraphDocument {
    /// Creates an empty document at the current version.
    pub fn new() -> Self {
        Self {
            version: GRAPH_FORMAT_VERSION,
            nodes: Vec::new(),
            edges: Vec::new(),
            viewport: Viewport::default(),
        }
    }
}

impl Default for GraphDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts a graph into its persisted form.
///
/// Transient node-data keys are stripped.
pub fn serialize(graph: &Graph) -> GraphDocument {
    let nodes = graph
        .nodes()
        .iter()
        .map(|node| NodeDocument {
            id: node.id,
            kind: node.kind.to_string(),
            position: node.position,
            data: node.persistent_data(),
            disabled: node.disabled,
        })
        .collect();

    let edges = graph
        .edges()
        .iter()
        .map(|edge| EdgeDocument {
            id: edge.id,
            source: edge.source,
            source_port: edge.source_port.clone(),
            target: edge.target,
            target_port: edge.target_port.clone(),
            edge_type: edge.edge_type.to_string(),
            color: edge.color.clone(),
        })
        .collect();

    GraphDocument {
        version: GRAPH_FORMAT_VERSION,
        nodes,
        edges,
        viewport: graph.viewport,
    }
}

/// Converts a graph into a JSON document.
pub fn to_value(graph: &Graph) -> Result<Value> {
    Ok(serde_json::to_value(serialize(graph))?)
}

/// Rebuilds a graph from a document, dropping whatever no longer validates.
///
/// The returned graph is a draft named `"Untitled"`; callers loading from a
/// store set the id and name from the stored record.
pub fn deserialize(document: &GraphDocument, registry: &Registry) -> Graph {
    sanitize(document, registry).0
}

/// Parses and rebuilds a graph from a JSON document.
pub fn deserialize_value(value: Value, registry: &Registry) -> Result<Graph> {
    let document: GraphDocument = serde_json::from_value(value)?;
    Ok(deserialize(&document, registry))
}

#[cfg(test)]
mod tests {
    use beatgraph_core::ErrorKind;
    use serde_json::json;

    use super::*;
    use crate::graph::{EdgeType, GraphNode};
    use crate::registry::NodeKindId;

    fn sample_graph() -> Graph {
        let mut graph = Graph::new("sample");
        let mut data = NodeData::new();
        data.insert("text".into(), json!("a lighthouse in fog"));
        data.insert("$pending".into(), json!(true));
        let prompt =
            graph.add_node_with_data(NodeKindId::Prompt, Position::new(10.0, 20.0), data);
        let image = graph.add_node(NodeKindId::ImageGenerator, Position::new(250.0, 20.0));
        let video = graph.add_node(NodeKindId::ImageToVideo, Position::new(500.0, 20.0));
        graph.set_node_disabled(video, true);
        graph.connect(prompt, "prompt", image, "prompt").unwrap();
        graph
            .connect_edge(
                crate::graph::Edge::new(image, "image", video, "image")
                    .with_type(EdgeType::Bezier)
                    .with_color("#22c55e"),
            )
            .unwrap();
        graph.viewport = Viewport {
            x: -40.0,
            y: 12.5,
            zoom: 0.75,
        };
        graph
    }

    #[test]
    fn test_round_trip_preserves_content() {
        let registry = Registry::builtin();
        let graph = sample_graph();
        let restored = deserialize(&serialize(&graph), &registry);

        assert_eq!(restored.viewport, graph.viewport);
        assert_eq!(restored.node_count(), graph.node_count());
        for (before, after) in graph.nodes().iter().zip(restored.nodes()) {
            assert_eq!(after.id, before.id);
            assert_eq!(after.kind, before.kind);
            assert_eq!(after.position, before.position);
            assert_eq!(after.disabled, before.disabled);
            assert_eq!(after.data, before.persistent_data());
        }
        assert_eq!(restored.edges(), graph.edges());
    }

    #[test]
    fn test_serialize_strips_transient_keys() {
        let document = serialize(&sample_graph());
        let prompt: &NodeDocument = &document.nodes[0];
        assert!(prompt.data.contains_key("text"));
        assert!(!prompt.data.contains_key("$pending"));
    }

    #[test]
    fn test_wire_format() {
        let value = to_value(&sample_graph()).unwrap();

        assert_eq!(value["version"], GRAPH_FORMAT_VERSION);
        assert_eq!(value["nodes"][0]["kind"], "prompt");
        assert_eq!(value["nodes"][2]["disabled"], true);
        assert_eq!(value["edges"][0]["sourcePort"], "prompt");
        assert_eq!(value["edges"][0]["type"], "default");
        assert!(value["edges"][0].get("color").is_none());
        assert_eq!(value["edges"][1]["type"], "bezier");
        assert_eq!(value["edges"][1]["color"], "#22c55e");
        assert_eq!(value["viewport"]["zoom"], 0.75);
    }

    #[test]
    fn test_deserialize_value_accepts_sparse_documents() {
        let id = NodeId::new();
        let value = json!({
            "nodes": [{ "id": id.to_string(), "kind": "note" }],
        });

        let graph = deserialize_value(value, &Registry::builtin()).unwrap();
        assert_eq!(graph.version, GRAPH_FORMAT_VERSION);
        assert_eq!(graph.viewport, Viewport::default());
        let node: &GraphNode = graph.node(id).unwrap();
        assert_eq!(node.kind, NodeKindId::Note);
        assert!(!node.disabled);
    }

    #[test]
    fn test_deserialize_value_rejects_malformed_json() {
        let error = deserialize_value(json!({ "nodes": 3 }), &Registry::builtin()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Serialization);
    }
}
