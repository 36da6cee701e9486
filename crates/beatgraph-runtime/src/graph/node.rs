//! Graph nodes.

use beatgraph_core::NodeId;
use serde_json::{Map, Value};

use super::Position;
use crate::registry::{NodeKind, NodeKindId};

/// Kind-specific node payload.
///
/// Keys starting with [`TRANSIENT_PREFIX`] are runtime-only and never
/// written to a document.
pub type NodeData = Map<String, Value>;

/// Prefix marking node-data keys that must not be persisted.
pub const TRANSIENT_PREFIX: char = '$';

/// A node placed in a graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    /// Node id, unique within the graph.
    pub id: NodeId,
    /// Kind of the node.
    pub kind: NodeKindId,
    /// Canvas position.
    pub position: Position,
    /// Kind-specific payload.
    pub data: NodeData,
    /// Disabled nodes are skipped by execution.
    pub disabled: bool,
}

impl GraphNode {
    /// Creates an enabled node with a fresh id and empty data.
    pub fn new(kind: NodeKindId, position: Position) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            position,
            data: NodeData::new(),
            disabled: false,
        }
    }

    /// Sets the node data.
    #[must_use]
    pub fn with_data(mut self, data: NodeData) -> Self {
        self.data = data;
        self
    }

    /// Returns the static definition of the node's kind.
    #[inline]
    pub fn definition(&self) -> &'static NodeKind {
        self.kind.kind()
    }

    /// Returns the value published on the given output port, if set.
    pub fn published(&self, port_id: &str) -> Option<&Value> {
        let key = self.definition().output(port_id)?.publishes?;
        self.data.get(key).filter(|value| !value.is_null())
    }

    /// Shallow-merges `partial` into the node data, field by field.
    pub(crate) fn merge_data(&mut self, partial: &NodeData) {
        for (key, value) in partial {
            self.data.insert(key.clone(), value.clone());
        }
    }

    /// Returns the node data without transient keys.
    pub fn persistent_data(&self) -> NodeData {
        strip_transient(&self.data)
    }
}

/// Returns a copy of `data` without transient keys.
pub(crate) fn strip_transient(data: &NodeData) -> NodeData {
    data.iter()
        .filter(|(key, _)| !key.starts_with(TRANSIENT_PREFIX))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_published_value_follows_port_key() {
        let mut node = GraphNode::new(NodeKindId::ImageGenerator, Position::default());
        assert!(node.published("image").is_none());

        node.data.insert("assetUrl".into(), json!("https://cdn/a.png"));
        assert_eq!(node.published("image"), Some(&json!("https://cdn/a.png")));
        assert!(node.published("missing").is_none());
    }

    #[test]
    fn test_merge_is_shallow() {
        let mut node = GraphNode::new(NodeKindId::Prompt, Position::default());
        node.data.insert("text".into(), json!("a fox"));
        node.data.insert("style".into(), json!({"tone": "warm"}));

        let mut partial = NodeData::new();
        partial.insert("style".into(), json!({"grain": true}));
        node.merge_data(&partial);

        assert_eq!(node.data["text"], json!("a fox"));
        assert_eq!(node.data["style"], json!({"grain": true}));
    }

    #[test]
    fn test_transient_keys_are_stripped() {
        let mut node = GraphNode::new(NodeKindId::Prompt, Position::default());
        node.data.insert("text".into(), json!("a fox"));
        node.data.insert("$onChange".into(), json!("handler#12"));

        let data = node.persistent_data();
        assert!(data.contains_key("text"));
        assert!(!data.contains_key("$onChange"));
    }
}
