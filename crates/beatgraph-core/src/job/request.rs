//! Job submission request.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{GraphId, NodeId};

/// A request to execute a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    /// Graph owning the node, if it has been saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_id: Option<GraphId>,
    /// Node being executed.
    pub node_id: NodeId,
    /// Kind identifier of the node (e.g. `image_generator`).
    pub node_kind: String,
    /// Resolved inputs: node settings plus upstream values keyed by port id.
    pub inputs: Map<String, Value>,
}

impl JobRequest {
    /// Creates a request without inputs.
    pub fn new(graph_id: Option<GraphId>, node_id: NodeId, node_kind: impl Into<String>) -> Self {
        Self {
            graph_id,
            node_id,
            node_kind: node_kind.into(),
            inputs: Map::new(),
        }
    }

    /// Sets the inputs of this request.
    #[must_use]
    pub fn with_inputs(mut self, inputs: Map<String, Value>) -> Self {
        self.inputs = inputs;
        self
    }
}
