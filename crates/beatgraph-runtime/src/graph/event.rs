//! Notifications broadcast to the host application.

use beatgraph_core::{EdgeId, GraphId, NodeId, RunId, RunStatus};
use serde::Serialize;

use super::NodeData;

/// A change to a session's graph or to a node's run.
///
/// Events are fire-and-forget: a lagging or absent subscriber never blocks
/// the mutation that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraphEvent {
    /// A node was added.
    NodeAdded {
        /// New node.
        node_id: NodeId,
    },
    /// A node and its incident edges were removed.
    NodeRemoved {
        /// Removed node.
        node_id: NodeId,
        /// Edges removed with it.
        edge_ids: Vec<EdgeId>,
    },
    /// Fields of a node's data payload changed.
    NodeDataChanged {
        /// Changed node.
        node_id: NodeId,
        /// The merged fields.
        partial: NodeData,
    },
    /// A node was enabled or disabled.
    NodeDisabled {
        /// Toggled node.
        node_id: NodeId,
        /// New state.
        disabled: bool,
    },
    /// An edge was added.
    EdgeAdded {
        /// New edge.
        edge_id: EdgeId,
    },
    /// An edge was removed.
    EdgeRemoved {
        /// Removed edge.
        edge_id: EdgeId,
    },
    /// The latest run of a node changed status.
    RunStatusChanged {
        /// Owning node.
        node_id: NodeId,
        /// Run id.
        run_id: RunId,
        /// New status.
        status: RunStatus,
        /// Result asset on completion.
        #[serde(skip_serializing_if = "Option::is_none")]
        asset_url: Option<String>,
        /// Failure reason.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// The whole graph was swapped out (load or discard).
    GraphReplaced,
    /// The graph was written to the store.
    GraphSaved {
        /// Store id.
        graph_id: GraphId,
    },
}

impl GraphEvent {
    /// Returns the node the event is about, if any.
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Self::NodeAdded { node_id }
            | Self::NodeRemoved { node_id, .. }
            | Self::NodeDataChanged { node_id, .. }
            | Self::NodeDisabled { node_id, .. }
            | Self::RunStatusChanged { node_id, .. } => Some(*node_id),
            Self::EdgeAdded { .. }
            | Self::EdgeRemoved { .. }
            | Self::GraphReplaced
            | Self::GraphSaved { .. } => None,
        }
    }

    /// Returns whether the event ends any polling for `node`.
    pub fn halts_runs_for(&self, node: NodeId) -> bool {
        match self {
            Self::NodeRemoved { node_id, .. } => *node_id == node,
            Self::NodeDisabled { node_id, disabled } => *disabled && *node_id == node,
            Self::GraphReplaced => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halts_runs_for() {
        let node = NodeId::new();
        let other = NodeId::new();

        let removed = GraphEvent::NodeRemoved {
            node_id: node,
            edge_ids: Vec::new(),
        };
        assert!(removed.halts_runs_for(node));
        assert!(!removed.halts_runs_for(other));

        let enabled = GraphEvent::NodeDisabled {
            node_id: node,
            disabled: false,
        };
        assert!(!enabled.halts_runs_for(node));
        assert!(GraphEvent::GraphReplaced.halts_runs_for(other));
    }

    #[test]
    fn test_event_serializes_tagged() {
        let node_id = NodeId::new();
        let event = GraphEvent::RunStatusChanged {
            node_id,
            run_id: RunId::from("r1"),
            status: RunStatus::Completed,
            asset_url: Some("X".into()),
            error: None,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "run_status_changed");
        assert_eq!(value["status"], "completed");
        assert_eq!(value["asset_url"], "X");
        assert!(value.get("error").is_none());
    }
}
