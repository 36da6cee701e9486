//! Completing a dangling link with a freshly placed node.

use beatgraph_core::{EdgeId, NodeId};
use thiserror::Error;

use crate::TRACING_TARGET_GRAPH;
use crate::graph::{Edge, Graph, Position};
use crate::registry::{PortDirection, Registry};

/// The port a link was dragged from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireOrigin {
    /// Node owning the port.
    pub node_id: NodeId,
    /// Port id.
    pub port_id: String,
    /// Port direction; ids alone are only unique per direction.
    pub direction: PortDirection,
}

impl WireOrigin {
    /// A link dragged out of an output port.
    pub fn output(node_id: NodeId, port_id: impl Into<String>) -> Self {
        Self {
            node_id,
            port_id: port_id.into(),
            direction: PortDirection::Output,
        }
    }

    /// A link dragged out of an input port.
    pub fn input(node_id: NodeId, port_id: impl Into<String>) -> Self {
        Self {
            node_id,
            port_id: port_id.into(),
            direction: PortDirection::Input,
        }
    }
}

/// Reasons an auto-wire request is rejected without touching the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutoWireError {
    /// The selected kind is not in the registry.
    #[error("unknown node kind '{0}'")]
    UnknownKind(String),
    /// The origin node no longer exists.
    #[error("origin node {0} does not exist")]
    MissingOrigin(NodeId),
    /// The origin node has no such port.
    #[error("origin node {node} has no {direction} port '{port}'")]
    MissingOriginPort {
        /// Origin node.
        node: NodeId,
        /// Requested port.
        port: String,
        /// Requested direction.
        direction: PortDirection,
    },
}

/// Outcome of an auto-wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoWired {
    /// The placed node.
    pub node_id: NodeId,
    /// The created edge; `None` when the kind had no matching port.
    pub edge_id: Option<EdgeId>,
}

/// Places a node of `kind` at `drop` and links it to `origin`.
///
/// The first port of the new node with the opposite direction and the
/// origin's type is used, in declaration order. The edge is colored after
/// the link type.
pub fn auto_wire(
    graph: &mut Graph,
    registry: &Registry,
    origin: &WireOrigin,
    kind: &str,
    drop: Position,
) -> Result<AutoWired, AutoWireError> {
    let definition = registry
        .get_kind(kind)
        .ok_or_else(|| AutoWireError::UnknownKind(kind.to_owned()))?;

    let origin_node = graph
        .node(origin.node_id)
        .ok_or(AutoWireError::MissingOrigin(origin.node_id))?;
    let origin_port = origin_node
        .definition()
        .port(origin.direction, &origin.port_id)
        .ok_or_else(|| AutoWireError::MissingOriginPort {
            node: origin.node_id,
            port: origin.port_id.clone(),
            direction: origin.direction,
        })?;

    let semantic_type = origin_port.semantic_type;
    let node_id = graph.add_node(definition.id, drop);

    let Some(port) = definition.first_port(origin.direction.opposite(), semantic_type) else {
        tracing::warn!(
            target: TRACING_TARGET_GRAPH,
            kind = %definition.id,
            semantic_type = %semantic_type,
            "Auto-wired kind has no matching port, node left unconnected"
        );
        return Ok(AutoWired {
            node_id,
            edge_id: None,
        });
    };

    let edge = match origin.direction {
        PortDirection::Output => Edge::new(origin.node_id, origin_port.id, node_id, port.id),
        PortDirection::Input => Edge::new(node_id, port.id, origin.node_id, origin_port.id),
    }
    .with_color(semantic_type.color());

    let edge_id = match graph.connect_edge(edge) {
        Ok(edge_id) => Some(edge_id),
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET_GRAPH,
                node_id = %node_id,
                error = %error,
                "Auto-wired node left unconnected"
            );
            None
        }
    };

    Ok(AutoWired { node_id, edge_id })
}
