//! The mutable graph model.

use std::collections::HashSet;

use beatgraph_core::{EdgeId, GraphId, NodeId};
use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use thiserror::Error;

use super::{Edge, GraphNode, NodeData, Position, Viewport};
use crate::TRACING_TARGET_GRAPH;
use crate::registry::{NodeKindId, PortDirection, SemanticType};

/// Current graph document format version.
pub const GRAPH_FORMAT_VERSION: u32 = 1;

/// Offset applied to duplicated nodes.
pub const DUPLICATE_OFFSET: Position = Position::new(40.0, 40.0);

/// Reasons a connection request is rejected.
///
/// A rejected request never mutates the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// An endpoint node does not exist.
    #[error("node {0} does not exist")]
    MissingNode(NodeId),
    /// The source node has no such output port.
    #[error("node {node} has no output port '{port}'")]
    MissingOutput {
        /// Source node.
        node: NodeId,
        /// Requested port.
        port: String,
    },
    /// The target node has no such input port.
    #[error("node {node} has no input port '{port}'")]
    MissingInput {
        /// Target node.
        node: NodeId,
        /// Requested port.
        port: String,
    },
    /// The port types differ.
    #[error("cannot connect a {output} output to a {input} input")]
    TypeMismatch {
        /// Type of the source port.
        output: SemanticType,
        /// Type of the target port.
        input: SemanticType,
    },
    /// Source and target are the same node.
    #[error("node {0} cannot be connected to itself")]
    SelfLoop(NodeId),
    /// An edge between the same ports already exists.
    #[error("edge already exists")]
    Duplicate,
    /// The edge would close a cycle.
    #[error("edge would create a cycle")]
    WouldCycle,
}

/// A node removed from the graph together with its incident edges.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNode {
    /// The removed node.
    pub node: GraphNode,
    /// Edges removed alongside it.
    pub edges: Vec<Edge>,
}

/// A pipeline graph.
///
/// Nodes keep insertion order, which the scheduler uses as tie-break.
/// Every mutation on a missing id is a logged no-op rather than an error,
/// so stale asynchronous callbacks are harmless.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    /// Store id, `None` until the first save.
    pub id: Option<GraphId>,
    /// Display name.
    pub name: String,
    /// Canvas pan and zoom.
    pub viewport: Viewport,
    /// Document format version.
    pub version: u32,
    nodes: Vec<GraphNode>,
    edges: Vec<Edge>,
}

impl Graph {
    /// Creates an empty draft graph.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            viewport: Viewport::default(),
            version: GRAPH_FORMAT_VERSION,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Returns whether the graph has never been saved.
    #[inline]
    pub fn is_draft(&self) -> bool {
        self.id.is_none()
    }

    /// Returns the nodes in insertion order.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Returns the edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns a node by id.
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    /// Returns whether a node exists.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Returns an edge by id.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    /// Returns edges ending at `node`.
    pub fn incoming(&self, node: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(move |edge| edge.target == node)
    }

    /// Returns edges starting at `node`.
    pub fn outgoing(&self, node: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(move |edge| edge.source == node)
    }

    /// Adds a node of `kind` at `position` and returns its fresh id.
    pub fn add_node(&mut self, kind: NodeKindId, position: Position) -> NodeId {
        self.insert_node(GraphNode::new(kind, position))
    }

    /// Adds a node of `kind` with initial data.
    pub fn add_node_with_data(
        &mut self,
        kind: NodeKindId,
        position: Position,
        data: NodeData,
    ) -> NodeId {
        self.insert_node(GraphNode::new(kind, position).with_data(data))
    }

    fn insert_node(&mut self, node: GraphNode) -> NodeId {
        let id = node.id;
        tracing::trace!(
            target: TRACING_TARGET_GRAPH,
            node_id = %id,
            kind = %node.kind,
            "Node added"
        );
        self.nodes.push(node);
        id
    }

    /// Appends a node as-is. The caller guarantees id uniqueness.
    pub(crate) fn push_node(&mut self, node: GraphNode) {
        self.nodes.push(node);
    }

    /// Appends an edge as-is. The caller guarantees it is valid.
    pub(crate) fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Removes a node and every edge incident to it.
    ///
    /// Unknown ids are a no-op returning `None`.
    pub fn remove_node(&mut self, id: NodeId) -> Option<RemovedNode> {
        let Some(index) = self.nodes.iter().position(|node| node.id == id) else {
            tracing::debug!(
                target: TRACING_TARGET_GRAPH,
                node_id = %id,
                "Ignoring removal of unknown node"
            );
            return None;
        };

        let node = self.nodes.remove(index);
        let (removed, kept): (Vec<_>, Vec<_>) =
            self.edges.drain(..).partition(|edge| edge.touches(id));
        self.edges = kept;

        tracing::trace!(
            target: TRACING_TARGET_GRAPH,
            node_id = %id,
            edge_count = removed.len(),
            "Node removed"
        );

        Some(RemovedNode {
            node,
            edges: removed,
        })
    }

    /// Shallow-merges `partial` into a node's data.
    ///
    /// Returns `false` without effect when the node does not exist.
    pub fn update_node_data(&mut self, id: NodeId, partial: &NodeData) -> bool {
        let Some(node) = self.node_mut(id) else {
            tracing::debug!(
                target: TRACING_TARGET_GRAPH,
                node_id = %id,
                "Ignoring data update for unknown node"
            );
            return false;
        };

        node.merge_data(partial);
        true
    }

    /// Enables or disables a node. Returns `false` when it does not exist.
    pub fn set_node_disabled(&mut self, id: NodeId, disabled: bool) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.disabled = disabled;
                true
            }
            None => {
                tracing::debug!(
                    target: TRACING_TARGET_GRAPH,
                    node_id = %id,
                    "Ignoring disable toggle for unknown node"
                );
                false
            }
        }
    }

    /// Clones the given nodes with fresh ids, shifted by [`DUPLICATE_OFFSET`].
    ///
    /// Edges are not cloned. Unknown ids are skipped. Returns the new ids
    /// in the order the originals were requested.
    pub fn duplicate_nodes(&mut self, ids: &[NodeId]) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let clones: Vec<GraphNode> = ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| self.node(*id))
            .map(|original| GraphNode {
                id: NodeId::new(),
                kind: original.kind,
                position: original.position.offset(DUPLICATE_OFFSET),
                data: original.data.clone(),
                disabled: original.disabled,
            })
            .collect();

        let new_ids = clones.iter().map(|node| node.id).collect();
        self.nodes.extend(clones);
        new_ids
    }

    /// Connects an output port to an input port with a default-styled edge.
    pub fn connect(
        &mut self,
        source: NodeId,
        source_port: &str,
        target: NodeId,
        target_port: &str,
    ) -> Result<EdgeId, ConnectError> {
        self.connect_edge(Edge::new(source, source_port, target, target_port))
    }

    /// Validates and appends a prepared edge.
    pub fn connect_edge(&mut self, edge: Edge) -> Result<EdgeId, ConnectError> {
        if let Err(error) = self.validate_edge(&edge) {
            tracing::debug!(
                target: TRACING_TARGET_GRAPH,
                source = %edge.source,
                target = %edge.target,
                error = %error,
                "Connection rejected"
            );
            return Err(error);
        }

        let id = edge.id;
        self.edges.push(edge);
        Ok(id)
    }

    /// Checks whether `edge` may be added to the graph.
    pub fn validate_edge(&self, edge: &Edge) -> Result<(), ConnectError> {
        self.validate_endpoints(edge)?;

        if self.edges.iter().any(|existing| existing.same_endpoints(edge)) {
            return Err(ConnectError::Duplicate);
        }

        if self.reaches(edge.target, edge.source) {
            return Err(ConnectError::WouldCycle);
        }

        Ok(())
    }

    /// Checks endpoint existence, port direction and type compatibility.
    pub(crate) fn validate_endpoints(&self, edge: &Edge) -> Result<(), ConnectError> {
        let source = self
            .node(edge.source)
            .ok_or(ConnectError::MissingNode(edge.source))?;
        let target = self
            .node(edge.target)
            .ok_or(ConnectError::MissingNode(edge.target))?;

        if edge.source == edge.target {
            return Err(ConnectError::SelfLoop(edge.source));
        }

        let output = source
            .definition()
            .port(PortDirection::Output, &edge.source_port)
            .ok_or_else(|| ConnectError::MissingOutput {
                node: edge.source,
                port: edge.source_port.clone(),
            })?;
        let input = target
            .definition()
            .port(PortDirection::Input, &edge.target_port)
            .ok_or_else(|| ConnectError::MissingInput {
                node: edge.target,
                port: edge.target_port.clone(),
            })?;

        if output.semantic_type != input.semantic_type {
            return Err(ConnectError::TypeMismatch {
                output: output.semantic_type,
                input: input.semantic_type,
            });
        }

        Ok(())
    }

    /// Returns whether `to` is reachable from `from` along edges.
    pub fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return true;
        }

        let adjacency = self.adjacency();
        adjacency.contains_node(from)
            && adjacency.contains_node(to)
            && has_path_connecting(&adjacency, from, to, None)
    }

    /// Builds a node-keyed adjacency map.
    pub(crate) fn adjacency(&self) -> DiGraphMap<NodeId, ()> {
        let mut map = DiGraphMap::with_capacity(self.nodes.len(), self.edges.len());
        for node in &self.nodes {
            map.add_node(node.id);
        }
        for edge in &self.edges {
            map.add_edge(edge.source, edge.target, ());
        }
        map
    }

    /// Removes an edge. Unknown ids are a no-op returning `None`.
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let Some(index) = self.edges.iter().position(|edge| edge.id == id) else {
            tracing::debug!(
                target: TRACING_TARGET_GRAPH,
                edge_id = %id,
                "Ignoring removal of unknown edge"
            );
            return None;
        };
        Some(self.edges.remove(index))
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
