//! Graph edges.

use beatgraph_core::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Rendering style of an edge.
///
/// Persisted for the editor only; the engine attaches no meaning to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EdgeType {
    /// Editor default.
    #[default]
    Default,
    /// Straight line.
    Straight,
    /// Right-angled steps.
    Step,
    /// Steps with rounded corners.
    SmoothStep,
    /// Bezier curve.
    Bezier,
}

impl EdgeType {
    /// Maps an arbitrary tag onto the allow-list, falling back to `default`.
    pub fn normalize(tag: &str) -> Self {
        tag.trim().parse().unwrap_or_default()
    }
}

/// A typed link from an output port to an input port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
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
    /// Rendering style.
    pub edge_type: EdgeType,
    /// Rendering color hint.
    pub color: Option<String>,
}

impl Edge {
    /// Creates a default-styled edge with a fresh id.
    pub fn new(
        source: NodeId,
        source_port: impl Into<String>,
        target: NodeId,
        target_port: impl Into<String>,
    ) -> Self {
        Self {
            id: EdgeId::new(),
            source,
            source_port: source_port.into(),
            target,
            target_port: target_port.into(),
            edge_type: EdgeType::Default,
            color: None,
        }
    }

    /// Sets the rendering style.
    #[must_use]
    pub fn with_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_type = edge_type;
        self
    }

    /// Sets the rendering color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Returns whether either endpoint is `node`.
    #[inline]
    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }

    /// Returns whether both edges link the same ports.
    pub fn same_endpoints(&self, other: &Edge) -> bool {
        self.source == other.source
            && self.source_port == other.source_port
            && self.target == other.target
            && self.target_port == other.target_port
    }
}
