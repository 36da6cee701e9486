//! Prelude module for convenient imports.

pub use beatgraph_core::prelude::*;

pub use crate::document::{GraphDocument, SanitizeReport};
pub use crate::graph::{Edge, EdgeType, Graph, GraphEvent, GraphNode, GraphSession, NodeData, Position};
pub use crate::persist::GraphRepository;
pub use crate::registry::{NodeKind, NodeKindId, PortDirection, Registry, SemanticType};
pub use crate::resolve::{Candidates, WireOrigin, candidates};
pub use crate::run::{NodeRunState, Run, RunConfig, RunTracker, Submission};
pub use crate::schedule::{Phase, RhythmAnalysis, RhythmWarning, Schedule, topological_order};
