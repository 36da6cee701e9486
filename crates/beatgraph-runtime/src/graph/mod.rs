//! Graph data model.
//!
//! [`Graph`] is the plain, synchronous model. [`GraphSession`] wraps it for
//! shared use: every mutation goes through its write lock and produces a
//! [`GraphEvent`].

mod edge;
mod event;
#[allow(clippy::module_inception)]
mod graph;
mod node;
mod position;
mod session;

pub use edge::{Edge, EdgeType};
pub use event::GraphEvent;
pub use graph::{ConnectError, DUPLICATE_OFFSET, GRAPH_FORMAT_VERSION, Graph, RemovedNode};
pub(crate) use node::strip_transient;
pub use node::{GraphNode, NodeData, TRANSIENT_PREFIX};
pub use position::{Position, Viewport};
pub use session::GraphSession;
