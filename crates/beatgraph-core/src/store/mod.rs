//! Persisted-graph store contract.
//!
//! The store is a plain CRUD document store. It never interprets the graph
//! document; sanitization happens in the runtime when a document is loaded.

mod record;
mod service;

pub use record::{GraphRecord, GraphSummary, StoredGraph};
pub use service::GraphStore;

use crate::{GraphId, Result};

/// Core trait for graph document stores.
#[async_trait::async_trait]
pub trait GraphStoreProvider: Send + Sync {
    /// Lists every stored graph.
    async fn list(&self) -> Result<Vec<GraphSummary>>;

    /// Fetches a stored graph with its document.
    async fn get(&self, id: GraphId) -> Result<StoredGraph>;

    /// Inserts a new graph and returns its id.
    async fn create(&self, record: &GraphRecord) -> Result<GraphId>;

    /// Replaces the name and document of an existing graph.
    async fn update(&self, id: GraphId, record: &GraphRecord) -> Result<GraphId>;

    /// Deletes a graph.
    async fn delete(&self, id: GraphId) -> Result<()>;
}
