//! Persistence of graphs through the graph store.
//!
//! [`GraphRepository`] converts between live [`Graph`]s and stored records.
//! Documents read back from the store always go through sanitization, so a
//! stored graph that no longer validates loads with the offending parts
//! dropped instead of failing.

use beatgraph_core::{GraphId, GraphRecord, GraphStore, GraphSummary, Result};

use crate::TRACING_TARGET_PERSIST;
use crate::document;
use crate::graph::Graph;
use crate::registry::Registry;

/// Suffix appended to the name of a duplicated graph.
pub const COPY_SUFFIX: &str = " (copy)";

/// Saves and loads graphs through a [`GraphStore`].
#[derive(Debug, Clone)]
pub struct GraphRepository {
    store: GraphStore,
    registry: Registry,
}

impl GraphRepository {
    /// Creates a repository validating loaded documents against `registry`.
    pub fn new(store: GraphStore, registry: Registry) -> Self {
        Self { store, registry }
    }

    /// Returns the registry used to validate loaded documents.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Lists every stored graph.
    pub async fn list(&self) -> Result<Vec<GraphSummary>> {
        self.store.list().await
    }

    /// Saves a graph and returns its store id.
    ///
    /// Drafts are created; graphs that already carry an id are updated in
    /// place. The graph itself is not modified.
    pub async fn save(&self, graph: &Graph) -> Result<GraphId> {
        let record = GraphRecord::new(graph.name.clone(), document::to_value(graph)?);

        let graph_id = match graph.id {
            Some(id) => self.store.update(id, &record).await?,
            None => self.store.create(&record).await?,
        };

        tracing::info!(
            target: TRACING_TARGET_PERSIST,
            graph_id = %graph_id,
            created = graph.is_draft(),
            node_count = graph.node_count(),
            edge_count = graph.edge_count(),
            "Graph saved"
        );
        Ok(graph_id)
    }

    /// Loads and sanitizes a stored graph.
    pub async fn load(&self, id: GraphId) -> Result<Graph> {
        let stored = self.store.get(id).await?;
        let mut graph = document::deserialize_value(stored.document, &self.registry)?;
        graph.id = Some(stored.id);
        graph.name = stored.name;

        tracing::info!(
            target: TRACING_TARGET_PERSIST,
            graph_id = %id,
            node_count = graph.node_count(),
            edge_count = graph.edge_count(),
            "Graph loaded"
        );
        Ok(graph)
    }

    /// Deletes a stored graph.
    pub async fn remove(&self, id: GraphId) -> Result<()> {
        self.store.delete(id).await?;
        tracing::info!(target: TRACING_TARGET_PERSIST, graph_id = %id, "Graph removed");
        Ok(())
    }

    /// Stores a copy of a graph under a new id.
    ///
    /// The copy is built from the sanitized graph, so it never carries
    /// parts the original would drop on load.
    pub async fn duplicate(&self, id: GraphId) -> Result<GraphId> {
        let mut graph = self.load(id).await?;
        graph.id = None;
        graph.name.push_str(COPY_SUFFIX);

        let copy_id = self.save(&graph).await?;
        tracing::info!(
            target: TRACING_TARGET_PERSIST,
            graph_id = %id,
            copy_id = %copy_id,
            "Graph duplicated"
        );
        Ok(copy_id)
    }
}
