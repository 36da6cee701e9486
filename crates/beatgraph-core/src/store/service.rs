//! Graph store wrapper with observability.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use super::{GraphRecord, GraphStoreProvider, GraphSummary, StoredGraph};
use crate::{GraphId, Result, TRACING_TARGET_STORE};

/// Graph store wrapper with observability.
///
/// Every call is logged with its elapsed time; failures are logged at
/// `error` and propagated unchanged.
#[derive(Clone)]
pub struct GraphStore {
    inner: Arc<dyn GraphStoreProvider>,
}

impl fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphStore").finish_non_exhaustive()
    }
}

fn log_outcome<T>(operation: &'static str, started_at: Instant, result: &Result<T>) {
    let elapsed_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => tracing::debug!(
            target: TRACING_TARGET_STORE,
            operation,
            elapsed_ms,
            "Graph store call succeeded"
        ),
        Err(error) => tracing::error!(
            target: TRACING_TARGET_STORE,
            operation,
            error = %error,
            elapsed_ms,
            "Graph store call failed"
        ),
    }
}

impl GraphStore {
    /// Create a new graph store wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: GraphStoreProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Create a graph store from an already shared provider.
    pub fn from_arc(provider: Arc<dyn GraphStoreProvider>) -> Self {
        Self { inner: provider }
    }

    /// Lists every stored graph.
    pub async fn list(&self) -> Result<Vec<GraphSummary>> {
        let started_at = Instant::now();
        let result = self.inner.list().await;
        log_outcome("list", started_at, &result);
        result
    }

    /// Fetches a stored graph.
    pub async fn get(&self, id: GraphId) -> Result<StoredGraph> {
        let started_at = Instant::now();
        let result = self.inner.get(id).await;
        log_outcome("get", started_at, &result);
        result
    }

    /// Inserts a new graph.
    pub async fn create(&self, record: &GraphRecord) -> Result<GraphId> {
        let started_at = Instant::now();
        let result = self.inner.create(record).await;
        log_outcome("create", started_at, &result);
        result
    }

    /// Updates an existing graph.
    pub async fn update(&self, id: GraphId, record: &GraphRecord) -> Result<GraphId> {
        let started_at = Instant::now();
        let result = self.inner.update(id, record).await;
        log_outcome("update", started_at, &result);
        result
    }

    /// Deletes a graph.
    pub async fn delete(&self, id: GraphId) -> Result<()> {
        let started_at = Instant::now();
        let result = self.inner.delete(id).await;
        log_outcome("delete", started_at, &result);
        result
    }
}
