//! In-memory graph stores for testing.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use beatgraph_core::{
    Error, GraphId, GraphRecord, GraphStoreProvider, GraphSummary, Result, StoredGraph,
};
use jiff::Timestamp;
use serde_json::Value;

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    document: Value,
    updated_at: Timestamp,
}

impl Entry {
    fn new(record: &GraphRecord) -> Self {
        Self {
            name: record.name.clone(),
            document: record.document.clone(),
            updated_at: Timestamp::now(),
        }
    }
}

/// Graph store keeping every graph in memory.
///
/// Graphs are listed in creation order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraphStore {
    graphs: Arc<Mutex<BTreeMap<GraphId, Entry>>>,
    latency: Duration,
}

impl InMemoryGraphStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Returns the number of stored graphs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<GraphId, Entry>> {
        self.graphs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn missing(id: GraphId) -> Error {
    Error::not_found().with_message(format!("graph {id} does not exist"))
}

#[async_trait::async_trait]
impl GraphStoreProvider for InMemoryGraphStore {
    async fn list(&self) -> Result<Vec<GraphSummary>> {
        self.delay().await;
        let summaries = self
            .lock()
            .iter()
            .map(|(id, entry)| GraphSummary {
                id: *id,
                name: entry.name.clone(),
                updated_at: entry.updated_at,
            })
            .collect();
        Ok(summaries)
    }

    async fn get(&self, id: GraphId) -> Result<StoredGraph> {
        self.delay().await;
        let graphs = self.lock();
        let entry = graphs.get(&id).ok_or_else(|| missing(id))?;
        Ok(StoredGraph {
            id,
            name: entry.name.clone(),
            document: entry.document.clone(),
        })
    }

    async fn create(&self, record: &GraphRecord) -> Result<GraphId> {
        self.delay().await;
        let id = GraphId::new();
        self.lock().insert(id, Entry::new(record));
        Ok(id)
    }

    async fn update(&self, id: GraphId, record: &GraphRecord) -> Result<GraphId> {
        self.delay().await;
        let mut graphs = self.lock();
        let entry = graphs.get_mut(&id).ok_or_else(|| missing(id))?;
        *entry = Entry::new(record);
        Ok(id)
    }

    async fn delete(&self, id: GraphId) -> Result<()> {
        self.delay().await;
        self.lock().remove(&id).map(|_| ()).ok_or_else(|| missing(id))
    }
}

/// Graph store whose every call fails with a service-unavailable error.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingGraphStore;

fn unavailable() -> Error {
    Error::service_unavailable().with_message("mock graph store is down")
}

#[async_trait::async_trait]
impl GraphStoreProvider for FailingGraphStore {
    async fn list(&self) -> Result<Vec<GraphSummary>> {
        Err(unavailable())
    }

    async fn get(&self, _id: GraphId) -> Result<StoredGraph> {
        Err(unavailable())
    }

    async fn create(&self, _record: &GraphRecord) -> Result<GraphId> {
        Err(unavailable())
    }

    async fn update(&self, _id: GraphId, _record: &GraphRecord) -> Result<GraphId> {
        Err(unavailable())
    }

    async fn delete(&self, _id: GraphId) -> Result<()> {
        Err(unavailable())
    }
}
