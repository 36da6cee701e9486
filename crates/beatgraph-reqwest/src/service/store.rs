//! Graph store implementation.

use beatgraph_core::{
    GraphId, GraphRecord, GraphStoreProvider, GraphSummary, Result, StoredGraph,
};
use serde::Deserialize;

use crate::ReqwestClient;

/// Body returned when a graph is created.
#[derive(Debug, Deserialize)]
struct Created {
    id: GraphId,
}

#[async_trait::async_trait]
impl GraphStoreProvider for ReqwestClient {
    async fn list(&self) -> Result<Vec<GraphSummary>> {
        let url = self.endpoint(&["graphs"])?;
        let summaries = self.send_json(self.http().get(url)).await?;
        Ok(summaries)
    }

    async fn get(&self, id: GraphId) -> Result<StoredGraph> {
        let url = self.endpoint(&["graphs", &id.to_string()])?;
        let stored = self.send_json(self.http().get(url)).await?;
        Ok(stored)
    }

    async fn create(&self, record: &GraphRecord) -> Result<GraphId> {
        let url = self.endpoint(&["graphs"])?;
        let created: Created = self.send_json(self.http().post(url).json(record)).await?;
        Ok(created.id)
    }

    async fn update(&self, id: GraphId, record: &GraphRecord) -> Result<GraphId> {
        let url = self.endpoint(&["graphs", &id.to_string()])?;
        self.send_empty(self.http().put(url).json(record)).await?;
        Ok(id)
    }

    async fn delete(&self, id: GraphId) -> Result<()> {
        let url = self.endpoint(&["graphs", &id.to_string()])?;
        self.send_empty(self.http().delete(url)).await?;
        Ok(())
    }
}
