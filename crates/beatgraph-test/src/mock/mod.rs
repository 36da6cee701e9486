//! Mock implementations of the beatgraph backends for testing.
//!
//! This module provides implementations of the job service and graph store
//! contracts defined in beatgraph-core. They need no network and are useful
//! for unit and integration testing.

mod job;
mod store;

use beatgraph_core::{GraphStore, JobService};
pub use job::{MOCK_ASSET_BASE_URL, MockJobConfig, MockJobProvider};
pub use store::{FailingGraphStore, InMemoryGraphStore};

/// Creates a mock job service and an empty in-memory graph store.
pub fn create_mock_services() -> (JobService, GraphStore) {
    (
        JobService::new(MockJobProvider::default()),
        GraphStore::new(InMemoryGraphStore::default()),
    )
}
