//! Records exchanged with the graph store.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::GraphId;

/// Listing entry for a stored graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSummary {
    /// Graph id.
    pub id: GraphId,
    /// Display name.
    pub name: String,
    /// Last write time.
    pub updated_at: Timestamp,
}

/// A stored graph together with its raw document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredGraph {
    /// Graph id.
    pub id: GraphId,
    /// Display name.
    pub name: String,
    /// Serialized graph document.
    pub document: Value,
}

/// Payload of a create or update call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    /// Display name.
    pub name: String,
    /// Serialized graph document.
    pub document: Value,
}

impl GraphRecord {
    /// Creates a new record.
    pub fn new(name: impl Into<String>, document: Value) -> Self {
        Self {
            name: name.into(),
            document,
        }
    }
}
