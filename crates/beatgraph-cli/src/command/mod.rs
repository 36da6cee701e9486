//! Command implementations.
//!
//! Every command prints its result to stdout as pretty JSON.

mod analyze;
mod catalog;
mod execute;

use std::path::Path;

use anyhow::Context;
use beatgraph_runtime::document::GraphDocument;
use serde::Serialize;

pub use self::analyze::analyze;
pub use self::catalog::{candidates, kinds};
pub use self::execute::execute;

/// Reads and parses a graph document.
async fn read_document(path: &Path) -> anyhow::Result<GraphDocument> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a graph document", path.display()))
}

/// Prints `value` to stdout as pretty JSON.
fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn test_read_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"nodes": [{{"id": "0190a5d4-0000-7000-8000-000000000001", "kind": "prompt"}}]}}"#
        )
        .unwrap();

        let document = read_document(file.path()).await.unwrap();
        assert_eq!(document.nodes.len(), 1);
        assert!(document.edges.is_empty());
    }

    #[tokio::test]
    async fn test_read_document_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let error = read_document(file.path()).await.unwrap_err();
        assert!(error.to_string().contains("is not a graph document"));
    }
}
