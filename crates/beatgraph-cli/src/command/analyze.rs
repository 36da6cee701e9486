//! `analyze`.

use beatgraph_runtime::document::{SanitizeReport, sanitize};
use beatgraph_runtime::registry::Registry;
use beatgraph_runtime::schedule::{RhythmAnalysis, Schedule, topological_order};
use serde::Serialize;

use super::{print_json, read_document};
use crate::TRACING_TARGET_COMMAND;
use crate::config::AnalyzeArgs;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Analysis {
    sanitized: SanitizeReport,
    schedule: Schedule,
    rhythm: RhythmAnalysis,
}

/// Prints the schedule and rhythm of a document.
pub async fn analyze(args: &AnalyzeArgs) -> anyhow::Result<()> {
    let document = read_document(&args.document).await?;
    let (graph, sanitized) = sanitize(&document, &Registry::builtin());

    let schedule = topological_order(&graph);
    let rhythm = RhythmAnalysis::from_schedule(&graph, &schedule);
    for warning in &rhythm.warnings {
        tracing::warn!(target: TRACING_TARGET_COMMAND, "{warning}");
    }

    print_json(&Analysis {
        sanitized,
        schedule,
        rhythm,
    })
}
