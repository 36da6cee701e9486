//! `execute`.

use std::collections::HashSet;

use anyhow::Context;
use beatgraph_core::{NodeId, RunStatus};
use beatgraph_reqwest::ReqwestClient;
use beatgraph_runtime::document::{self, sanitize};
use beatgraph_runtime::graph::{GraphEvent, GraphSession};
use beatgraph_runtime::registry::Registry;
use beatgraph_runtime::run::{Run, RunTracker, Submission};
use tokio::sync::broadcast::error::RecvError;

use super::{print_json, read_document};
use crate::TRACING_TARGET_COMMAND;
use crate::config::ExecuteArgs;

/// Runs the selected nodes and prints their final runs.
pub async fn execute(args: ExecuteArgs) -> anyhow::Result<()> {
    let document = read_document(&args.document).await?;
    let (graph, report) = sanitize(&document, &Registry::builtin());
    if !report.is_clean() {
        tracing::warn!(
            target: TRACING_TARGET_COMMAND,
            dropped_nodes = report.dropped_nodes,
            dropped_edges = report.dropped_edges,
            "Document needed cleanup"
        );
    }

    let client = ReqwestClient::new(args.http).context("failed to create HTTP client")?;
    let session = GraphSession::new(graph);
    let tracker = RunTracker::new(client.into_job_service(), session.clone(), args.run);
    if !args.skip_health_check {
        let health = tracker
            .check_health()
            .await
            .context("job service is not ready")?;
        tracing::info!(
            target: TRACING_TARGET_COMMAND,
            status = ?health.status,
            response = ?health.response,
            "Job service reachable"
        );
    }
    let mut events = session.subscribe();

    let mut pending = HashSet::new();
    let mut rejected = 0;
    for (node_id, result) in tracker.submit_many(None, &args.nodes).await {
        match result {
            Ok(Submission::Accepted(run_id)) => {
                tracing::info!(
                    target: TRACING_TARGET_COMMAND,
                    node_id = %node_id,
                    run_id = %run_id,
                    "Node submitted"
                );
                pending.insert(node_id);
            }
            Ok(Submission::Skipped(reason)) => {
                tracing::warn!(
                    target: TRACING_TARGET_COMMAND,
                    node_id = %node_id,
                    reason = %reason,
                    "Node skipped"
                );
            }
            Err(error) => {
                rejected += 1;
                tracing::error!(
                    target: TRACING_TARGET_COMMAND,
                    node_id = %node_id,
                    error = %error,
                    "Node submission failed"
                );
            }
        }
    }

    retain_unfinished(&tracker, &mut pending).await;
    while !pending.is_empty() {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for ctrl-c")?;
                tracker.cancel_all().await;
                anyhow::bail!("interrupted with {} run(s) unfinished", pending.len());
            }
            event = events.recv() => match event {
                Ok(GraphEvent::RunStatusChanged { node_id, status, .. }) if status.is_terminal() => {
                    pending.remove(&node_id);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => retain_unfinished(&tracker, &mut pending).await,
                Err(RecvError::Closed) => break,
            },
        }
    }

    let mut runs: Vec<Run> = Vec::new();
    for node_id in &args.nodes {
        if let Some(run) = tracker.run(*node_id).await {
            runs.push(run);
        }
    }
    print_json(&runs)?;

    if args.write {
        let graph = session.snapshot().await;
        let json = serde_json::to_string_pretty(&document::serialize(&graph))
            .context("failed to encode document")?;
        tokio::fs::write(&args.document, json)
            .await
            .with_context(|| format!("failed to write {}", args.document.display()))?;
        tracing::info!(
            target: TRACING_TARGET_COMMAND,
            document = %args.document.display(),
            "Document updated"
        );
    }

    let failed = runs
        .iter()
        .filter(|run| run.status == RunStatus::Failed)
        .count()
        + rejected;
    if failed > 0 {
        anyhow::bail!("{failed} of {} node(s) failed", args.nodes.len());
    }
    Ok(())
}

/// Drops nodes whose run already finished or is no longer tracked.
async fn retain_unfinished(tracker: &RunTracker, pending: &mut HashSet<NodeId>) {
    let mut finished = Vec::new();
    for node_id in pending.iter() {
        let done = tracker.run(*node_id).await.is_none_or(|run| run.is_terminal());
        if done {
            finished.push(*node_id);
        }
    }
    for node_id in finished {
        pending.remove(&node_id);
    }
}
