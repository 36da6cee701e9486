//! The per-run status loop.

use beatgraph_core::{JobStatusReport, NodeId, RunId, RunStatus};
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

use super::Run;
use super::tracker::Shared;
use crate::TRACING_TARGET_RUN;
use crate::graph::{GraphEvent, NodeData};
use crate::registry::ASSET_URL_KEY;

/// Whether the node behind a run can still be polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Active,
    Disabled,
    Missing,
    /// The graph the run was submitted from has been replaced.
    Replaced,
}

impl Presence {
    /// Whether the run should be forgotten once polling stops.
    fn forgets_run(self) -> bool {
        matches!(self, Self::Missing | Self::Replaced)
    }
}

/// Polls one run until it finishes, is superseded or cancelled, or its
/// node goes away.
pub(super) async fn poll_run(
    shared: Shared,
    mut events: broadcast::Receiver<GraphEvent>,
    node_id: NodeId,
    run_id: RunId,
    generation: u64,
    token: CancellationToken,
) {
    let interval = shared.config.poll_interval();
    let limit = shared.config.max_poll_duration();
    let deadline = limit.map(|limit| Instant::now() + limit);

    tracing::debug!(
        target: TRACING_TARGET_RUN,
        node_id = %node_id,
        run_id = %run_id,
        interval_ms = interval.as_millis(),
        "Polling started"
    );

    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => {
                tracing::debug!(target: TRACING_TARGET_RUN, run_id = %run_id, "Polling stopped");
                return;
            }
            () = halted(&mut events, node_id) => {
                release(&shared, node_id, &run_id, generation, &token).await;
                return;
            }
            () = sleep(interval) => {}
        }

        if presence(&shared, node_id, generation).await != Presence::Active {
            release(&shared, node_id, &run_id, generation, &token).await;
            return;
        }

        if let (Some(deadline), Some(limit)) = (deadline, limit)
            && Instant::now() >= deadline
        {
            tracing::warn!(
                target: TRACING_TARGET_RUN,
                node_id = %node_id,
                run_id = %run_id,
                limit_secs = limit.as_secs(),
                "Run timed out"
            );
            let report =
                JobStatusReport::failed(format!("no result after {}s", limit.as_secs()));
            record(&shared, node_id, &run_id, &token, &report).await;
            token.cancel();
            return;
        }

        let checked = tokio::select! {
            biased;
            () = token.cancelled() => return,
            checked = shared.jobs.status(&run_id) => checked,
        };

        // Failed checks are logged by the job service and retried next tick.
        let Ok(report) = checked else {
            continue;
        };

        record(&shared, node_id, &run_id, &token, &report).await;
        if report.status.is_terminal() {
            token.cancel();
            return;
        }
    }
}

/// Resolves once an event ends polling for `node_id`.
async fn halted(events: &mut broadcast::Receiver<GraphEvent>, node_id: NodeId) {
    loop {
        match events.recv().await {
            Ok(event) if event.halts_runs_for(node_id) => return,
            Ok(_) => {}
            // Missed events are covered by the presence check on every tick.
            Err(RecvError::Lagged(skipped)) => {
                tracing::trace!(target: TRACING_TARGET_RUN, skipped, "Event receiver lagged");
            }
            Err(RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}

async fn presence(shared: &Shared, node_id: NodeId, generation: u64) -> Presence {
    shared
        .session
        .read(|graph| {
            if shared.session.generation() != generation {
                return Presence::Replaced;
            }
            match graph.node(node_id) {
                Some(node) if node.disabled => Presence::Disabled,
                Some(_) => Presence::Active,
                None => Presence::Missing,
            }
        })
        .await
}

/// Stops polling, forgetting the run if its node or graph is gone.
///
/// A disabled node keeps its last known run.
async fn release(
    shared: &Shared,
    node_id: NodeId,
    run_id: &RunId,
    generation: u64,
    token: &CancellationToken,
) {
    token.cancel();

    let presence = presence(shared, node_id, generation).await;
    let forget = presence.forgets_run();
    if forget {
        let mut table = shared.table.write().await;
        if table
            .get(&node_id)
            .is_some_and(|entry| entry.run.borrow().id == *run_id)
        {
            table.remove(&node_id);
        }
    }

    tracing::debug!(
        target: TRACING_TARGET_RUN,
        node_id = %node_id,
        run_id = %run_id,
        presence = ?presence,
        forgotten = forget,
        "Polling halted by graph change"
    );
}

/// Applies a report to the tracked run, unless the run was superseded.
///
/// On completion the asset is written into the node data once, through
/// the session.
async fn record(
    shared: &Shared,
    node_id: NodeId,
    run_id: &RunId,
    token: &CancellationToken,
    report: &JobStatusReport,
) -> Option<Run> {
    let updated = {
        let table = shared.table.read().await;
        let entry = table.get(&node_id)?;
        if token.is_cancelled() || entry.run.borrow().id != *run_id {
            tracing::trace!(
                target: TRACING_TARGET_RUN,
                run_id = %run_id,
                "Discarding result of superseded run"
            );
            return None;
        }

        if !entry.run.send_if_modified(|run| run.apply(report)) {
            return None;
        }
        entry.run.borrow().clone()
    };

    tracing::info!(
        target: TRACING_TARGET_RUN,
        node_id = %node_id,
        run_id = %run_id,
        status = %updated.status,
        "Run status changed"
    );

    if updated.status == RunStatus::Completed {
        match &updated.asset_url {
            Some(asset_url) => {
                let mut partial = NodeData::new();
                partial.insert(ASSET_URL_KEY.to_owned(), Value::String(asset_url.clone()));
                shared.session.update_node_data(node_id, partial).await;
            }
            None => tracing::warn!(
                target: TRACING_TARGET_RUN,
                node_id = %node_id,
                run_id = %run_id,
                "Run completed without an asset"
            ),
        }
    }

    shared.emit_status(&updated);
    Some(updated)
}
