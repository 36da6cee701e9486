//! Run submission and observation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use beatgraph_core::{
    Error, GraphId, JobRequest, JobService, NodeId, Result, RunId, ServiceHealth, ServiceStatus,
};
use futures::future::join_all;
use serde::Serialize;
use strum::{AsRefStr, Display};
use tokio::sync::{RwLock, watch};
use tokio_util::sync::CancellationToken;

use super::{NodeRunState, Run, RunConfig, poll, resolve_inputs};
use crate::TRACING_TARGET_RUN;
use crate::graph::{Graph, GraphEvent, GraphSession, NodeData};

/// Outcome of a submission request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The job service accepted the node; its run is being tracked.
    Accepted(RunId),
    /// The node is not eligible; the job service was not called.
    Skipped(SkipReason),
}

impl Submission {
    /// Returns the run id if the submission was accepted.
    pub fn run_id(&self) -> Option<&RunId> {
        match self {
            Self::Accepted(run_id) => Some(run_id),
            Self::Skipped(_) => None,
        }
    }
}

/// Why a node was not submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[derive(AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// The node does not exist.
    MissingNode,
    /// The node is disabled.
    Disabled,
    /// The node's kind does not run on the job service.
    NotExecutable,
}

/// Latest run of a node and the token stopping its polling.
pub(super) struct NodeEntry {
    pub(super) run: watch::Sender<Run>,
    pub(super) token: CancellationToken,
}

pub(super) type RunTable = Arc<RwLock<HashMap<NodeId, NodeEntry>>>;

/// State shared between the tracker and its poll loops.
#[derive(Clone)]
pub(super) struct Shared {
    pub(super) jobs: JobService,
    pub(super) session: GraphSession,
    pub(super) config: RunConfig,
    pub(super) table: RunTable,
}

impl Shared {
    /// Broadcasts the current state of a run.
    pub(super) fn emit_status(&self, run: &Run) {
        self.session.emit(GraphEvent::RunStatusChanged {
            node_id: run.node_id,
            run_id: run.id.clone(),
            status: run.status,
            asset_url: run.asset_url.clone(),
            error: run.error.clone(),
        });
    }
}

/// Tracks the run of every submitted node.
///
/// Each node has at most one tracked run: submitting again supersedes the
/// previous run, whose polling stops and whose late results are ignored.
/// Polling for a node is a single sequential loop, so at most one status
/// check per node is in flight. Dropping the last handle stops all polling.
#[derive(Clone)]
pub struct RunTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    shared: Shared,
    root: CancellationToken,
}

impl Drop for TrackerInner {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

impl fmt::Debug for RunTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunTracker")
            .field("config", &self.inner.shared.config)
            .finish_non_exhaustive()
    }
}

impl RunTracker {
    /// Creates a tracker submitting to `jobs` and writing results into
    /// `session`.
    pub fn new(jobs: JobService, session: GraphSession, config: RunConfig) -> Self {
        tracing::debug!(
            target: TRACING_TARGET_RUN,
            poll_interval_ms = config.poll_interval().as_millis(),
            max_poll_secs = config.max_poll_secs,
            "Run tracker initialized"
        );

        Self {
            inner: Arc::new(TrackerInner {
                shared: Shared {
                    jobs,
                    session,
                    config,
                    table: RunTable::default(),
                },
                root: CancellationToken::new(),
            }),
        }
    }

    /// Returns the tracker configuration.
    pub fn config(&self) -> &RunConfig {
        &self.inner.shared.config
    }

    /// Checks that the job service can take submissions.
    ///
    /// A degraded service is logged and accepted. An unhealthy one fails
    /// with a service-unavailable error.
    pub async fn check_health(&self) -> Result<ServiceHealth> {
        let health = self.inner.shared.jobs.health_check().await?;
        let message = health.message.as_deref().unwrap_or("no details");

        match health.status {
            ServiceStatus::Healthy => {}
            ServiceStatus::Degraded => {
                tracing::warn!(
                    target: TRACING_TARGET_RUN,
                    detail = message,
                    "Job service is degraded"
                );
            }
            ServiceStatus::Unhealthy => {
                return Err(Error::service_unavailable()
                    .with_message(format!("job service is unhealthy: {message}")));
            }
        }

        Ok(health)
    }

    /// Submits a node for execution.
    ///
    /// Ineligible nodes are skipped without calling the job service. When
    /// the service rejects the submission the error is returned and nothing
    /// is recorded, so the node keeps its previous state.
    pub async fn submit(&self, graph_id: Option<GraphId>, node_id: NodeId) -> Result<Submission> {
        let shared = &self.inner.shared;
        let generation = shared.session.generation();
        let prepared = shared.session.read(|graph| prepare(graph, node_id)).await;
        let (kind, inputs) = match prepared {
            Ok(prepared) => prepared,
            Err(reason) => {
                tracing::debug!(
                    target: TRACING_TARGET_RUN,
                    node_id = %node_id,
                    reason = %reason,
                    "Node skipped"
                );
                return Ok(Submission::Skipped(reason));
            }
        };

        let request = JobRequest::new(graph_id, node_id, kind).with_inputs(inputs);
        let accepted = shared.jobs.submit(&request).await?;

        let still_present = shared
            .session
            .read(|graph| {
                shared.session.generation() == generation && graph.contains_node(node_id)
            })
            .await;
        if !still_present {
            tracing::debug!(
                target: TRACING_TARGET_RUN,
                node_id = %node_id,
                run_id = %accepted.run_id,
                "Node removed or graph replaced during submission, run not tracked"
            );
            return Ok(Submission::Accepted(accepted.run_id));
        }

        let run = Run::new(accepted.run_id.clone(), node_id, accepted.status);
        let token = self.inner.root.child_token();
        {
            let mut table = shared.table.write().await;
            match table.get_mut(&node_id) {
                Some(entry) => {
                    entry.token.cancel();
                    entry.token = token.clone();
                    entry.run.send_replace(run.clone());
                    tracing::debug!(
                        target: TRACING_TARGET_RUN,
                        node_id = %node_id,
                        run_id = %run.id,
                        "Previous run superseded"
                    );
                }
                None => {
                    let (sender, _) = watch::channel(run.clone());
                    table.insert(
                        node_id,
                        NodeEntry {
                            run: sender,
                            token: token.clone(),
                        },
                    );
                }
            }
        }

        shared.emit_status(&run);

        if run.is_terminal() {
            token.cancel();
        } else {
            let events = shared.session.subscribe();
            tokio::spawn(poll::poll_run(
                shared.clone(),
                events,
                node_id,
                run.id.clone(),
                generation,
                token,
            ));
        }

        Ok(Submission::Accepted(run.id))
    }

    /// Submits several nodes concurrently, each independently of the others.
    ///
    /// Results are returned in the order of `node_ids`.
    pub async fn submit_many(
        &self,
        graph_id: Option<GraphId>,
        node_ids: &[NodeId],
    ) -> Vec<(NodeId, Result<Submission>)> {
        let submissions = node_ids.iter().map(|node_id| async move {
            (*node_id, self.submit(graph_id, *node_id).await)
        });
        join_all(submissions).await
    }

    /// Stops polling a node. Returns whether polling was active.
    ///
    /// The run keeps its last known status.
    pub async fn cancel(&self, node_id: NodeId) -> bool {
        let table = self.inner.shared.table.read().await;
        let Some(entry) = table.get(&node_id) else {
            return false;
        };

        let active = !entry.token.is_cancelled();
        entry.token.cancel();
        if active {
            tracing::debug!(target: TRACING_TARGET_RUN, node_id = %node_id, "Polling cancelled");
        }
        active
    }

    /// Stops polling every node.
    pub async fn cancel_all(&self) {
        let table = self.inner.shared.table.read().await;
        for entry in table.values() {
            entry.token.cancel();
        }
        tracing::debug!(
            target: TRACING_TARGET_RUN,
            node_count = table.len(),
            "All polling cancelled"
        );
    }

    /// Returns the execution state of a node.
    pub async fn state(&self, node_id: NodeId) -> NodeRunState {
        self.run(node_id)
            .await
            .map(|run| run.state())
            .unwrap_or_default()
    }

    /// Returns the latest run of a node.
    pub async fn run(&self, node_id: NodeId) -> Option<Run> {
        let table = self.inner.shared.table.read().await;
        table.get(&node_id).map(|entry| entry.run.borrow().clone())
    }

    /// Returns whether a status loop is running for a node.
    pub async fn is_polling(&self, node_id: NodeId) -> bool {
        let table = self.inner.shared.table.read().await;
        table
            .get(&node_id)
            .is_some_and(|entry| !entry.token.is_cancelled() && !entry.run.borrow().is_terminal())
    }

    /// Subscribes to the latest run of a node.
    ///
    /// The receiver follows later submissions of the same node too.
    /// Returns `None` if the node has never been submitted.
    pub async fn watch(&self, node_id: NodeId) -> Option<watch::Receiver<Run>> {
        let table = self.inner.shared.table.read().await;
        table.get(&node_id).map(|entry| entry.run.subscribe())
    }
}

/// Checks eligibility and resolves the job kind and inputs.
fn prepare(graph: &Graph, node_id: NodeId) -> Result<(String, NodeData), SkipReason> {
    let node = graph.node(node_id).ok_or(SkipReason::MissingNode)?;
    if node.disabled {
        return Err(SkipReason::Disabled);
    }
    if !node.definition().executable {
        return Err(SkipReason::NotExecutable);
    }

    let inputs = resolve_inputs(graph, node_id).ok_or(SkipReason::MissingNode)?;
    Ok((node.kind.to_string(), inputs))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use beatgraph_core::{ErrorKind, JobStatusReport, RunStatus};
    use beatgraph_test::MockJobProvider;
    use serde_json::json;
    use tokio::sync::broadcast;

    use super::*;
    use crate::graph::Position;
    use crate::registry::{ASSET_URL_KEY, NodeKindId};
    use crate::run::RunConfigBuilder;

    const INTERVAL: Duration = Duration::from_secs(2);

    async fn setup(provider: &MockJobProvider) -> (RunTracker, GraphSession, NodeId, NodeId) {
        let session = GraphSession::default();
        let mut data = NodeData::new();
        data.insert("text".into(), json!("storm over the sea"));
        let prompt = session
            .add_node_with_data(NodeKindId::Prompt, Position::default(), data)
            .await;
        let video = session
            .add_node(NodeKindId::TextToVideo, Position::default())
            .await;
        session.connect(prompt, "prompt", video, "prompt").await.unwrap();

        let tracker = RunTracker::new(
            JobService::new(provider.clone()),
            session.clone(),
            RunConfig::default(),
        );
        (tracker, session, prompt, video)
    }

    /// Lets spawned loops run until they block on time or a lock.
    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    fn asset_writes(events: &mut broadcast::Receiver<GraphEvent>) -> usize {
        let mut writes = 0;
        while let Ok(event) = events.try_recv() {
            if let GraphEvent::NodeDataChanged { partial, .. } = event
                && partial.contains_key(ASSET_URL_KEY)
            {
                writes += 1;
            }
        }
        writes
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_run_writes_asset_once() {
        let provider = MockJobProvider::new()
            .with_status(JobStatusReport::pending(RunStatus::Processing))
            .with_status(JobStatusReport::pending(RunStatus::Processing))
            .with_status(JobStatusReport::completed("https://cdn/x.mp4"));
        let (tracker, session, _, video) = setup(&provider).await;
        let mut events = session.subscribe();

        let submission = tracker.submit(None, video).await.unwrap();
        assert!(submission.run_id().is_some());
        assert_eq!(tracker.state(video).await, NodeRunState::Queued);

        for _ in 0..3 {
            tokio::time::sleep(INTERVAL).await;
            settle().await;
        }

        assert_eq!(tracker.state(video).await, NodeRunState::Completed);
        assert_eq!(provider.status_count(), 3);
        let data = session.read(|graph| graph.node(video).unwrap().data.clone()).await;
        assert_eq!(data[ASSET_URL_KEY], json!("https://cdn/x.mp4"));

        tokio::time::sleep(INTERVAL * 5).await;
        settle().await;
        assert_eq!(provider.status_count(), 3);
        assert!(!tracker.is_polling(video).await);
        assert_eq!(asset_writes(&mut events), 1);
    }

    #[tokio::test]
    async fn test_check_health() {
        let provider = MockJobProvider::new();
        let (tracker, ..) = setup(&provider).await;
        assert!(tracker.check_health().await.is_ok());

        let provider = MockJobProvider::new().with_health(ServiceHealth::degraded("backlog"));
        let (tracker, ..) = setup(&provider).await;
        assert_eq!(
            tracker.check_health().await.unwrap().status,
            ServiceStatus::Degraded
        );

        let provider = MockJobProvider::new().with_health(ServiceHealth::unhealthy("maintenance"));
        let (tracker, ..) = setup(&provider).await;
        let error = tracker.check_health().await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(provider.submit_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inputs_include_upstream_values() {
        let provider = MockJobProvider::new();
        let (tracker, _, _, video) = setup(&provider).await;

        tracker.submit(None, video).await.unwrap();

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].node_kind, "text_to_video");
        assert_eq!(requests[0].inputs["prompt"], json!("storm over the sea"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_resolves_prompt_through_splitter() {
        let provider = MockJobProvider::new();
        let (tracker, session, prompt, _) = setup(&provider).await;
        let splitter = session
            .add_node(NodeKindId::PromptSplitter, Position::default())
            .await;
        let image = session
            .add_node(NodeKindId::ImageGenerator, Position::default())
            .await;
        session.connect(prompt, "prompt", splitter, "prompt").await.unwrap();
        session.connect(splitter, "prompt", image, "prompt").await.unwrap();

        tracker.submit(None, image).await.unwrap();

        let requests = provider.requests();
        assert_eq!(requests[0].node_kind, "image_generator");
        assert_eq!(requests[0].inputs["prompt"], json!("storm over the sea"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ineligible_nodes_are_skipped() {
        let provider = MockJobProvider::new();
        let (tracker, session, prompt, video) = setup(&provider).await;
        session.set_node_disabled(video, true).await;

        assert_eq!(
            tracker.submit(None, prompt).await.unwrap(),
            Submission::Skipped(SkipReason::NotExecutable)
        );
        assert_eq!(
            tracker.submit(None, video).await.unwrap(),
            Submission::Skipped(SkipReason::Disabled)
        );
        assert_eq!(
            tracker.submit(None, NodeId::new()).await.unwrap(),
            Submission::Skipped(SkipReason::MissingNode)
        );
        assert_eq!(provider.submit_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_submission_leaves_node_idle() {
        let provider = MockJobProvider::new().with_failing_submit();
        let (tracker, _, _, video) = setup(&provider).await;

        let error = tracker.submit(None, video).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(tracker.state(video).await, NodeRunState::Idle);
        assert!(tracker.run(video).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_run_keeps_error_on_run_only() {
        let provider = MockJobProvider::new().with_status(JobStatusReport::failed("quota"));
        let (tracker, session, _, video) = setup(&provider).await;

        tracker.submit(None, video).await.unwrap();
        tokio::time::sleep(INTERVAL).await;
        settle().await;

        let run = tracker.run(video).await.unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.error.as_deref(), Some("quota"));
        let data = session.read(|graph| graph.node(video).unwrap().data.clone()).await;
        assert!(data.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_errors_are_retried_next_tick() {
        let provider = MockJobProvider::new()
            .with_status_error()
            .with_status(JobStatusReport::completed("https://cdn/y.mp4"));
        let (tracker, _, _, video) = setup(&provider).await;

        tracker.submit(None, video).await.unwrap();
        tokio::time::sleep(INTERVAL).await;
        settle().await;
        assert_eq!(tracker.state(video).await, NodeRunState::Queued);

        tokio::time::sleep(INTERVAL).await;
        settle().await;
        assert_eq!(tracker.state(video).await, NodeRunState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_checks_never_overlap() {
        let provider = MockJobProvider::new()
            .with_status_delay(Duration::from_secs(5))
            .with_status(JobStatusReport::pending(RunStatus::Processing));
        let (tracker, _, _, video) = setup(&provider).await;

        tracker.submit(None, video).await.unwrap();
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_secs(1)).await;
            settle().await;
        }

        assert!(provider.status_count() >= 2);
        assert_eq!(provider.max_in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removing_node_stops_polling() {
        let provider = MockJobProvider::new().with_status(JobStatusReport::pending(RunStatus::Processing));
        let (tracker, session, _, video) = setup(&provider).await;

        tracker.submit(None, video).await.unwrap();
        tokio::time::sleep(INTERVAL).await;
        settle().await;
        let checks = provider.status_count();

        session.remove_node(video).await.unwrap();
        settle().await;
        tokio::time::sleep(INTERVAL * 3).await;
        settle().await;

        assert_eq!(provider.status_count(), checks);
        assert_eq!(tracker.state(video).await, NodeRunState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacing_graph_stops_polling() {
        let provider = MockJobProvider::new().with_status(JobStatusReport::pending(RunStatus::Processing));
        let (tracker, session, _, video) = setup(&provider).await;

        tracker.submit(None, video).await.unwrap();
        tokio::time::sleep(INTERVAL).await;
        settle().await;
        assert_eq!(provider.status_count(), 1);

        session.replace(Graph::new("another")).await;
        settle().await;
        tokio::time::sleep(INTERVAL * 5).await;
        settle().await;

        assert_eq!(provider.status_count(), 1);
        assert!(!tracker.is_polling(video).await);
        assert_eq!(tracker.state(video).await, NodeRunState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reloading_same_graph_forgets_runs() {
        let provider = MockJobProvider::new().with_status(JobStatusReport::pending(RunStatus::Processing));
        let (tracker, session, _, video) = setup(&provider).await;

        tracker.submit(None, video).await.unwrap();
        tokio::time::sleep(INTERVAL).await;
        settle().await;

        let reloaded = session.snapshot().await;
        session.replace(reloaded).await;
        settle().await;
        tokio::time::sleep(INTERVAL * 3).await;
        settle().await;

        assert!(session.read(|graph| graph.contains_node(video)).await);
        assert_eq!(provider.status_count(), 1);
        assert_eq!(tracker.state(video).await, NodeRunState::Idle);
        assert!(tracker.run(video).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabling_node_stops_polling() {
        let provider = MockJobProvider::new().with_status(JobStatusReport::pending(RunStatus::Processing));
        let (tracker, session, _, video) = setup(&provider).await;

        tracker.submit(None, video).await.unwrap();
        session.set_node_disabled(video, true).await;
        settle().await;
        tokio::time::sleep(INTERVAL * 3).await;
        settle().await;

        assert_eq!(provider.status_count(), 0);
        assert!(!tracker.is_polling(video).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubmission_supersedes_previous_run() {
        let provider = MockJobProvider::new().with_status(JobStatusReport::pending(RunStatus::Processing));
        let (tracker, _, _, video) = setup(&provider).await;

        let first = tracker.submit(None, video).await.unwrap();
        let mut watcher = tracker.watch(video).await.unwrap();
        let second = tracker.submit(None, video).await.unwrap();
        assert_ne!(first, second);

        watcher.changed().await.unwrap();
        assert_eq!(Some(&watcher.borrow().id), second.run_id());
        assert_eq!(tracker.run(video).await.unwrap().id, *second.run_id().unwrap());

        tokio::time::sleep(INTERVAL).await;
        settle().await;
        assert_eq!(provider.status_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_cancel_all() {
        let provider = MockJobProvider::new().with_status(JobStatusReport::pending(RunStatus::Processing));
        let (tracker, _, _, video) = setup(&provider).await;

        tracker.submit(None, video).await.unwrap();
        assert!(tracker.is_polling(video).await);
        assert!(tracker.cancel(video).await);
        assert!(!tracker.cancel(video).await);

        tokio::time::sleep(INTERVAL * 3).await;
        settle().await;
        assert_eq!(provider.status_count(), 0);
        assert_eq!(tracker.state(video).await, NodeRunState::Queued);

        tracker.submit(None, video).await.unwrap();
        tracker.cancel_all().await;
        tokio::time::sleep(INTERVAL * 3).await;
        settle().await;
        assert_eq!(provider.status_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_tracker_stops_polling() {
        let provider = MockJobProvider::new().with_status(JobStatusReport::pending(RunStatus::Processing));
        let (tracker, _, _, video) = setup(&provider).await;

        tracker.submit(None, video).await.unwrap();
        drop(tracker);
        settle().await;
        tokio::time::sleep(INTERVAL * 3).await;
        settle().await;

        assert_eq!(provider.status_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_run_times_out() {
        let provider = MockJobProvider::new().with_status(JobStatusReport::pending(RunStatus::Processing));
        let session = GraphSession::default();
        let video = session.add_node(NodeKindId::TextToVideo, Position::default()).await;
        let config = RunConfigBuilder::default()
            .max_poll_secs(10u64)
            .build()
            .unwrap();
        let tracker = RunTracker::new(JobService::new(provider.clone()), session, config);

        tracker.submit(None, video).await.unwrap();
        for _ in 0..6 {
            tokio::time::sleep(INTERVAL).await;
            settle().await;
        }

        let run = tracker.run(video).await.unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert!(run.error.unwrap().contains("10s"));
        assert!(!tracker.is_polling(video).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_many_is_independent() {
        let provider = MockJobProvider::new();
        let (tracker, session, prompt, video) = setup(&provider).await;
        let image = session
            .add_node(NodeKindId::ImageGenerator, Position::default())
            .await;

        let results = tracker.submit_many(None, &[video, prompt, image]).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, video);
        assert!(matches!(results[0].1, Ok(Submission::Accepted(_))));
        assert!(matches!(
            results[1].1,
            Ok(Submission::Skipped(SkipReason::NotExecutable))
        ));
        assert!(matches!(results[2].1, Ok(Submission::Accepted(_))));
        assert_eq!(provider.submit_count(), 2);
    }
}
