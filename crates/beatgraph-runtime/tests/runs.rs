//! Executing nodes of a saved graph against the mock job service.

use std::time::Duration;

use beatgraph_core::{GraphStore, JobService, RunStatus};
use beatgraph_runtime::graph::{GraphEvent, GraphSession, NodeData, Position};
use beatgraph_runtime::persist::GraphRepository;
use beatgraph_runtime::registry::{ASSET_URL_KEY, NodeKindId, Registry};
use beatgraph_runtime::run::{NodeRunState, RunConfig, RunTracker};
use beatgraph_test::{InMemoryGraphStore, MOCK_ASSET_BASE_URL, MockJobConfig, MockJobProvider};
use serde_json::json;
use tokio::sync::broadcast;

async fn wait_for_completion(events: &mut broadcast::Receiver<GraphEvent>, expected: usize) {
    let mut completed = 0;
    while completed < expected {
        if let GraphEvent::RunStatusChanged { status, .. } = events.recv().await.unwrap()
            && status.is_terminal()
        {
            completed += 1;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_results_survive_save_and_load() {
    let store = InMemoryGraphStore::new();
    let repository = GraphRepository::new(GraphStore::new(store.clone()), Registry::builtin());
    let provider = MockJobProvider::from_config(MockJobConfig {
        complete_after: 2,
        status_delay_ms: 0,
    });

    let session = GraphSession::default();
    let mut data = NodeData::new();
    data.insert("text".into(), json!("a fox in the snow"));
    let prompt = session
        .add_node_with_data(NodeKindId::Prompt, Position::default(), data)
        .await;
    let image = session
        .add_node(NodeKindId::ImageGenerator, Position::new(240.0, 0.0))
        .await;
    let video = session
        .add_node(NodeKindId::ImageToVideo, Position::new(480.0, 0.0))
        .await;
    session.connect(prompt, "prompt", image, "prompt").await.unwrap();
    session.connect(image, "image", video, "image").await.unwrap();
    let graph_id = session.save(&repository).await.unwrap();

    let tracker = RunTracker::new(
        JobService::new(provider.clone()),
        session.clone(),
        RunConfig::default(),
    );
    let mut events = session.subscribe();
    tracker.submit(Some(graph_id), image).await.unwrap();
    wait_for_completion(&mut events, 1).await;

    let image_run = tracker.run(image).await.unwrap();
    assert_eq!(image_run.status, RunStatus::Completed);
    let asset = session
        .read(|graph| graph.node(image).unwrap().data[ASSET_URL_KEY].clone())
        .await;
    assert!(asset.as_str().unwrap().starts_with(MOCK_ASSET_BASE_URL));

    tracker.submit(Some(graph_id), video).await.unwrap();
    wait_for_completion(&mut events, 1).await;

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].graph_id, Some(graph_id));
    assert_eq!(requests[1].inputs["image"], asset);

    session.save(&repository).await.unwrap();
    let loaded = repository.load(graph_id).await.unwrap();
    assert_eq!(loaded.node(image).unwrap().data[ASSET_URL_KEY], asset);
    assert!(loaded.node(video).unwrap().data.contains_key(ASSET_URL_KEY));
    assert_eq!(store.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_batch_runs_poll_independently() {
    let provider = MockJobProvider::new();
    let session = GraphSession::default();
    let prompt = session.add_node(NodeKindId::Prompt, Position::default()).await;
    let first = session
        .add_node(NodeKindId::TextToVideo, Position::new(240.0, 0.0))
        .await;
    let second = session
        .add_node(NodeKindId::TextToVideo, Position::new(240.0, 200.0))
        .await;
    session.connect(prompt, "prompt", first, "prompt").await.unwrap();
    session.connect(prompt, "prompt", second, "prompt").await.unwrap();

    let tracker = RunTracker::new(
        JobService::new(provider.clone()),
        session.clone(),
        RunConfig::default(),
    );
    let mut events = session.subscribe();
    let results = tracker.submit_many(None, &[first, second]).await;
    assert!(results.iter().all(|(_, result)| result.is_ok()));

    session.remove_node(second).await.unwrap();
    wait_for_completion(&mut events, 1).await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(tracker.state(first).await, NodeRunState::Completed);
    assert_eq!(tracker.state(second).await, NodeRunState::Idle);
    assert_eq!(provider.status_count(), 1);
}
