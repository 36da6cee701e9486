//! Shared, observable graph ownership.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use beatgraph_core::{EdgeId, GraphId, NodeId, Result};
use tokio::sync::{RwLock, broadcast};

use super::{ConnectError, Edge, Graph, GraphEvent, NodeData, Position, RemovedNode};
use crate::TRACING_TARGET_GRAPH;
use crate::persist::GraphRepository;
use crate::registry::{NodeKindId, Registry};
use crate::resolve::{self, AutoWireError, AutoWired, WireOrigin};

/// Buffered events per subscriber before the oldest are dropped.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A graph shared between the host, run tracking and persistence.
///
/// Cloning is cheap and yields a handle to the same graph. Every mutation
/// wrapper takes the write lock once, applies the change and then
/// broadcasts the matching [`GraphEvent`]. Events are fire-and-forget:
/// sending with no subscribers is not an error, and slow subscribers see
/// `Lagged` instead of blocking writers.
///
/// Every [`replace`](Self::replace) starts a new generation. Work that
/// captured the graph before a replace, such as an in-flight save or a
/// poll loop, compares generations before touching the live graph.
#[derive(Clone)]
pub struct GraphSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    graph: RwLock<Graph>,
    /// Only changed while the graph write lock is held.
    generation: AtomicU64,
    events: broadcast::Sender<GraphEvent>,
}

impl fmt::Debug for GraphSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphSession")
            .field("subscribers", &self.inner.events.receiver_count())
            .finish_non_exhaustive()
    }
}

impl GraphSession {
    /// Creates a session owning `graph`.
    pub fn new(graph: Graph) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(SessionInner {
                graph: RwLock::new(graph),
                generation: AtomicU64::new(0),
                events,
            }),
        }
    }

    /// Subscribes to events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<GraphEvent> {
        self.inner.events.subscribe()
    }

    /// Returns a copy of the current graph.
    pub async fn snapshot(&self) -> Graph {
        self.inner.graph.read().await.clone()
    }

    /// Runs `f` against the graph under the read lock.
    pub async fn read<R>(&self, f: impl FnOnce(&Graph) -> R) -> R {
        let graph = self.inner.graph.read().await;
        f(&graph)
    }

    /// Runs `f` against the graph under the write lock.
    ///
    /// No event is emitted; prefer the dedicated wrappers for changes
    /// subscribers should see.
    pub async fn mutate<R>(&self, f: impl FnOnce(&mut Graph) -> R) -> R {
        let mut graph = self.inner.graph.write().await;
        f(&mut graph)
    }

    /// Returns the generation of the live graph.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    /// Returns the store id of the graph, `None` while it is a draft.
    pub async fn graph_id(&self) -> Option<GraphId> {
        self.inner.graph.read().await.id
    }

    /// Adds a node and emits [`GraphEvent::NodeAdded`].
    pub async fn add_node(&self, kind: NodeKindId, position: Position) -> NodeId {
        let node_id = self.mutate(|graph| graph.add_node(kind, position)).await;
        self.emit(GraphEvent::NodeAdded { node_id });
        node_id
    }

    /// Adds a node with initial data and emits [`GraphEvent::NodeAdded`].
    pub async fn add_node_with_data(
        &self,
        kind: NodeKindId,
        position: Position,
        data: NodeData,
    ) -> NodeId {
        let node_id = self
            .mutate(|graph| graph.add_node_with_data(kind, position, data))
            .await;
        self.emit(GraphEvent::NodeAdded { node_id });
        node_id
    }

    /// Removes a node with its edges and emits [`GraphEvent::NodeRemoved`].
    pub async fn remove_node(&self, id: NodeId) -> Option<RemovedNode> {
        let removed = self.mutate(|graph| graph.remove_node(id)).await?;
        self.emit(GraphEvent::NodeRemoved {
            node_id: id,
            edge_ids: removed.edges.iter().map(|edge| edge.id).collect(),
        });
        Some(removed)
    }

    /// Merges `partial` into a node's data and emits
    /// [`GraphEvent::NodeDataChanged`].
    pub async fn update_node_data(&self, id: NodeId, partial: NodeData) -> bool {
        let updated = self
            .mutate(|graph| graph.update_node_data(id, &partial))
            .await;
        if updated {
            self.emit(GraphEvent::NodeDataChanged {
                node_id: id,
                partial,
            });
        }
        updated
    }

    /// Toggles a node and emits [`GraphEvent::NodeDisabled`].
    pub async fn set_node_disabled(&self, id: NodeId, disabled: bool) -> bool {
        let updated = self
            .mutate(|graph| graph.set_node_disabled(id, disabled))
            .await;
        if updated {
            self.emit(GraphEvent::NodeDisabled {
                node_id: id,
                disabled,
            });
        }
        updated
    }

    /// Duplicates nodes and emits one [`GraphEvent::NodeAdded`] per copy.
    pub async fn duplicate_nodes(&self, ids: &[NodeId]) -> Vec<NodeId> {
        let copies = self.mutate(|graph| graph.duplicate_nodes(ids)).await;
        for node_id in &copies {
            self.emit(GraphEvent::NodeAdded { node_id: *node_id });
        }
        copies
    }

    /// Connects two ports and emits [`GraphEvent::EdgeAdded`].
    pub async fn connect(
        &self,
        source: NodeId,
        source_port: &str,
        target: NodeId,
        target_port: &str,
    ) -> Result<EdgeId, ConnectError> {
        let edge_id = self
            .mutate(|graph| graph.connect(source, source_port, target, target_port))
            .await?;
        self.emit(GraphEvent::EdgeAdded { edge_id });
        Ok(edge_id)
    }

    /// Removes an edge and emits [`GraphEvent::EdgeRemoved`].
    pub async fn remove_edge(&self, id: EdgeId) -> Option<Edge> {
        let edge = self.mutate(|graph| graph.remove_edge(id)).await?;
        self.emit(GraphEvent::EdgeRemoved { edge_id: id });
        Some(edge)
    }

    /// Auto-wires a new node to `origin`, see [`resolve::auto_wire`].
    pub async fn auto_wire(
        &self,
        registry: &Registry,
        origin: &WireOrigin,
        kind: &str,
        drop: Position,
    ) -> Result<AutoWired, AutoWireError> {
        let wired = self
            .mutate(|graph| resolve::auto_wire(graph, registry, origin, kind, drop))
            .await?;

        self.emit(GraphEvent::NodeAdded {
            node_id: wired.node_id,
        });
        if let Some(edge_id) = wired.edge_id {
            self.emit(GraphEvent::EdgeAdded { edge_id });
        }
        Ok(wired)
    }

    /// Swaps in a whole new graph, starts a new generation and emits
    /// [`GraphEvent::GraphReplaced`].
    ///
    /// Returns the previous graph.
    pub async fn replace(&self, graph: Graph) -> Graph {
        let previous = {
            let mut current = self.inner.graph.write().await;
            self.inner.generation.fetch_add(1, Ordering::AcqRel);
            std::mem::replace(&mut *current, graph)
        };
        self.emit(GraphEvent::GraphReplaced);
        previous
    }

    /// Saves a snapshot of the graph through `repository`.
    ///
    /// On success the store id is recorded on the live graph, turning a
    /// draft into a persisted graph. On failure the live graph is left
    /// untouched and the error is returned.
    ///
    /// If the graph is replaced while the store call is in flight, the id
    /// belongs to the snapshot only and the new live graph keeps its own.
    pub async fn save(&self, repository: &GraphRepository) -> Result<GraphId> {
        let (snapshot, generation) = {
            let graph = self.inner.graph.read().await;
            (graph.clone(), self.generation())
        };
        let graph_id = repository.save(&snapshot).await?;

        let recorded = {
            let mut graph = self.inner.graph.write().await;
            let current = self.generation() == generation;
            if current {
                graph.id = Some(graph_id);
            }
            current
        };

        if !recorded {
            tracing::warn!(
                target: TRACING_TARGET_GRAPH,
                graph_id = %graph_id,
                "Graph replaced during save, id not recorded on the live graph"
            );
            return Ok(graph_id);
        }

        self.emit(GraphEvent::GraphSaved { graph_id });
        Ok(graph_id)
    }

    /// Loads a stored graph through `repository` and replaces the live one.
    pub async fn load(&self, repository: &GraphRepository, id: GraphId) -> Result<()> {
        let graph = repository.load(id).await?;
        self.replace(graph).await;
        Ok(())
    }

    /// Broadcasts an event to current subscribers.
    pub(crate) fn emit(&self, event: GraphEvent) {
        if self.inner.events.send(event).is_err() {
            tracing::trace!(target: TRACING_TARGET_GRAPH, "Event dropped, no subscribers");
        }
    }
}

impl Default for GraphSession {
    fn default() -> Self {
        Self::new(Graph::default())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use beatgraph_core::GraphStore;
    use beatgraph_test::{FailingGraphStore, InMemoryGraphStore};
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_mutations_emit_events() {
        let session = GraphSession::default();
        let mut events = session.subscribe();

        let prompt = session.add_node(NodeKindId::Prompt, Position::default()).await;
        let image = session
            .add_node(NodeKindId::ImageGenerator, Position::default())
            .await;
        let edge_id = session.connect(prompt, "prompt", image, "prompt").await.unwrap();
        session.remove_node(image).await.unwrap();

        assert_eq!(events.recv().await.unwrap(), GraphEvent::NodeAdded { node_id: prompt });
        assert_eq!(events.recv().await.unwrap(), GraphEvent::NodeAdded { node_id: image });
        assert_eq!(events.recv().await.unwrap(), GraphEvent::EdgeAdded { edge_id });
        assert_eq!(
            events.recv().await.unwrap(),
            GraphEvent::NodeRemoved {
                node_id: image,
                edge_ids: vec![edge_id],
            }
        );
    }

    #[tokio::test]
    async fn test_noop_mutations_emit_nothing() {
        let session = GraphSession::default();
        let mut events = session.subscribe();

        assert!(session.remove_node(NodeId::new()).await.is_none());
        assert!(!session.update_node_data(NodeId::new(), NodeData::new()).await);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_update_node_data_broadcasts_partial() {
        let session = GraphSession::default();
        let prompt = session.add_node(NodeKindId::Prompt, Position::default()).await;
        let mut events = session.subscribe();

        let mut partial = NodeData::new();
        partial.insert("text".into(), json!("city at dusk"));
        assert!(session.update_node_data(prompt, partial.clone()).await);

        assert_eq!(
            events.recv().await.unwrap(),
            GraphEvent::NodeDataChanged {
                node_id: prompt,
                partial,
            }
        );
    }

    #[tokio::test]
    async fn test_save_records_id_on_live_graph() {
        let store = InMemoryGraphStore::new();
        let repository = GraphRepository::new(GraphStore::new(store.clone()), Registry::builtin());
        let session = GraphSession::default();
        session.add_node(NodeKindId::Prompt, Position::default()).await;
        assert!(session.graph_id().await.is_none());

        let first = session.save(&repository).await.unwrap();
        assert_eq!(session.graph_id().await, Some(first));

        let second = session.save(&repository).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_graph_untouched() {
        let repository = GraphRepository::new(GraphStore::new(FailingGraphStore), Registry::builtin());
        let session = GraphSession::default();
        session.add_node(NodeKindId::Prompt, Position::default()).await;
        let before = session.snapshot().await;

        assert!(session.save(&repository).await.is_err());
        assert_eq!(session.snapshot().await, before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_during_save_keeps_new_graph_draft() {
        let store = InMemoryGraphStore::new().with_latency(Duration::from_secs(1));
        let repository = GraphRepository::new(GraphStore::new(store.clone()), Registry::builtin());
        let session = GraphSession::new(Graph::new("first"));
        let mut events = session.subscribe();

        let (saved, _) = tokio::join!(session.save(&repository), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            session.replace(Graph::new("second")).await
        });
        let saved = saved.unwrap();

        let live = session.snapshot().await;
        assert_eq!(live.name, "second");
        assert!(live.id.is_none());
        assert_eq!(session.generation(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(repository.load(saved).await.unwrap().name, "first");

        assert_eq!(events.recv().await.unwrap(), GraphEvent::GraphReplaced);
        assert!(events.try_recv().is_err());
    }
}
