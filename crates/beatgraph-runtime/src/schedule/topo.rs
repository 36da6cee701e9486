//! Kahn's algorithm over the graph's node list.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use beatgraph_core::NodeId;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use crate::TRACING_TARGET_SCHEDULE;
use crate::graph::Graph;

/// A linear order of a graph's nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schedule {
    /// Nodes in dependency order, ties broken by insertion order.
    pub order: Vec<NodeId>,
    /// Nodes left out because they sit on or behind a cycle, in insertion
    /// order. Empty for every graph built through [`Graph::connect`].
    pub cyclic: Vec<NodeId>,
    #[serde(skip)]
    depth: Vec<usize>,
}

impl Schedule {
    /// Returns whether every node was ordered.
    pub fn is_complete(&self) -> bool {
        self.cyclic.is_empty()
    }

    /// Returns the longest-path depth from any root of the node at
    /// position `index` in [`Schedule::order`].
    pub(crate) fn depth_at(&self, index: usize) -> usize {
        self.depth.get(index).copied().unwrap_or_default()
    }
}

/// Orders the graph so every edge points forward.
///
/// Among nodes that are ready at the same time, the one added to the graph
/// first goes first, so the result is deterministic.
pub fn topological_order(graph: &Graph) -> Schedule {
    let dag = build(graph);
    let count = dag.node_count();

    let mut in_degree: Vec<usize> = dag
        .node_indices()
        .map(|index| dag.neighbors_directed(index, Direction::Incoming).count())
        .collect();
    let mut depth = vec![0usize; count];

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(index, _)| Reverse(index))
        .collect();

    let mut order = Vec::with_capacity(count);
    let mut order_depth = Vec::with_capacity(count);
    let mut placed = vec![false; count];

    while let Some(Reverse(index)) = ready.pop() {
        let node = NodeIndex::new(index);
        placed[index] = true;
        order.push(dag[node]);
        order_depth.push(depth[index]);

        for next in dag.neighbors_directed(node, Direction::Outgoing) {
            let slot = next.index();
            depth[slot] = depth[slot].max(depth[index] + 1);
            in_degree[slot] -= 1;
            if in_degree[slot] == 0 {
                ready.push(Reverse(slot));
            }
        }
    }

    let cyclic: Vec<NodeId> = dag
        .node_indices()
        .filter(|index| !placed[index.index()])
        .map(|index| dag[index])
        .collect();

    if !cyclic.is_empty() {
        tracing::warn!(
            target: TRACING_TARGET_SCHEDULE,
            omitted = cyclic.len(),
            "Graph contains a cycle, affected nodes left out of the order"
        );
    }

    Schedule {
        order,
        cyclic,
        depth: order_depth,
    }
}

/// Builds an index graph whose node indices follow insertion order.
fn build(graph: &Graph) -> DiGraph<NodeId, ()> {
    let mut dag = DiGraph::with_capacity(graph.node_count(), graph.edge_count());
    let indices: HashMap<NodeId, NodeIndex> = graph
        .nodes()
        .iter()
        .map(|node| (node.id, dag.add_node(node.id)))
        .collect();

    for edge in graph.edges() {
        if let (Some(source), Some(target)) = (indices.get(&edge.source), indices.get(&edge.target))
        {
            dag.add_edge(*source, *target, ());
        }
    }

    dag
}
