use std::cmp::Reverse;
use std::collections::BinaryHeap;

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::error::{Error, Result};
use crate::model::{Graph, NodeId};

/// Dependency graph with one petgraph node per graph node (same index)
fn dependency_graph(graph: &Graph) -> DiGraph<NodeId, ()> {
    let mut deps = DiGraph::with_capacity(graph.nodes().len(), graph.tensors().len());
    for node in graph.nodes() {
        deps.add_node(node.id);
    }
    for node in graph.nodes() {
        for &arg in &node.arguments {
            deps.add_edge(NodeIndex::new(arg.0), NodeIndex::new(node.id.0), ());
        }
    }
    deps
}

/// Compute a topological order of the graph's nodes
///
/// Among ready nodes the one created first is scheduled first, so a graph
/// built with [`crate::graph::GraphBuilder`] keeps its creation order.
pub fn topological_schedule(graph: &Graph) -> Result<Vec<NodeId>> {
    let deps = dependency_graph(graph);
    if is_cyclic_directed(&deps) {
        return Err(Error::InvalidGraph(format!(
            "Cycle detected in graph {}",
            graph.name()
        )));
    }

    let mut in_degree: Vec<usize> = deps
        .node_indices()
        .map(|ix| deps.neighbors_directed(ix, Direction::Incoming).count())
        .collect();

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &degree)| degree == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(in_degree.len());
    while let Some(Reverse(index)) = ready.pop() {
        order.push(deps[NodeIndex::new(index)]);
        for succ in deps.neighbors_directed(NodeIndex::new(index), Direction::Outgoing) {
            let degree = &mut in_degree[succ.index()];
            *degree -= 1;
            if *degree == 0 {
                ready.push(Reverse(succ.index()));
            }
        }
    }

    Ok(order)
}

/// Whether every node in `order` comes after all of its arguments
pub fn is_topological(graph: &Graph, order: &[NodeId]) -> bool {
    let mut position = vec![usize::MAX; graph.nodes().len()];
    for (i, node) in order.iter().enumerate() {
        match position.get_mut(node.0) {
            Some(slot) => *slot = i,
            None => return false,
        }
    }

    graph.nodes().iter().all(|node| {
        node.arguments
            .iter()
            .all(|arg| position[arg.0] < position[node.id.0])
    })
}

impl Graph {
    /// Reschedule the graph in topological order
    pub fn topologically_sorted(self) -> Result<Graph> {
        let order = topological_schedule(&self)?;
        self.with_schedule(order)
    }
}
