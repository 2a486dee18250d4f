use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::GraphView;
use crate::model::{NodeId, TensorId};

/// Liveness sets of one scheduled node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLiveness {
    /// Position in the schedule
    pub position: usize,
    pub node: NodeId,
    /// Tensors first generated by this node
    pub new: BTreeSet<TensorId>,
    /// Tensors resident while this node executes, including `new` and `freed`
    pub live: BTreeSet<TensorId>,
    /// Temporary tensors whose last use is this node
    pub freed: BTreeSet<TensorId>,
}

/// Schedule positions between which a tensor is allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorLifetime {
    pub tensor: TensorId,
    pub generated_at: usize,
    /// Last use of a temporary tensor; `None` for persistent tensors
    pub freed_at: Option<usize>,
    pub persistent: bool,
}

impl TensorLifetime {
    /// Number of schedule positions between generation and release
    pub fn age(&self) -> Option<usize> {
        self.freed_at.map(|freed_at| freed_at - self.generated_at)
    }

    pub fn is_live_at(&self, position: usize) -> bool {
        self.generated_at <= position && self.freed_at.map_or(true, |freed_at| position <= freed_at)
    }

    /// Whether both tensors are resident at some common position
    pub fn overlaps(&self, other: &TensorLifetime) -> bool {
        let end = self.freed_at.unwrap_or(usize::MAX);
        let other_end = other.freed_at.unwrap_or(usize::MAX);
        self.generated_at <= other_end && other.generated_at <= end
    }
}

/// Result of the liveness pass over a scheduled graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivenessAnalysis {
    nodes: Vec<NodeLiveness>,
    lifetimes: BTreeMap<TensorId, TensorLifetime>,
}

impl LivenessAnalysis {
    /// Run the forward liveness pass
    ///
    /// Fails with [`Error::OrderingViolation`] when a node reads a tensor that
    /// is not generated at or before its position.
    pub fn run<G: GraphView + ?Sized>(graph: &G) -> Result<Self> {
        let order = graph.ordered_nodes();

        let mut positions: HashMap<NodeId, usize> = HashMap::with_capacity(order.len());
        for (i, &node) in order.iter().enumerate() {
            if positions.insert(node, i).is_some() {
                return Err(Error::InvalidGraph(format!(
                    "Node {} appears more than once in the schedule",
                    graph.node_name(node)
                )));
            }
        }

        let mut lifetimes: BTreeMap<TensorId, TensorLifetime> = BTreeMap::new();
        let mut release_at: Vec<Vec<TensorId>> = vec![Vec::new(); order.len()];
        let mut working_set: BTreeSet<TensorId> = BTreeSet::new();
        let mut nodes = Vec::with_capacity(order.len());

        for (i, &node) in order.iter().enumerate() {
            let mut new = BTreeSet::new();
            for &tensor in graph.outputs_of(node) {
                if let Some(existing) = lifetimes.get(&tensor) {
                    if existing.generated_at == i {
                        continue;
                    }
                    return Err(Error::InvalidGraph(format!(
                        "Tensor {} is generated by {} and again by {}",
                        graph.tensor_name(tensor),
                        graph.node_name(order[existing.generated_at]),
                        graph.node_name(node)
                    )));
                }

                let persistent = graph.is_persistent(tensor);
                let last_use = Self::last_use(graph, tensor, i, &positions)?;
                let freed_at = if persistent {
                    None
                } else {
                    release_at[last_use].push(tensor);
                    Some(last_use)
                };
                lifetimes.insert(
                    tensor,
                    TensorLifetime {
                        tensor,
                        generated_at: i,
                        freed_at,
                        persistent,
                    },
                );
                new.insert(tensor);
            }

            for &tensor in graph.inputs_of(node) {
                let lifetime = lifetimes.get(&tensor).ok_or_else(|| Error::OrderingViolation {
                    node_index: i,
                    node: graph.node_name(node).to_string(),
                    tensor: graph.tensor_name(tensor).to_string(),
                })?;
                if lifetime.freed_at.map_or(false, |freed_at| freed_at < i) {
                    return Err(Error::InvalidGraph(format!(
                        "Node {} reads tensor {} after its last recorded use at position {}",
                        graph.node_name(node),
                        graph.tensor_name(tensor),
                        lifetime.freed_at.unwrap_or_default()
                    )));
                }
            }

            working_set.extend(new.iter().copied());
            let live = working_set.clone();

            let freed: BTreeSet<TensorId> = std::mem::take(&mut release_at[i]).into_iter().collect();
            for tensor in &freed {
                working_set.remove(tensor);
            }

            trace!(
                "{} [{}]: new={} live={} freed={}",
                graph.node_name(node),
                i,
                new.len(),
                live.len(),
                freed.len()
            );

            nodes.push(NodeLiveness {
                position: i,
                node,
                new,
                live,
                freed,
            });
        }

        debug!(
            "Liveness of {}: {} nodes, {} tensors, {} persistent",
            graph.graph_name(),
            nodes.len(),
            lifetimes.len(),
            lifetimes.values().filter(|l| l.persistent).count()
        );

        Ok(Self { nodes, lifetimes })
    }

    /// Position of the last consumer, or the generation position if unused
    fn last_use<G: GraphView + ?Sized>(
        graph: &G,
        tensor: TensorId,
        generated_at: usize,
        positions: &HashMap<NodeId, usize>,
    ) -> Result<usize> {
        let mut last_use = generated_at;
        for &consumer in graph.consumers_of(tensor) {
            let position = *positions.get(&consumer).ok_or_else(|| {
                Error::InvalidGraph(format!(
                    "Consumer {} of tensor {} is not scheduled",
                    graph.node_name(consumer),
                    graph.tensor_name(tensor)
                ))
            })?;
            if position < generated_at {
                return Err(Error::OrderingViolation {
                    node_index: position,
                    node: graph.node_name(consumer).to_string(),
                    tensor: graph.tensor_name(tensor).to_string(),
                });
            }
            last_use = last_use.max(position);
        }
        Ok(last_use)
    }

    /// Per-node annotations in schedule order
    pub fn nodes(&self) -> &[NodeLiveness] {
        &self.nodes
    }

    pub fn node(&self, position: usize) -> Option<&NodeLiveness> {
        self.nodes.get(position)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Lifetimes of every generated tensor, ordered by tensor id
    pub fn lifetimes(&self) -> impl Iterator<Item = &TensorLifetime> {
        self.lifetimes.values()
    }

    pub fn lifetime(&self, tensor: TensorId) -> Option<&TensorLifetime> {
        self.lifetimes.get(&tensor)
    }

    pub fn generation(&self, tensor: TensorId) -> Option<usize> {
        self.lifetime(tensor).map(|l| l.generated_at)
    }

    pub fn free_position(&self, tensor: TensorId) -> Option<usize> {
        self.lifetime(tensor).and_then(|l| l.freed_at)
    }

    /// Whether two tensors can share storage (`None` if either is unknown)
    pub fn lifetimes_overlap(&self, a: TensorId, b: TensorId) -> Option<bool> {
        Some(self.lifetime(a)?.overlaps(self.lifetime(b)?))
    }
}
