use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::GraphView;
use crate::model::{NodeId, TensorId};
use super::liveness::{LivenessAnalysis, NodeLiveness};

/// Denominator used for ratios when the peak footprint is zero or undefined
pub const NORMALIZATION_FLOOR: usize = 1;

/// Node with the largest temporary working set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakNode {
    pub position: usize,
    pub node: NodeId,
    pub footprint: usize,
}

/// Memory metrics of one scheduled node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMemory {
    pub position: usize,
    pub node: NodeId,
    /// Bytes of temporary tensors live while the node executes
    pub footprint: usize,
    /// Part of `footprint` the node itself reads or writes
    pub usage: usize,
    /// Temporary bytes generated minus temporary bytes freed
    pub weight: i64,
}

/// Scalar metrics derived from liveness annotations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryProfile {
    pub peak: Option<PeakNode>,
    pub nodes: Vec<NodeMemory>,
    /// Age of every temporary tensor, in schedule positions
    pub tensor_ages: BTreeMap<TensorId, usize>,
    /// Bytes held by persistent tensors
    pub persistent_footprint: usize,
    /// Bytes needed if no temporary tensor ever shared storage
    pub naive_temporary_size: usize,
}

impl MemoryProfile {
    /// Largest temporary working set, 0 for an empty schedule
    pub fn peak_footprint(&self) -> usize {
        self.peak.map_or(0, |peak| peak.footprint)
    }

    /// Peak footprint, floored so ratios never divide by zero
    pub fn normalization_denominator(&self) -> usize {
        self.peak_footprint().max(NORMALIZATION_FLOOR)
    }

    pub fn weight(&self, position: usize) -> Option<i64> {
        self.nodes.get(position).map(|n| n.weight)
    }

    pub fn age(&self, tensor: TensorId) -> Option<usize> {
        self.tensor_ages.get(&tensor).copied()
    }
}

/// Computes peak, weights and ages from a liveness analysis
pub struct MemoryAnalyzer;

impl MemoryAnalyzer {
    pub fn analyze<G: GraphView + ?Sized>(
        graph: &G,
        liveness: &LivenessAnalysis,
    ) -> Result<MemoryProfile> {
        let mut nodes = Vec::with_capacity(liveness.len());
        for annotation in liveness.nodes() {
            nodes.push(NodeMemory {
                position: annotation.position,
                node: annotation.node,
                footprint: Self::temporary_size(graph, annotation.live.iter())?,
                usage: Self::memory_usage(graph, annotation)?,
                weight: Self::compute_node_weight(graph, annotation)?,
            });
        }

        let peak = Self::find_peak(&nodes);
        let tensor_ages = Self::compute_ages(liveness);

        let mut persistent_footprint = 0usize;
        let mut naive_temporary_size = 0usize;
        for lifetime in liveness.lifetimes() {
            let total = if lifetime.persistent {
                &mut persistent_footprint
            } else {
                &mut naive_temporary_size
            };
            *total = checked_add(*total, graph.size(lifetime.tensor))?;
        }

        if let Some(peak) = peak {
            debug!(
                "Peak temporary footprint of {}: {} bytes at {} (position {})",
                graph.graph_name(),
                peak.footprint,
                graph.node_name(peak.node),
                peak.position
            );
        }

        Ok(MemoryProfile {
            peak,
            nodes,
            tensor_ages,
            persistent_footprint,
            naive_temporary_size,
        })
    }

    /// First node with the largest footprint
    pub fn find_peak(nodes: &[NodeMemory]) -> Option<PeakNode> {
        let mut peak: Option<PeakNode> = None;
        for node in nodes {
            if peak.map_or(true, |p| node.footprint > p.footprint) {
                peak = Some(PeakNode {
                    position: node.position,
                    node: node.node,
                    footprint: node.footprint,
                });
            }
        }
        peak
    }

    /// Net temporary-memory change caused by executing one node
    pub fn compute_node_weight<G: GraphView + ?Sized>(
        graph: &G,
        annotation: &NodeLiveness,
    ) -> Result<i64> {
        let allocated = to_signed(Self::temporary_size(graph, annotation.new.iter())?)?;
        let released = to_signed(Self::temporary_size(graph, annotation.freed.iter())?)?;
        Ok(allocated - released)
    }

    /// Bytes of live temporaries that the node reads or writes
    pub fn memory_usage<G: GraphView + ?Sized>(
        graph: &G,
        annotation: &NodeLiveness,
    ) -> Result<usize> {
        let touched: BTreeSet<TensorId> = graph
            .inputs_of(annotation.node)
            .iter()
            .chain(graph.outputs_of(annotation.node))
            .copied()
            .filter(|tensor| annotation.live.contains(tensor))
            .collect();
        Self::temporary_size(graph, touched.iter())
    }

    pub fn compute_ages(liveness: &LivenessAnalysis) -> BTreeMap<TensorId, usize> {
        liveness
            .lifetimes()
            .filter_map(|lifetime| lifetime.age().map(|age| (lifetime.tensor, age)))
            .collect()
    }

    /// Total size of the non-persistent tensors in `tensors`
    fn temporary_size<'a, G, I>(graph: &G, tensors: I) -> Result<usize>
    where
        G: GraphView + ?Sized,
        I: Iterator<Item = &'a TensorId>,
    {
        tensors
            .filter(|&&tensor| !graph.is_persistent(tensor))
            .try_fold(0usize, |total, &tensor| checked_add(total, graph.size(tensor)))
    }
}

fn checked_add(total: usize, size: usize) -> Result<usize> {
    total
        .checked_add(size)
        .ok_or_else(|| Error::SizeOverflow(format!("Adding {} bytes to {} overflows", size, total)))
}

fn to_signed(size: usize) -> Result<i64> {
    i64::try_from(size)
        .map_err(|_| Error::SizeOverflow(format!("{} bytes do not fit a signed weight", size)))
}
