use serde::{Deserialize, Serialize};

use crate::model::{NodeId, TensorId};

/// One temporary tensor in the size-sorted table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorRow {
    pub tensor: TensorId,
    pub name: String,
    /// Size in bytes
    pub size_bytes: usize,
    /// Schedule positions between generation and release
    pub age: usize,
    /// Name of the node that generates the tensor
    pub generator: String,
    /// Weight of the generating node
    pub generator_weight: i64,
    /// Whether the tensor is live at the peak node
    pub highlighted: bool,
}

/// One node in the weight ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeWeightRow {
    pub position: usize,
    pub node: NodeId,
    pub name: String,
    pub weight: i64,
}

/// Memory pressure of one node, relative to the peak
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub position: usize,
    pub node: NodeId,
    pub name: String,
    /// Bytes the node touches over the normalization denominator
    pub used_fraction: f64,
    /// Live temporary bytes over the normalization denominator
    pub footprint_fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakSummary {
    pub position: usize,
    pub node: NodeId,
    pub name: String,
    /// Live temporary bytes at the peak node, without the floor
    pub footprint: usize,
}

/// Renderer-ready memory report of one graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryReport {
    pub graph_name: String,
    pub peak_node: Option<PeakSummary>,
    /// Peak temporary footprint, never below 1
    pub peak_footprint: usize,
    pub persistent_footprint: usize,
    pub naive_temporary_size: usize,
    /// Temporary tensors, ascending by size
    pub tensor_table: Vec<TensorRow>,
    /// Nodes, descending by weight
    pub weight_ranking: Vec<NodeWeightRow>,
    /// Nodes in schedule order
    pub timeline: Vec<TimelineEntry>,
}

impl MemoryReport {
    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    /// Bytes saved by reusing storage, compared with one buffer per tensor
    pub fn reuse_savings(&self) -> usize {
        let peak = self.peak_node.as_ref().map_or(0, |peak| peak.footprint);
        self.naive_temporary_size.saturating_sub(peak)
    }

    pub fn highlighted_tensors(&self) -> impl Iterator<Item = &TensorRow> {
        self.tensor_table.iter().filter(|row| row.highlighted)
    }
}
