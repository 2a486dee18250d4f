use log::debug;

use crate::error::{Error, Result};
use crate::graph::GraphView;
use crate::memory::{LivenessAnalysis, MemoryProfile};
use super::model::{MemoryReport, NodeWeightRow, PeakSummary, TensorRow, TimelineEntry};

/// Shapes liveness and memory metrics into a [`MemoryReport`]
///
/// The builder only reorders and normalizes what the analyses computed; it
/// never walks the graph edges again.
pub struct ReportBuilder<'a, G: GraphView + ?Sized> {
    graph: &'a G,
    liveness: &'a LivenessAnalysis,
    profile: &'a MemoryProfile,
    highlight_peak: bool,
}

impl<'a, G: GraphView + ?Sized> ReportBuilder<'a, G> {
    pub fn new(graph: &'a G, liveness: &'a LivenessAnalysis, profile: &'a MemoryProfile) -> Self {
        Self {
            graph,
            liveness,
            profile,
            highlight_peak: true,
        }
    }

    /// Mark tensors live at the peak node in the tensor table
    pub fn highlight_peak(mut self, enable: bool) -> Self {
        self.highlight_peak = enable;
        self
    }

    pub fn build(&self) -> Result<MemoryReport> {
        if self.liveness.len() != self.profile.nodes.len() {
            return Err(Error::InvalidGraph(format!(
                "Memory profile covers {} nodes but liveness covers {}",
                self.profile.nodes.len(),
                self.liveness.len()
            )));
        }

        let report = MemoryReport {
            graph_name: self.graph.graph_name().to_string(),
            peak_node: self.peak_summary(),
            peak_footprint: self.profile.normalization_denominator(),
            persistent_footprint: self.profile.persistent_footprint,
            naive_temporary_size: self.profile.naive_temporary_size,
            tensor_table: self.tensor_table()?,
            weight_ranking: self.weight_ranking(),
            timeline: self.timeline(),
        };

        debug!(
            "Report for {}: {} tensors, {} nodes, peak {} bytes",
            report.graph_name,
            report.tensor_table.len(),
            report.timeline.len(),
            report.peak_footprint
        );
        Ok(report)
    }

    fn peak_summary(&self) -> Option<PeakSummary> {
        self.profile.peak.map(|peak| PeakSummary {
            position: peak.position,
            node: peak.node,
            name: self.graph.node_name(peak.node).to_string(),
            footprint: peak.footprint,
        })
    }

    /// Freed tensors in release order, then stably sorted by size
    fn tensor_table(&self) -> Result<Vec<TensorRow>> {
        // Zero-byte peaks highlight nothing
        let peak_live = match (self.highlight_peak, self.profile.peak) {
            (true, Some(peak)) if peak.footprint > 0 => {
                self.liveness.node(peak.position).map(|n| &n.live)
            }
            _ => None,
        };

        let mut rows = Vec::new();
        for annotation in self.liveness.nodes() {
            for &tensor in &annotation.freed {
                let lifetime = self.liveness.lifetime(tensor).ok_or_else(|| {
                    Error::InvalidGraph(format!("No lifetime for freed tensor {}", tensor))
                })?;
                let generator = &self.profile.nodes[lifetime.generated_at];

                rows.push(TensorRow {
                    tensor,
                    name: self.graph.tensor_name(tensor).to_string(),
                    size_bytes: self.graph.size(tensor),
                    age: lifetime.age().unwrap_or(0),
                    generator: self.graph.node_name(generator.node).to_string(),
                    generator_weight: generator.weight,
                    highlighted: peak_live.map_or(false, |live| live.contains(&tensor)),
                });
            }
        }

        rows.sort_by_key(|row| row.size_bytes);
        Ok(rows)
    }

    fn weight_ranking(&self) -> Vec<NodeWeightRow> {
        let mut rows: Vec<NodeWeightRow> = self
            .profile
            .nodes
            .iter()
            .map(|node| NodeWeightRow {
                position: node.position,
                node: node.node,
                name: self.graph.node_name(node.node).to_string(),
                weight: node.weight,
            })
            .collect();
        rows.sort_by(|a, b| b.weight.cmp(&a.weight));
        rows
    }

    fn timeline(&self) -> Vec<TimelineEntry> {
        let denominator = self.profile.normalization_denominator() as f64;
        self.profile
            .nodes
            .iter()
            .map(|node| TimelineEntry {
                position: node.position,
                node: node.node,
                name: self.graph.node_name(node.node).to_string(),
                used_fraction: node.usage as f64 / denominator,
                footprint_fraction: node.footprint as f64 / denominator,
            })
            .collect()
    }
}
