use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

use log::{debug, info};
use rayon::prelude::*;

use crate::error::Result;
use crate::graph::GraphView;
use crate::memory::{LivenessAnalysis, MemoryAnalyzer};
use crate::model::Graph;
use crate::options::AnalysisOptions;
use crate::report::{write_report, MemoryReport, ReportBuilder};

/// Run liveness, memory analysis and report shaping on one graph
pub fn analyze<G: GraphView + ?Sized>(graph: &G, options: &AnalysisOptions) -> Result<MemoryReport> {
    let liveness = LivenessAnalysis::run(graph)?;
    let profile = MemoryAnalyzer::analyze(graph, &liveness)?;
    ReportBuilder::new(graph, &liveness, &profile)
        .highlight_peak(options.highlight_peak)
        .build()
}

/// Result of running an analysis pass over a set of graphs
#[derive(Debug, Clone)]
pub struct PassResult {
    /// Name of the pass
    pub name: String,
    /// Number of graphs analyzed
    pub graphs_analyzed: usize,
    /// Duration of the pass
    pub duration: Duration,
    /// Largest peak footprint over all graphs
    pub max_peak_footprint: usize,
}

/// Trait for passes that inspect a graph without changing it
pub trait AnalysisPass: Send + Sync {
    /// Name of the pass
    fn name(&self) -> &str;

    /// Run the pass on one graph
    fn run_on_graph(&self, graph: &Graph) -> Result<MemoryReport>;
}

/// Computes a memory report for each graph of a module
#[derive(Debug, Clone, Default)]
pub struct MemoryReportPass {
    options: AnalysisOptions,
}

impl MemoryReportPass {
    pub fn new(options: AnalysisOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Analyze every graph; reports come back in input order
    pub fn run_on_module(&self, graphs: &[Graph]) -> Result<(Vec<MemoryReport>, PassResult)> {
        let start = Instant::now();

        let reports = if self.options.parallel {
            graphs
                .par_iter()
                .map(|graph| self.run_on_graph(graph))
                .collect::<Result<Vec<_>>>()?
        } else {
            graphs
                .iter()
                .map(|graph| self.run_on_graph(graph))
                .collect::<Result<Vec<_>>>()?
        };

        let result = PassResult {
            name: self.name().to_string(),
            graphs_analyzed: reports.len(),
            duration: start.elapsed(),
            max_peak_footprint: reports.iter().map(|r| r.peak_footprint).max().unwrap_or(0),
        };
        info!(
            "{} analyzed {} graphs in {:?}",
            result.name, result.graphs_analyzed, result.duration
        );

        Ok((reports, result))
    }

    /// Analyze every graph and write one report per graph into `dir`
    ///
    /// Files are named after their graph. Characters outside `[A-Za-z0-9_-]`
    /// become `_`, and a repeated name gets a numeric suffix.
    pub fn run_to_dir(&self, graphs: &[Graph], dir: &Path) -> Result<PassResult> {
        let (reports, result) = self.run_on_module(graphs)?;
        let format = self.options.export_format;
        let names = report_file_stems(reports.iter().map(|r| r.graph_name.as_str()));
        for (report, stem) in reports.iter().zip(names) {
            let path = dir.join(format!("{}.{}", stem, format.extension()));
            write_report(report, format, &path)?;
        }
        Ok(result)
    }
}

/// One distinct file stem per graph name, none of which leaves its directory
fn report_file_stems<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut taken = HashSet::new();
    let mut stems = Vec::new();
    for name in names {
        let mut base: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if base.is_empty() {
            base.push_str("graph");
        }

        let mut stem = base.clone();
        let mut suffix = 1;
        while !taken.insert(stem.clone()) {
            stem = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        stems.push(stem);
    }
    stems
}

impl AnalysisPass for MemoryReportPass {
    fn name(&self) -> &str {
        "MemoryReport"
    }

    fn run_on_graph(&self, graph: &Graph) -> Result<MemoryReport> {
        debug!("Running {} on {}", self.name(), graph.name());
        analyze(graph, &self.options)
    }
}
