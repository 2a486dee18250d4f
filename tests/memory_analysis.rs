use std::collections::HashMap;
use std::fs;

use tensor_liveness::{
    analyze,
    export_report,
    write_report,
    AnalysisOptions,
    AnalysisPass,
    DataType,
    Error,
    ExportFormat,
    Graph,
    GraphBuilder,
    GraphView,
    LivenessAnalysis,
    MemoryAnalyzer,
    MemoryReport,
    MemoryReportPass,
    NodeId,
    Op,
    TensorId,
    TensorType,
};

fn bytes(n: usize) -> TensorType {
    TensorType::new(DataType::Uint8, vec![n])
}

fn f32_tensor(shape: &[usize]) -> TensorType {
    TensorType::new(DataType::Float32, shape.to_vec())
}

// Two-layer perceptron:
//   h = x . w1, h2 = h + b1, a = max(h2, 0), y = a . w2
fn create_mlp_graph() -> Graph {
    let mut builder = GraphBuilder::new("mlp");
    let x = builder.parameter("x", f32_tensor(&[4, 8])).unwrap();
    let w1 = builder.parameter("w1", f32_tensor(&[8, 16])).unwrap();
    let b1 = builder.constant("b1", f32_tensor(&[4, 16])).unwrap();
    let h = builder.add_op(Op::Dot, &[x, w1]).unwrap();
    let h2 = builder.add_op(Op::Add, &[h, b1]).unwrap();
    let zero = builder.fill(f32_tensor(&[4, 16]), 0.0).unwrap();
    let a = builder.add_op(Op::Maximum, &[h2, zero]).unwrap();
    let w2 = builder.parameter("w2", f32_tensor(&[16, 2])).unwrap();
    let y = builder.add_op(Op::Dot, &[a, w2]).unwrap();
    builder.mark_output(y).unwrap();
    builder.build().unwrap()
}

/// Graph given directly as generators, consumers and sizes
struct ListGraph {
    order: Vec<NodeId>,
    outputs: HashMap<NodeId, Vec<TensorId>>,
    inputs: HashMap<NodeId, Vec<TensorId>>,
    consumers: HashMap<TensorId, Vec<NodeId>>,
    sizes: HashMap<TensorId, usize>,
    names: HashMap<TensorId, String>,
}

impl ListGraph {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            outputs: HashMap::new(),
            inputs: HashMap::new(),
            consumers: HashMap::new(),
            sizes: HashMap::new(),
            names: HashMap::new(),
        }
    }

    fn tensor(&mut self, id: usize, name: &str, size: usize) {
        self.sizes.insert(TensorId(id), size);
        self.names.insert(TensorId(id), name.to_string());
    }

    fn node(&mut self, id: usize, inputs: &[usize], outputs: &[usize]) {
        let node = NodeId(id);
        self.order.push(node);
        self.inputs.insert(node, inputs.iter().map(|&t| TensorId(t)).collect());
        self.outputs.insert(node, outputs.iter().map(|&t| TensorId(t)).collect());
        for &t in inputs {
            self.consumers.entry(TensorId(t)).or_default().push(node);
        }
    }
}

impl GraphView for ListGraph {
    fn graph_name(&self) -> &str {
        "list"
    }
    fn ordered_nodes(&self) -> &[NodeId] {
        &self.order
    }
    fn outputs_of(&self, node: NodeId) -> &[TensorId] {
        self.outputs.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }
    fn inputs_of(&self, node: NodeId) -> &[TensorId] {
        self.inputs.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }
    fn consumers_of(&self, tensor: TensorId) -> &[NodeId] {
        self.consumers.get(&tensor).map(Vec::as_slice).unwrap_or(&[])
    }
    fn size(&self, tensor: TensorId) -> usize {
        self.sizes.get(&tensor).copied().unwrap_or(0)
    }
    fn is_persistent(&self, _tensor: TensorId) -> bool {
        false
    }
    fn node_name(&self, _node: NodeId) -> &str {
        "op"
    }
    fn tensor_name(&self, tensor: TensorId) -> &str {
        self.names.get(&tensor).map(String::as_str).unwrap_or("")
    }
}

#[test]
fn test_single_unused_tensor() {
    let mut builder = GraphBuilder::new("single");
    builder.fill(bytes(100), 1.0).unwrap();
    let graph = builder.build().unwrap();

    let liveness = LivenessAnalysis::run(&graph).unwrap();
    let node = &liveness.nodes()[0];
    let t = TensorId(0);
    assert!(node.new.contains(&t));
    assert!(node.freed.contains(&t));
    assert!(node.live.contains(&t));

    let profile = MemoryAnalyzer::analyze(&graph, &liveness).unwrap();
    assert_eq!(profile.weight(0), Some(0));
    assert_eq!(profile.peak_footprint(), 100);
    assert_eq!(profile.age(t), Some(0));
}

#[test]
fn test_chain_peak_includes_tensors_freed_at_the_node() {
    let mut graph = ListGraph::new();
    graph.tensor(0, "a", 50);
    graph.tensor(1, "b", 30);
    graph.node(0, &[], &[0]);
    graph.node(1, &[0], &[1]);
    graph.node(2, &[1], &[]);

    let liveness = LivenessAnalysis::run(&graph).unwrap();
    assert_eq!(liveness.nodes()[1].freed.iter().copied().collect::<Vec<_>>(), vec![TensorId(0)]);
    assert_eq!(liveness.nodes()[2].freed.iter().copied().collect::<Vec<_>>(), vec![TensorId(1)]);
    assert_eq!(liveness.nodes()[1].live.len(), 2);

    let report = analyze(&graph, &AnalysisOptions::default()).unwrap();
    assert_eq!(report.peak_footprint, 80);
    assert_eq!(report.peak_node.as_ref().unwrap().position, 1);
    let names: Vec<&str> = report.tensor_table.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["b", "a"]);
}

#[test]
fn test_persistent_weight_not_counted() {
    let mut builder = GraphBuilder::new("weights");
    builder.parameter("w", bytes(1000)).unwrap();
    builder.fill(bytes(10), 0.0).unwrap();
    let graph = builder.build().unwrap();

    let report = analyze(&graph, &AnalysisOptions::default()).unwrap();
    assert_eq!(report.peak_footprint, 10);
    assert_eq!(report.persistent_footprint, 1000);
    assert_eq!(report.tensor_table.len(), 1);
}

#[test]
fn test_empty_graph() {
    let graph = GraphBuilder::new("empty").build().unwrap();
    let report = analyze(&graph, &AnalysisOptions::default()).unwrap();

    assert!(report.tensor_table.is_empty());
    assert!(report.weight_ranking.is_empty());
    assert!(report.timeline.is_empty());
    assert_eq!(report.peak_footprint, 1);
    assert!(report.peak_node.is_none());
}

#[test]
fn test_mlp_profile() {
    let graph = create_mlp_graph();
    let liveness = LivenessAnalysis::run(&graph).unwrap();
    let profile = MemoryAnalyzer::analyze(&graph, &liveness).unwrap();

    let footprints: Vec<usize> = profile.nodes.iter().map(|n| n.footprint).collect();
    assert_eq!(footprints, vec![0, 0, 0, 256, 512, 512, 768, 256, 256]);
    let weights: Vec<i64> = profile.nodes.iter().map(|n| n.weight).collect();
    assert_eq!(weights, vec![0, 0, 0, 256, 0, 256, -256, 0, -256]);
    assert_eq!(weights.iter().sum::<i64>(), 0);

    let peak = profile.peak.unwrap();
    assert_eq!(peak.position, 6);
    assert_eq!(graph.node_name(peak.node), "Maximum_6");
    assert_eq!(profile.naive_temporary_size, 1024);
    assert_eq!(profile.persistent_footprint, 128 + 512 + 256 + 128 + 32);
}

#[test]
fn test_live_set_rule_on_mlp() {
    let graph = create_mlp_graph();
    let liveness = LivenessAnalysis::run(&graph).unwrap();

    for node in liveness.nodes() {
        for lifetime in liveness.lifetimes() {
            let live = lifetime.generated_at <= node.position
                && lifetime.freed_at.map_or(true, |free| node.position <= free);
            assert_eq!(node.live.contains(&lifetime.tensor), live);
            assert_eq!(
                node.freed.contains(&lifetime.tensor),
                lifetime.freed_at == Some(node.position)
            );
            if let Some(age) = lifetime.age() {
                assert!(lifetime.freed_at.unwrap() >= lifetime.generated_at);
                assert_eq!(age, lifetime.freed_at.unwrap() - lifetime.generated_at);
            }
        }
    }
}

#[test]
fn test_mlp_report_views() {
    let graph = create_mlp_graph();
    let report = analyze(&graph, &AnalysisOptions::default()).unwrap();

    let rows: Vec<(&str, bool)> = report
        .tensor_table
        .iter()
        .map(|r| (r.name.as_str(), r.highlighted))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("Dot_3", false),
            ("Add_4", true),
            ("Fill_5", true),
            ("Maximum_6", true),
        ]
    );

    let ranking: Vec<usize> = report.weight_ranking.iter().map(|r| r.position).collect();
    assert_eq!(ranking, vec![3, 5, 0, 1, 2, 4, 7, 6, 8]);

    let peak = &report.timeline[6];
    assert_eq!(peak.footprint_fraction, 1.0);
    assert_eq!(peak.used_fraction, 1.0);
    assert_eq!(report.timeline[3].footprint_fraction, 256.0 / 768.0);
    assert_eq!(report.reuse_savings(), 1024 - 768);
}

#[test]
fn test_highlighting_can_be_disabled() {
    let graph = create_mlp_graph();
    let options = AnalysisOptions::new().highlight_peak(false);
    let report = analyze(&graph, &options).unwrap();
    assert_eq!(report.highlighted_tensors().count(), 0);
}

#[test]
fn test_analysis_is_idempotent() {
    let graph = create_mlp_graph();
    let options = AnalysisOptions::default();
    let first = analyze(&graph, &options).unwrap();
    let second = analyze(&graph, &options).unwrap();
    assert_eq!(first, second);

    let first_json = export_report(&first, ExportFormat::Json).unwrap();
    let second_json = export_report(&second, ExportFormat::Json).unwrap();
    assert_eq!(first_json, second_json);
}

#[test]
fn test_ordering_violation_reported() {
    let graph = create_mlp_graph();
    let mut order: Vec<NodeId> = graph.schedule().to_vec();
    order.swap(0, 3);
    let graph = graph.with_schedule(order).unwrap();

    match analyze(&graph, &AnalysisOptions::default()) {
        Err(Error::OrderingViolation { node_index, node, tensor }) => {
            assert_eq!(node_index, 0);
            assert_eq!(node, "Dot_3");
            assert_eq!(tensor, "x");
        }
        other => panic!("expected ordering violation, got {:?}", other),
    }
}

#[test]
fn test_resorted_schedule_analyzes_cleanly() {
    let graph = create_mlp_graph();
    let reference = analyze(&graph, &AnalysisOptions::default()).unwrap();

    let reversed: Vec<NodeId> = graph.schedule().iter().rev().copied().collect();
    let graph = graph.with_schedule(reversed).unwrap().topologically_sorted().unwrap();
    let report = analyze(&graph, &AnalysisOptions::default()).unwrap();
    assert_eq!(report, reference);
}

#[test]
fn test_write_reports_to_disk() -> anyhow::Result<()> {
    let graph = create_mlp_graph();
    let report = analyze(&graph, &AnalysisOptions::default())?;
    let dir = tempfile::tempdir()?;

    let json_path = dir.path().join("nested").join("mlp.json");
    write_report(&report, ExportFormat::Json, &json_path)?;
    let parsed: MemoryReport = serde_json::from_slice(&fs::read(&json_path)?)?;
    assert_eq!(parsed, report);

    let csv_path = dir.path().join("mlp.csv");
    write_report(&report, ExportFormat::Csv, &csv_path)?;
    let csv = fs::read_to_string(&csv_path)?;
    assert_eq!(csv.lines().count(), 1 + report.tensor_table.len());
    assert!(csv.lines().nth(1).unwrap_or("").starts_with("mlp,3,Dot_3,256,1,Dot_3,256,false"));

    let md_path = dir.path().join("mlp.md");
    write_report(&report, ExportFormat::Markdown, &md_path)?;
    let markdown = fs::read_to_string(&md_path)?;
    assert!(markdown.contains("- **Peak node**: Maximum_6 (position 6)"));
    assert!(markdown.contains("- **Peak temporary footprint**: 768 bytes"));
    Ok(())
}

#[test]
fn test_pass_writes_one_file_per_graph() -> anyhow::Result<()> {
    let mut builder = GraphBuilder::new("single");
    builder.fill(bytes(100), 1.0)?;
    let graphs = vec![create_mlp_graph(), builder.build()?];

    let options = AnalysisOptions::new()
        .enable_parallel(true)
        .set_export_format(ExportFormat::Csv);
    let pass = MemoryReportPass::new(options);
    assert_eq!(pass.name(), "MemoryReport");

    let dir = tempfile::tempdir()?;
    let result = pass.run_to_dir(&graphs, dir.path())?;
    assert_eq!(result.graphs_analyzed, 2);
    assert_eq!(result.max_peak_footprint, 768);
    assert!(dir.path().join("mlp.csv").exists());
    assert!(dir.path().join("single.csv").exists());
    Ok(())
}
