use log::{debug, trace};

use crate::error::{Error, Result};
use crate::model::{Graph, Node, NodeId, TensorDescriptor, TensorId, TensorType};
use crate::ops::{Op, OpKind, OpRegistry};

/// Builds a [`Graph`] node by node
///
/// Arguments must exist before they are used, so creation order is already a
/// valid topological order and becomes the graph's schedule.
#[derive(Debug)]
pub struct GraphBuilder {
    name: String,
    registry: OpRegistry,
    nodes: Vec<Node>,
    tensors: Vec<TensorDescriptor>,
}

impl GraphBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            registry: OpRegistry::new(),
            nodes: Vec::new(),
            tensors: Vec::new(),
        }
    }

    /// Add a graph input; its tensor is persistent
    pub fn parameter(&mut self, name: &str, tensor_type: TensorType) -> Result<NodeId> {
        self.push_node(name.to_string(), Op::Parameter, &[], tensor_type)
    }

    /// Add constant data; its tensor is persistent
    pub fn constant(&mut self, name: &str, tensor_type: TensorType) -> Result<NodeId> {
        self.push_node(name.to_string(), Op::Constant, &[], tensor_type)
    }

    /// Add a node producing a temporary tensor filled with `value`
    pub fn fill(&mut self, tensor_type: TensorType, value: f64) -> Result<NodeId> {
        let name = self.default_name(OpKind::Fill);
        self.push_node(name, Op::Fill { value }, &[], tensor_type)
    }

    /// Add an operation; its output type is inferred from the arguments
    pub fn add_op(&mut self, op: Op, arguments: &[NodeId]) -> Result<NodeId> {
        let name = self.default_name(op.kind());
        self.add_named_op(&name, op, arguments)
    }

    pub fn add_named_op(&mut self, name: &str, op: Op, arguments: &[NodeId]) -> Result<NodeId> {
        if op.kind().is_source() {
            return Err(Error::InvalidOperator(format!(
                "{} nodes must be created with parameter(), constant() or fill()",
                op.kind()
            )));
        }

        let arg_types = arguments
            .iter()
            .map(|&arg| self.output_type(arg))
            .collect::<Result<Vec<_>>>()?;
        let output_type = op.infer_output_type(&arg_types)?;

        self.push_node(name.to_string(), op, arguments, output_type)
    }

    /// Mark the outputs of `node` as graph outputs, which makes them persistent
    pub fn mark_output(&mut self, node: NodeId) -> Result<()> {
        let outputs = self
            .nodes
            .get(node.0)
            .map(|n| n.outputs.clone())
            .ok_or_else(|| Error::InvalidGraph(format!("Unknown node {}", node)))?;

        for tensor in outputs {
            self.tensors[tensor.0].persistent = true;
        }
        Ok(())
    }

    /// Finish the graph, scheduling nodes in creation order
    pub fn build(self) -> Result<Graph> {
        let schedule = self.nodes.iter().map(|n| n.id).collect();
        debug!(
            "Built graph {} with {} nodes, {} tensors, {} operator kinds",
            self.name,
            self.nodes.len(),
            self.tensors.len(),
            self.registry.len()
        );
        Graph::from_parts(self.name, self.registry, self.nodes, self.tensors, schedule)
    }

    fn default_name(&self, kind: OpKind) -> String {
        format!("{}_{}", kind, self.nodes.len())
    }

    /// Type of the single output of `node`
    fn output_type(&self, node: NodeId) -> Result<&TensorType> {
        let node = self
            .nodes
            .get(node.0)
            .ok_or_else(|| Error::InvalidGraph(format!("Unknown argument node {}", node)))?;
        match node.outputs.as_slice() {
            [tensor] => Ok(&self.tensors[tensor.0].tensor_type),
            outputs => Err(Error::InvalidGraph(format!(
                "Argument node {} has {} outputs, expected exactly one",
                node.name,
                outputs.len()
            ))),
        }
    }

    fn push_node(
        &mut self,
        name: String,
        op: Op,
        arguments: &[NodeId],
        output_type: TensorType,
    ) -> Result<NodeId> {
        let kind = op.kind();
        if arguments.len() != kind.arity() {
            return Err(Error::InvalidOperator(format!(
                "{} expects {} argument(s), got {}",
                kind,
                kind.arity(),
                arguments.len()
            )));
        }
        if self.nodes.iter().any(|n| n.name == name) {
            return Err(Error::InvalidGraph(format!("Duplicate node name {}", name)));
        }

        let mut inputs = Vec::new();
        for &arg in arguments {
            let node = self
                .nodes
                .get(arg.0)
                .ok_or_else(|| Error::InvalidGraph(format!("Unknown argument node {}", arg)))?;
            inputs.extend(node.outputs.iter().copied());
        }

        let id = NodeId(self.nodes.len());
        let tensor_id = TensorId(self.tensors.len());
        let size_bytes = output_type.size_in_bytes()?;
        self.tensors.push(TensorDescriptor {
            id: tensor_id,
            name: name.clone(),
            tensor_type: output_type,
            size_bytes,
            persistent: kind.has_persistent_output(),
            generator: id,
        });

        let descriptor = self.registry.intern(kind);
        trace!("Adding node {} ({}) with {} inputs", name, kind, inputs.len());
        self.nodes.push(Node {
            id,
            name,
            op,
            descriptor,
            arguments: arguments.to_vec(),
            inputs,
            outputs: vec![tensor_id],
        });

        Ok(id)
    }
}
