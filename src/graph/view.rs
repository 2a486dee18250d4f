use crate::model::{Graph, NodeId, TensorId};

/// Read-only view of a scheduled graph, as needed by the memory analysis
///
/// Handles that do not belong to the graph yield empty slices, zero sizes
/// and empty names.
pub trait GraphView {
    /// Name used in reports
    fn graph_name(&self) -> &str {
        "graph"
    }

    /// Nodes in execution order
    fn ordered_nodes(&self) -> &[NodeId];

    /// Tensors generated by `node`
    fn outputs_of(&self, node: NodeId) -> &[TensorId];

    /// Tensors read by `node`
    fn inputs_of(&self, node: NodeId) -> &[TensorId];

    /// Nodes that read `tensor`
    fn consumers_of(&self, tensor: TensorId) -> &[NodeId];

    /// Size of `tensor` in bytes
    fn size(&self, tensor: TensorId) -> usize;

    fn is_persistent(&self, tensor: TensorId) -> bool;

    fn node_name(&self, node: NodeId) -> &str;

    fn tensor_name(&self, tensor: TensorId) -> &str;
}

impl GraphView for Graph {
    fn graph_name(&self) -> &str {
        self.name()
    }

    fn ordered_nodes(&self) -> &[NodeId] {
        self.schedule()
    }

    fn outputs_of(&self, node: NodeId) -> &[TensorId] {
        self.node(node).map(|n| n.outputs.as_slice()).unwrap_or(&[])
    }

    fn inputs_of(&self, node: NodeId) -> &[TensorId] {
        self.node(node).map(|n| n.inputs.as_slice()).unwrap_or(&[])
    }

    fn consumers_of(&self, tensor: TensorId) -> &[NodeId] {
        self.consumers(tensor)
    }

    fn size(&self, tensor: TensorId) -> usize {
        self.tensor(tensor).map(|t| t.size_bytes).unwrap_or(0)
    }

    fn is_persistent(&self, tensor: TensorId) -> bool {
        self.tensor(tensor).map(|t| t.persistent).unwrap_or(false)
    }

    fn node_name(&self, node: NodeId) -> &str {
        self.node(node).map(|n| n.name.as_str()).unwrap_or("")
    }

    fn tensor_name(&self, tensor: TensorId) -> &str {
        self.tensor(tensor).map(|t| t.name.as_str()).unwrap_or("")
    }
}
