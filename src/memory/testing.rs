use std::collections::{BTreeSet, HashMap};

use crate::graph::GraphView;
use crate::model::{NodeId, TensorId};

/// Graph view with explicit tensors, for cases the builder refuses
#[derive(Default)]
pub(crate) struct FakeGraph {
    pub order: Vec<NodeId>,
    pub outputs: HashMap<NodeId, Vec<TensorId>>,
    pub inputs: HashMap<NodeId, Vec<TensorId>>,
    pub consumers: HashMap<TensorId, Vec<NodeId>>,
    pub sizes: HashMap<TensorId, usize>,
    pub persistent: BTreeSet<TensorId>,
}

impl FakeGraph {
    pub fn node(&mut self, id: usize, inputs: &[usize], outputs: &[usize]) {
        let node = NodeId(id);
        self.order.push(node);
        self.outputs
            .insert(node, outputs.iter().map(|&t| TensorId(t)).collect());
        self.inputs
            .insert(node, inputs.iter().map(|&t| TensorId(t)).collect());
        for &t in inputs {
            let consumers = self.consumers.entry(TensorId(t)).or_default();
            if !consumers.contains(&node) {
                consumers.push(node);
            }
        }
    }

    pub fn sized(mut self, tensor: usize, size: usize) -> Self {
        self.sizes.insert(TensorId(tensor), size);
        self
    }

    pub fn persist(mut self, tensor: usize) -> Self {
        self.persistent.insert(TensorId(tensor));
        self
    }
}

impl GraphView for FakeGraph {
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
    fn is_persistent(&self, tensor: TensorId) -> bool {
        self.persistent.contains(&tensor)
    }
    fn node_name(&self, _node: NodeId) -> &str {
        "node"
    }
    fn tensor_name(&self, _tensor: TensorId) -> &str {
        "tensor"
    }
}
