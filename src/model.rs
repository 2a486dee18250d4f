use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ops::{Op, OpDescriptor, OpHandle, OpRegistry};

/// Index of a node in the graph's node arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Index of a tensor in the graph's tensor arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TensorId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for TensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Element types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Float32,
    Float64,
    Float16,
    BFloat16,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Bool,
}

impl DataType {
    /// Width of one element in bytes
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DataType::Int8 | DataType::Uint8 | DataType::Bool => 1,
            DataType::Float16 | DataType::BFloat16 | DataType::Int16 | DataType::Uint16 => 2,
            DataType::Float32 | DataType::Int32 | DataType::Uint32 => 4,
            DataType::Float64 | DataType::Int64 | DataType::Uint64 => 8,
        }
    }
}

/// Element type and shape of a tensor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorType {
    pub data_type: DataType,
    pub shape: Vec<usize>,
}

impl TensorType {
    pub fn new(data_type: DataType, shape: Vec<usize>) -> Self {
        Self { data_type, shape }
    }

    pub fn scalar(data_type: DataType) -> Self {
        Self::new(data_type, Vec::new())
    }

    /// Number of elements, failing on overflow
    pub fn element_count(&self) -> Result<usize> {
        self.shape.iter().try_fold(1usize, |acc, &dim| {
            acc.checked_mul(dim).ok_or_else(|| {
                Error::SizeOverflow(format!("Element count of shape {:?} overflows", self.shape))
            })
        })
    }

    /// Storage size in bytes, failing on overflow
    pub fn size_in_bytes(&self) -> Result<usize> {
        let elements = self.element_count()?;
        let element_size = self.data_type.size_in_bytes();
        elements.checked_mul(element_size).ok_or_else(|| {
            Error::SizeOverflow(format!(
                "{} elements of size {} bytes overflow for shape {:?}",
                elements, element_size, self.shape
            ))
        })
    }
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{:?}", self.data_type, self.shape)
    }
}

/// A storage unit produced by exactly one node
#[derive(Debug, Clone, PartialEq)]
pub struct TensorDescriptor {
    pub id: TensorId,
    pub name: String,
    pub tensor_type: TensorType,
    pub size_bytes: usize,
    /// Persistent tensors (parameters, constants, graph outputs) stay
    /// allocated for the whole execution
    pub persistent: bool,
    pub generator: NodeId,
}

/// One scheduled operation instance
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub op: Op,
    /// Shared descriptor of this node's operation kind
    pub descriptor: OpHandle,
    /// Dataflow predecessors, in argument order
    pub arguments: Vec<NodeId>,
    pub inputs: Vec<TensorId>,
    pub outputs: Vec<TensorId>,
}

/// Dataflow graph with its registry, arenas and schedule
#[derive(Debug, Clone)]
pub struct Graph {
    name: String,
    registry: OpRegistry,
    nodes: Vec<Node>,
    tensors: Vec<TensorDescriptor>,
    consumers: Vec<Vec<NodeId>>,
    schedule: Vec<NodeId>,
}

impl Graph {
    /// Assemble a graph from arenas; consumers are derived from node inputs
    pub(crate) fn from_parts(
        name: String,
        registry: OpRegistry,
        nodes: Vec<Node>,
        tensors: Vec<TensorDescriptor>,
        schedule: Vec<NodeId>,
    ) -> Result<Self> {
        let mut consumers = vec![Vec::new(); tensors.len()];
        for node in &nodes {
            for &input in &node.inputs {
                let list: &mut Vec<NodeId> = consumers.get_mut(input.0).ok_or_else(|| {
                    Error::InvalidGraph(format!(
                        "Node {} consumes unknown tensor {}",
                        node.name, input
                    ))
                })?;
                if !list.contains(&node.id) {
                    list.push(node.id);
                }
            }
        }

        let graph = Self {
            name,
            registry,
            nodes,
            tensors,
            consumers,
            schedule: Vec::new(),
        };
        graph.with_schedule(schedule)
    }

    /// Replace the schedule with another ordering of the same nodes
    ///
    /// Only checks that `schedule` is a permutation of the node set; whether
    /// it respects dataflow order is reported by the liveness pass.
    pub fn with_schedule(mut self, schedule: Vec<NodeId>) -> Result<Self> {
        if schedule.len() != self.nodes.len() {
            return Err(Error::InvalidGraph(format!(
                "Schedule has {} entries but graph {} has {} nodes",
                schedule.len(),
                self.name,
                self.nodes.len()
            )));
        }

        let mut seen = HashSet::with_capacity(schedule.len());
        for &node_id in &schedule {
            if node_id.0 >= self.nodes.len() {
                return Err(Error::InvalidGraph(format!(
                    "Schedule references unknown node {}",
                    node_id
                )));
            }
            if !seen.insert(node_id) {
                return Err(Error::InvalidGraph(format!(
                    "Node {} is scheduled more than once",
                    self.nodes[node_id.0].name
                )));
            }
        }

        self.schedule = schedule;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &OpRegistry {
        &self.registry
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn tensor(&self, id: TensorId) -> Option<&TensorDescriptor> {
        self.tensors.get(id.0)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn tensors(&self) -> &[TensorDescriptor] {
        &self.tensors
    }

    /// Nodes in execution order
    pub fn schedule(&self) -> &[NodeId] {
        &self.schedule
    }

    /// Nodes that read `tensor`, in creation order
    pub fn consumers(&self, tensor: TensorId) -> &[NodeId] {
        self.consumers.get(tensor.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Descriptor of the operation applied by `node`
    pub fn descriptor(&self, node: NodeId) -> Result<&OpDescriptor> {
        let node = self
            .node(node)
            .ok_or_else(|| Error::InvalidGraph(format!("Unknown node {}", node)))?;
        self.registry.descriptor(node.descriptor)
    }

    /// Human-readable description of a node (its operation name)
    pub fn description(&self, node: NodeId) -> Result<&str> {
        Ok(self.descriptor(node)?.name)
    }

    /// Tensors that stay allocated for the whole execution
    pub fn persistent_tensors(&self) -> impl Iterator<Item = &TensorDescriptor> {
        self.tensors.iter().filter(|t| t.persistent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_sizes() {
        let ty = TensorType::new(DataType::Float16, vec![3, 5]);
        assert_eq!(ty.element_count().unwrap(), 15);
        assert_eq!(ty.size_in_bytes().unwrap(), 30);

        let scalar = TensorType::scalar(DataType::Int64);
        assert_eq!(scalar.size_in_bytes().unwrap(), 8);

        let empty = TensorType::new(DataType::Float32, vec![4, 0]);
        assert_eq!(empty.size_in_bytes().unwrap(), 0);

        let huge = TensorType::new(DataType::Float64, vec![usize::MAX / 4]);
        assert!(matches!(huge.size_in_bytes(), Err(Error::SizeOverflow(_))));
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(NodeId(3).to_string(), "n3");
        assert_eq!(TensorId(7).to_string(), "t7");
    }
}
