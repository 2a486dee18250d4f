use std::collections::HashMap;

use crate::error::{Error, Result};
use super::op::OpKind;

/// Index of an interned operation descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpHandle(usize);

impl OpHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Shared description of one operation kind
///
/// Every node of the same kind refers to the same descriptor, so two nodes
/// can be matched by comparing handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpDescriptor {
    pub kind: OpKind,
    pub name: &'static str,
    pub arity: usize,
}

/// Registry of operation descriptors, one per kind
#[derive(Debug, Default, Clone)]
pub struct OpRegistry {
    descriptors: Vec<OpDescriptor>,
    index: HashMap<OpKind, OpHandle>,
}

impl OpRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Return the handle for `kind`, registering its descriptor on first use
    pub fn intern(&mut self, kind: OpKind) -> OpHandle {
        if let Some(&handle) = self.index.get(&kind) {
            return handle;
        }

        let handle = OpHandle(self.descriptors.len());
        self.descriptors.push(OpDescriptor {
            kind,
            name: kind.name(),
            arity: kind.arity(),
        });
        self.index.insert(kind, handle);
        handle
    }

    /// Look up the handle of an already registered kind
    pub fn lookup(&self, kind: OpKind) -> Option<OpHandle> {
        self.index.get(&kind).copied()
    }

    pub fn get(&self, handle: OpHandle) -> Option<&OpDescriptor> {
        self.descriptors.get(handle.0)
    }

    /// Get a descriptor, failing on handles from another registry
    pub fn descriptor(&self, handle: OpHandle) -> Result<&OpDescriptor> {
        self.get(handle).ok_or_else(|| {
            Error::InvalidOperator(format!(
                "Operator handle {} is not registered ({} descriptors known)",
                handle.0,
                self.descriptors.len()
            ))
        })
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OpHandle, &OpDescriptor)> {
        self.descriptors
            .iter()
            .enumerate()
            .map(|(i, descriptor)| (OpHandle(i), descriptor))
    }
}
