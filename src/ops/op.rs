use strum_macros::EnumDiscriminants;

use crate::error::{Error, Result};
use crate::model::TensorType;

/// Operation applied by a node, with its parameters.
///
/// The set of operations is closed. Only the graph builder looks at the
/// parameters (to derive output types); liveness analysis sees nodes through
/// [`crate::graph::GraphView`] and never matches on `Op`.
#[derive(Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(OpKind))]
#[strum_discriminants(derive(
    Hash,
    PartialOrd,
    Ord,
    strum_macros::Display,
    strum_macros::IntoStaticStr,
    strum_macros::EnumIter
))]
pub enum Op {
    /// Graph input supplied by the caller
    Parameter,
    /// Constant data baked into the graph
    Constant,
    /// Tensor filled with a single value
    Fill { value: f64 },
    /// Replicate the argument along `broadcast_axes` to produce `shape`
    Broadcast {
        shape: Vec<usize>,
        broadcast_axes: Vec<usize>,
    },
    Dot,
    Tan,
    Exp,
    Negative,
    Abs,
    Add,
    Subtract,
    Multiply,
    Divide,
    Maximum,
}

impl Op {
    /// Kind of this operation (the flyweight key)
    pub fn kind(&self) -> OpKind {
        OpKind::from(self)
    }

    /// Derive the output type from argument types
    pub fn infer_output_type(&self, args: &[&TensorType]) -> Result<TensorType> {
        let kind = self.kind();
        if args.len() != kind.arity() {
            return Err(Error::InvalidOperator(format!(
                "{} expects {} argument(s), got {}",
                kind,
                kind.arity(),
                args.len()
            )));
        }

        match self {
            Op::Parameter | Op::Constant | Op::Fill { .. } => Err(Error::InvalidOperator(format!(
                "{} has no arguments to infer its type from; declare the type explicitly",
                kind
            ))),
            Op::Broadcast {
                shape,
                broadcast_axes,
            } => {
                let arg = args[0];
                if let Some(&axis) = broadcast_axes.iter().find(|&&axis| axis >= shape.len()) {
                    return Err(Error::InvalidOperator(format!(
                        "Broadcast axis {} out of range for result rank {}",
                        axis,
                        shape.len()
                    )));
                }
                // The remaining axes of the result must match the argument
                let kept: Vec<usize> = shape
                    .iter()
                    .enumerate()
                    .filter(|(axis, _)| !broadcast_axes.contains(axis))
                    .map(|(_, &dim)| dim)
                    .collect();
                if kept != arg.shape {
                    return Err(Error::InvalidOperator(format!(
                        "Cannot broadcast shape {:?} to {:?} along axes {:?}",
                        arg.shape, shape, broadcast_axes
                    )));
                }
                Ok(TensorType::new(arg.data_type, shape.clone()))
            }
            Op::Dot => Self::infer_dot(args[0], args[1]),
            Op::Tan | Op::Exp | Op::Negative | Op::Abs => Ok(args[0].clone()),
            Op::Add | Op::Subtract | Op::Multiply | Op::Divide | Op::Maximum => {
                let (lhs, rhs) = (args[0], args[1]);
                if lhs != rhs {
                    return Err(Error::InvalidOperator(format!(
                        "{} requires matching argument types, got {} and {}",
                        kind, lhs, rhs
                    )));
                }
                Ok(lhs.clone())
            }
        }
    }

    fn infer_dot(lhs: &TensorType, rhs: &TensorType) -> Result<TensorType> {
        if lhs.data_type != rhs.data_type {
            return Err(Error::InvalidOperator(format!(
                "Dot requires matching element types, got {:?} and {:?}",
                lhs.data_type, rhs.data_type
            )));
        }

        let shape = match (lhs.shape.as_slice(), rhs.shape.as_slice()) {
            // Scalar scaling
            ([], other) | (other, []) => other.to_vec(),
            ([k1], [k2]) if k1 == k2 => Vec::new(),
            ([m, k1], [k2]) if k1 == k2 => vec![*m],
            ([k1], [k2, n]) if k1 == k2 => vec![*n],
            ([m, k1], [k2, n]) if k1 == k2 => vec![*m, *n],
            _ => {
                return Err(Error::InvalidOperator(format!(
                    "Dot reduction axes do not match: {:?} and {:?}",
                    lhs.shape, rhs.shape
                )))
            }
        };

        Ok(TensorType::new(lhs.data_type, shape))
    }
}

impl OpKind {
    /// Number of arguments the operation takes
    pub fn arity(self) -> usize {
        match self {
            OpKind::Parameter | OpKind::Constant | OpKind::Fill => 0,
            OpKind::Broadcast | OpKind::Tan | OpKind::Exp | OpKind::Negative | OpKind::Abs => 1,
            OpKind::Dot
            | OpKind::Add
            | OpKind::Subtract
            | OpKind::Multiply
            | OpKind::Divide
            | OpKind::Maximum => 2,
        }
    }

    /// Source ops produce tensors without consuming any
    pub fn is_source(self) -> bool {
        self.arity() == 0
    }

    /// Whether outputs of this kind live for the whole execution
    pub fn has_persistent_output(self) -> bool {
        matches!(self, OpKind::Parameter | OpKind::Constant)
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}
