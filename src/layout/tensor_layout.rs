use std::fmt;

use crate::error::{Error, Result};

/// Order in which the elements of a layout are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryOrder {
    /// C-contiguous, last axis varies fastest
    RowMajor,
    /// Fortran-contiguous, first axis varies fastest
    ColumnMajor,
    /// Anything else (gaps, offsets, broadcast axes)
    Strided,
}

/// A tensor layout defines the shape, strides, and offset of a tensor in memory.
/// It describes how the logical indices of a tensor are mapped to physical memory locations.
#[derive(Clone, PartialEq, Eq)]
pub struct TensorLayout {
    /// The shape of the tensor (dimensions)
    shape: Vec<usize>,
    /// The strides of the tensor (number of elements to skip in each dimension)
    strides: Vec<usize>,
    /// The offset from the start of the memory buffer
    offset: usize,
}

impl TensorLayout {
    /// Create a layout with explicit strides and offset.
    pub fn new(shape: &[usize], strides: &[usize], offset: usize) -> Result<Self> {
        if shape.len() != strides.len() {
            return Err(Error::IncompatibleLayout(format!(
                "Shape {:?} and strides {:?} must have the same length",
                shape, strides
            )));
        }

        Ok(Self {
            shape: shape.to_vec(),
            strides: strides.to_vec(),
            offset,
        })
    }

    /// Create a standard contiguous (row-major) layout for the given shape.
    pub fn contiguous_layout(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            strides: Self::compute_contiguous_strides(shape),
            offset: 0,
        }
    }

    /// Create a contiguous column-major layout for the given shape.
    pub fn column_major_layout(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            strides: Self::compute_fortran_strides(shape),
            offset: 0,
        }
    }

    /// Calculate contiguous strides for a given shape in row-major (C-style) order.
    /// e.g., for shape [2, 3, 4], strides would be [12, 4, 1]
    fn compute_contiguous_strides(shape: &[usize]) -> Vec<usize> {
        let mut strides = vec![1; shape.len()];
        for i in (1..shape.len()).rev() {
            strides[i - 1] = strides[i] * shape[i];
        }
        strides
    }

    /// Calculate Fortran-style (column-major) contiguous strides.
    /// e.g., for shape [2, 3, 4], strides would be [1, 2, 6]
    fn compute_fortran_strides(shape: &[usize]) -> Vec<usize> {
        let mut strides = vec![1; shape.len()];
        for i in 1..shape.len() {
            strides[i] = strides[i - 1] * shape[i - 1];
        }
        strides
    }

    /// Storage order of this layout. Rank-0 and rank-1 contiguous layouts are row-major.
    pub fn memory_order(&self) -> MemoryOrder {
        if self.offset != 0 {
            MemoryOrder::Strided
        } else if self.strides == Self::compute_contiguous_strides(&self.shape) {
            MemoryOrder::RowMajor
        } else if self.strides == Self::compute_fortran_strides(&self.shape) {
            MemoryOrder::ColumnMajor
        } else {
            MemoryOrder::Strided
        }
    }

    /// Whether two tensors with these layouts can be compared element by element.
    ///
    /// Contiguous layouts of the same order are compatible whatever their shape;
    /// the shapes themselves are compared by the caller.
    pub fn is_compatible_with(&self, other: &TensorLayout) -> bool {
        match (self.memory_order(), other.memory_order()) {
            (MemoryOrder::Strided, _) | (_, MemoryOrder::Strided) => self == other,
            (a, b) => a == b,
        }
    }

    /// Return the shape of the tensor.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }
}

impl fmt::Debug for TensorLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TensorLayout {{ shape: {:?}, strides: {:?}, offset: {} }}",
            self.shape, self.strides, self.offset
        )
    }
}
