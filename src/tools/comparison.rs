use ndarray::ArrayD;
use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::TensorLayout;

/// Default relative tolerance, as numpy.allclose
pub const DEFAULT_RTOL: f64 = 1e-5;
/// Default absolute tolerance, as numpy.allclose
pub const DEFAULT_ATOL: f64 = 1e-8;

/// Element-wise closeness: `|a_i - b_i| <= atol + rtol * |b_i|` for every `i`
///
/// NaN is never close to anything.
pub fn all_close<T: Float>(a: &[T], b: &[T], rtol: T, atol: T) -> Result<bool> {
    if a.len() != b.len() {
        return Err(Error::ShapeMismatch(format!(
            "Cannot compare {} elements with {} elements",
            a.len(),
            b.len()
        )));
    }
    Ok(a.iter().zip(b).all(|(&x, &y)| is_close(x, y, rtol, atol)))
}

fn is_close<T: Float>(a: T, b: T, rtol: T, atol: T) -> bool {
    (a - b).abs() <= atol + rtol * b.abs()
}

/// Tensor data together with the layout it was produced in
#[derive(Debug, Clone, PartialEq)]
pub struct TensorView<T> {
    layout: TensorLayout,
    data: ArrayD<T>,
}

impl<T> TensorView<T> {
    /// View with a row-major layout matching the array's shape
    pub fn new(data: ArrayD<T>) -> Self {
        Self {
            layout: TensorLayout::contiguous_layout(data.shape()),
            data,
        }
    }

    pub fn with_layout(layout: TensorLayout, data: ArrayD<T>) -> Result<Self> {
        if layout.shape() != data.shape() {
            return Err(Error::ShapeMismatch(format!(
                "Layout shape {:?} does not match data shape {:?}",
                layout.shape(),
                data.shape()
            )));
        }
        Ok(Self { layout, data })
    }

    pub fn layout(&self) -> &TensorLayout {
        &self.layout
    }

    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ArrayD<T> {
        &mut self.data
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }
}

/// Compare two tensors; different shapes are simply not close
pub fn all_close_tensors<T: Float>(
    a: &TensorView<T>,
    b: &TensorView<T>,
    rtol: T,
    atol: T,
) -> Result<bool> {
    if !a.layout.is_compatible_with(&b.layout) {
        return Err(Error::IncompatibleLayout(format!(
            "Cannot compare tensors with layouts {:?} and {:?}",
            a.layout, b.layout
        )));
    }
    if a.shape() != b.shape() {
        return Ok(false);
    }

    Ok(a
        .data
        .iter()
        .zip(b.data.iter())
        .all(|(&x, &y)| is_close(x, y, rtol, atol)))
}

/// Compare two lists of tensors pairwise; lists of different length are not close
pub fn all_close_all<T: Float>(
    a: &[TensorView<T>],
    b: &[TensorView<T>],
    rtol: T,
    atol: T,
) -> Result<bool> {
    if a.len() != b.len() {
        return Ok(false);
    }
    for (x, y) in a.iter().zip(b) {
        if !all_close_tensors(x, y, rtol, atol)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Difference metrics between a reference and a test tensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectnessMetrics {
    /// Maximum absolute difference
    pub max_abs_difference: f64,
    /// Maximum relative difference
    pub max_rel_difference: f64,
    /// Average absolute difference
    pub avg_abs_difference: f64,
    /// Percentage of elements within tolerance
    pub percent_within_tolerance: f64,
}

/// Measure how far `test` is from `reference`
pub fn compare_values<T: Float>(
    reference: &[T],
    test: &[T],
    rtol: T,
    atol: T,
) -> Result<CorrectnessMetrics> {
    if reference.len() != test.len() {
        return Err(Error::ShapeMismatch(format!(
            "Tensor element count mismatch: {} vs {}",
            reference.len(),
            test.len()
        )));
    }

    let mut max_abs_difference = 0.0f64;
    let mut max_rel_difference = 0.0f64;
    let mut total_abs_difference = 0.0f64;
    let mut within_tolerance = 0usize;

    for (&r, &t) in reference.iter().zip(test) {
        let ref_val = r.to_f64().unwrap_or(f64::NAN);
        let test_val = t.to_f64().unwrap_or(f64::NAN);

        let abs_diff = (ref_val - test_val).abs();
        let rel_diff = if ref_val.abs() > 1e-10 {
            abs_diff / ref_val.abs()
        } else {
            abs_diff
        };

        max_abs_difference = max_abs_difference.max(abs_diff);
        max_rel_difference = max_rel_difference.max(rel_diff);
        total_abs_difference += abs_diff;
        if is_close(t, r, rtol, atol) {
            within_tolerance += 1;
        }
    }

    let count = reference.len();
    let (avg_abs_difference, percent_within_tolerance) = if count > 0 {
        (
            total_abs_difference / count as f64,
            within_tolerance as f64 / count as f64 * 100.0,
        )
    } else {
        (0.0, 100.0)
    };

    Ok(CorrectnessMetrics {
        max_abs_difference,
        max_rel_difference,
        avg_abs_difference,
        percent_within_tolerance,
    })
}
