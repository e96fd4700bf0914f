// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Tensor alias and the small set of array helpers the engine relies on
//!
//! All state is `ArrayD<f32>` with the batch dimension first. Helpers that need a
//! fixed rank convert views with `into_dimensionality` and report a typed error
//! instead of panicking.

use core::fmt;

use ndarray::{ArrayD, ArrayView2, Axis, Ix2, IxDyn};
use serde::{Deserialize, Serialize};

use super::error::{NeuralError, Result};

/// Dynamic-rank, owned `f32` array. Batch dimension first.
pub type Tensor = ArrayD<f32>;

/// Tensor of zeros with the given shape
pub fn zeros(shape: &[usize]) -> Tensor {
    ArrayD::zeros(IxDyn(shape))
}

/// Tensor filled with `value`
pub fn full(shape: &[usize], value: f32) -> Tensor {
    ArrayD::from_elem(IxDyn(shape), value)
}

/// Zero-dimensional tensor holding `value`
pub fn scalar(value: f32) -> Tensor {
    ArrayD::from_elem(IxDyn(&[]), value)
}

/// View a tensor as a matrix, failing with a shape error otherwise
pub fn as_matrix<'a>(tensor: &'a Tensor, what: &str) -> Result<ArrayView2<'a, f32>> {
    tensor.view().into_dimensionality::<Ix2>().map_err(|_| {
        NeuralError::invalid_shape(what, format!("expected rank 2, got shape {:?}", tensor.shape()))
    })
}

/// Matrix product `a · b`
pub fn matmul(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    let a2 = as_matrix(a, "matmul lhs")?;
    let b2 = as_matrix(b, "matmul rhs")?;
    if a2.ncols() != b2.nrows() {
        return Err(NeuralError::shape_mismatch(
            "matmul inner dimension",
            &[a2.ncols()],
            &[b2.nrows()],
        ));
    }
    Ok(a2.dot(&b2).into_dyn())
}

/// Matrix product `aᵀ · b` (outer-product accumulation over the batch)
pub fn transpose_matmul(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    let a2 = as_matrix(a, "transpose_matmul lhs")?;
    let b2 = as_matrix(b, "transpose_matmul rhs")?;
    if a2.nrows() != b2.nrows() {
        return Err(NeuralError::shape_mismatch(
            "transpose_matmul batch dimension",
            &[a2.nrows()],
            &[b2.nrows()],
        ));
    }
    Ok(a2.t().dot(&b2).into_dyn())
}

/// Sum over the batch axis, keeping it as a length-1 axis
pub fn sum_batch(tensor: &Tensor) -> Tensor {
    if tensor.ndim() == 0 {
        return tensor.clone();
    }
    tensor.sum_axis(Axis(0)).insert_axis(Axis(0))
}

/// Broadcast `value` to the shape of `like`
pub fn broadcast_to(value: &Tensor, like: &[usize], what: &str) -> Result<Tensor> {
    value
        .broadcast(IxDyn(like))
        .map(|view| view.to_owned())
        .ok_or_else(|| NeuralError::shape_mismatch(what, like, value.shape()))
}

/// `a + b` with `b` broadcast to the shape of `a`
pub fn add_broadcast(a: &Tensor, b: &Tensor, what: &str) -> Result<Tensor> {
    let view = b
        .broadcast(a.raw_dim())
        .ok_or_else(|| NeuralError::shape_mismatch(what, a.shape(), b.shape()))?;
    Ok(a + &view)
}

/// `a * b` with `b` broadcast to the shape of `a`
pub fn mul_broadcast(a: &Tensor, b: &Tensor, what: &str) -> Result<Tensor> {
    let view = b
        .broadcast(a.raw_dim())
        .ok_or_else(|| NeuralError::shape_mismatch(what, a.shape(), b.shape()))?;
    Ok(a * &view)
}

/// Fail unless `tensor` has exactly `expected` shape
pub fn ensure_shape(tensor: &Tensor, expected: &[usize], what: &str) -> Result<()> {
    if tensor.shape() != expected {
        return Err(NeuralError::shape_mismatch(what, expected, tensor.shape()));
    }
    Ok(())
}

/// Elementwise sign with `sign(0) = 0`
pub fn sign(tensor: &Tensor) -> Tensor {
    tensor.mapv(|x| {
        if x > 0.0 {
            1.0
        } else if x < 0.0 {
            -1.0
        } else {
            0.0
        }
    })
}

/// Elementwise clip into `[lo, hi]`
pub fn clip(tensor: &Tensor, lo: f32, hi: f32) -> Tensor {
    tensor.mapv(|x| x.max(lo).min(hi))
}

/// Summary statistics of a tensor, used for component descriptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorStats {
    pub shape: Vec<usize>,
    pub mean: f32,
    pub std: f32,
    pub min: f32,
    pub max: f32,
}

impl TensorStats {
    /// Returns `None` for empty tensors
    pub fn of(tensor: &Tensor) -> Option<Self> {
        let mean = tensor.mean()?;
        let std = tensor.std(0.0);
        let min = tensor.iter().copied().fold(f32::INFINITY, f32::min);
        let max = tensor.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        Some(Self {
            shape: tensor.shape().to_vec(),
            mean,
            std,
            min,
            max,
        })
    }
}

impl fmt::Display for TensorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mean: {:.6}, std: {:.6}, shape: {:?}, min: {:.6}, max: {:.6}",
            self.mean, self.std, self.shape, self.min, self.max
        )
    }
}
