// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Convolutional Hebbian Plasticity
//!
//! ```text
//! dK       = calc_dK(pre, post) · sign_value − w_decay · K
//! db       = Σ_{batch,h,w} post · sign_value           (shape (1, 1, 1, c_out))
//! dInputs  = calc_dX(K, post) · sign_value
//! ```
//!
//! The gradient routines can overshoot the kernel/input extent depending on padding
//! and stride. [`ConvHebbianRule::calibrate`] measures the overshoot once on a zero
//! pass so every later call can correct it.

use ndarray::{Axis, IxDyn};
use serde::{Deserialize, Serialize};
use synaptix_npu_neural::conv::{calc_dk_conv, calc_dx_conv, conv2d};
use synaptix_npu_neural::types::zeros;
use synaptix_npu_neural::{NeuralError, PadArgs, Padding, Result, Tensor};
use tracing::debug;

/// Kernel update rule of a convolutional Hebbian synapse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvHebbianRule {
    pub sign_value: f32,
    /// Synaptic decay (disabled when ≤ 0)
    pub w_decay: f32,
    pub stride: usize,
    pub padding: Padding,
    pub pad_args: PadArgs,
    /// Trailing rows/cols cropped off the raw kernel gradient
    pub delta_shape: (usize, usize),
    /// Signed correction of the input gradient extent
    pub x_delta_shape: (isize, isize),
}

impl ConvHebbianRule {
    /// Build the rule for inputs `(batch, x_size, x_size, c_in)` and `kernel`,
    /// measuring the gradient shape corrections on zero-valued data
    pub fn calibrate(
        batch_size: usize,
        x_size: usize,
        kernel: &Tensor,
        stride: usize,
        padding: Padding,
        sign_value: f32,
        w_decay: f32,
    ) -> Result<Self> {
        let kshape = kernel.shape();
        if kshape.len() != 4 {
            return Err(NeuralError::invalid_shape(
                "convolution kernel",
                format!("expected (k, k, c_in, c_out), got {:?}", kshape),
            ));
        }
        let (kh, kw, c_in) = (kshape[0], kshape[1], kshape[2]);
        let pad_args = padding.pad_args(x_size, x_size, (kh, kw), stride);
        let x = zeros(&[batch_size, x_size, x_size, c_in]);
        let d = conv2d(&x, kernel, stride, padding)?;

        let raw_dk = calc_dk_conv(&x, &d, stride, &pad_args, (0, 0))?;
        let delta_shape = (
            raw_dk.shape()[0].saturating_sub(kh),
            raw_dk.shape()[1].saturating_sub(kw),
        );
        let raw_dx = calc_dx_conv(kernel, &d, stride, &pad_args, (0, 0))?;
        let x_delta_shape = (
            raw_dx.shape()[1] as isize - x_size as isize,
            raw_dx.shape()[2] as isize - x_size as isize,
        );
        debug!(
            ?padding,
            stride,
            ?delta_shape,
            ?x_delta_shape,
            "calibrated convolutional gradient corrections"
        );
        Ok(Self {
            sign_value,
            w_decay,
            stride,
            padding,
            pad_args,
            delta_shape,
            x_delta_shape,
        })
    }

    /// Returns `(dK, db)`; `db` is `None` when biases are disabled
    pub fn calc_update(
        &self,
        pre: &Tensor,
        post: &Tensor,
        kernel: &Tensor,
        with_biases: bool,
    ) -> Result<(Tensor, Option<Tensor>)> {
        let mut dk = calc_dk_conv(pre, post, self.stride, &self.pad_args, self.delta_shape)?;
        if dk.shape() != kernel.shape() {
            return Err(NeuralError::shape_mismatch("kernel update", kernel.shape(), dk.shape()));
        }
        dk *= self.sign_value;
        if self.w_decay > 0.0 {
            dk.scaled_add(-self.w_decay, kernel);
        }
        let db = if with_biases {
            Some(channel_sum(post)? * self.sign_value)
        } else {
            None
        };
        Ok((dk, db))
    }

    /// Signal sent back to the input side
    pub fn backtransmit(&self, kernel: &Tensor, post: &Tensor) -> Result<Tensor> {
        let dx = calc_dx_conv(kernel, post, self.stride, &self.pad_args, self.x_delta_shape)?;
        Ok(dx * self.sign_value)
    }
}

/// Sum over batch and both spatial axes, shaped `(1, 1, 1, c)`
fn channel_sum(post: &Tensor) -> Result<Tensor> {
    if post.ndim() != 4 {
        return Err(NeuralError::invalid_shape(
            "convolution post",
            format!("expected rank 4, got shape {:?}", post.shape()),
        ));
    }
    let c = post.shape()[3];
    post.sum_axis(Axis(0))
        .sum_axis(Axis(0))
        .sum_axis(Axis(0))
        .into_shape_with_order(IxDyn(&[1, 1, 1, c]))
        .map_err(|e| NeuralError::invalid_shape("convolution bias update", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use synaptix_npu_neural::types::full;

    #[test]
    fn test_calibrated_update_matches_kernel_shape() {
        for &(padding, stride) in &[(Padding::Same, 1), (Padding::Same, 2), (Padding::Valid, 2)] {
            let kernel = full(&[3, 3, 1, 2], 0.1);
            let rule = ConvHebbianRule::calibrate(1, 8, &kernel, stride, padding, 1.0, 0.0).unwrap();
            let pre = full(&[1, 8, 8, 1], 1.0);
            let post = conv2d(&pre, &kernel, stride, padding).unwrap();
            let (dk, db) = rule.calc_update(&pre, &post, &kernel, false).unwrap();
            assert_eq!(dk.shape(), kernel.shape());
            assert!(db.is_none());
            let dx = rule.backtransmit(&kernel, &post).unwrap();
            assert_eq!(dx.shape(), pre.shape());
        }
    }

    #[test]
    fn test_bias_update_sums_channels() {
        let kernel = full(&[3, 3, 1, 2], 0.0);
        let rule = ConvHebbianRule::calibrate(2, 4, &kernel, 1, Padding::Same, -1.0, 0.0).unwrap();
        let pre = full(&[2, 4, 4, 1], 0.0);
        let post = full(&[2, 4, 4, 2], 1.0);
        let (_, db) = rule.calc_update(&pre, &post, &kernel, true).unwrap();
        let db = db.unwrap();
        assert_eq!(db.shape(), &[1, 1, 1, 2]);
        assert!(db.iter().all(|&x| x == -32.0));
    }

    #[test]
    fn test_decay_pulls_kernel_toward_zero() {
        let kernel = full(&[3, 3, 1, 1], 2.0);
        let rule = ConvHebbianRule::calibrate(1, 5, &kernel, 1, Padding::Same, 1.0, 0.5).unwrap();
        let pre = zeros(&[1, 5, 5, 1]);
        let post = zeros(&[1, 5, 5, 1]);
        let (dk, _) = rule.calc_update(&pre, &post, &kernel, false).unwrap();
        assert!(dk.iter().all(|&x| x == -1.0));
    }
}
