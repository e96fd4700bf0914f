// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Bound enforcement applied to parameters after an optimizer step

use synaptix_npu_neural::types::clip;
use synaptix_npu_neural::Tensor;

/// Clip `weights` to `[0, w_bound]` (non-negative) or `[-w_bound, w_bound]`.
/// A non-positive `w_bound` disables clipping.
pub fn enforce_bounds(weights: Tensor, w_bound: f32, is_nonnegative: bool) -> Tensor {
    if w_bound <= 0.0 {
        return weights;
    }
    if is_nonnegative {
        clip(&weights, 0.0, w_bound)
    } else {
        clip(&weights, -w_bound, w_bound)
    }
}

/// Zero every coordinate where `mask` is zero
pub fn apply_mask(weights: Tensor, mask: &Tensor) -> Tensor {
    weights * mask
}
