// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Trace-based STDP (Spike-Timing-Dependent Plasticity)
//!
//! Pure tensor form of pair-based STDP driven by pre/post spikes and traces:
//!
//! ```text
//! mu > 0:  dW = A+ · (w_bound − W)^mu ⊙ ((z_pre − x_tar)ᵀ · s_post)
//!             − A− · W^mu ⊙ (s_preᵀ · z_post)
//! mu = 0:  dW = A+ · (z_pre − x_tar)ᵀ · s_post − A− · s_preᵀ · z_post
//! ```
//!
//! The depression term is skipped entirely when `A− ≤ 0`.

use serde::{Deserialize, Serialize};
use synaptix_npu_neural::types::{clip, transpose_matmul};
use synaptix_npu_neural::{NeuralError, Result, Tensor};

/// Trace STDP configuration parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceStdpRule {
    /// Potentiation strength (A+)
    pub a_plus: f32,

    /// Depression strength (A−)
    pub a_minus: f32,

    /// Power of the weight-dependent shift (0 = additive STDP)
    pub mu: f32,

    /// Pre-synaptic trace target (x_tar)
    pub pretrace_target: f32,

    /// Upper weight bound
    pub w_bound: f32,
}

impl Default for TraceStdpRule {
    fn default() -> Self {
        Self {
            a_plus: 0.01,
            a_minus: 0.012,
            mu: 0.0,
            pretrace_target: 0.0,
            w_bound: 1.0,
        }
    }
}

/// Pre/post spike and trace statistics feeding one STDP update
#[derive(Debug, Clone, Copy)]
pub struct SpikeTraces<'a> {
    pub pre_spike: &'a Tensor,
    pub post_spike: &'a Tensor,
    pub pre_trace: &'a Tensor,
    pub post_trace: &'a Tensor,
}

impl TraceStdpRule {
    /// Non-modulated weight change for the current traces
    pub fn calc_update(&self, traces: SpikeTraces<'_>, weights: &Tensor) -> Result<Tensor> {
        let x_tar = self.pretrace_target;
        let shifted_pre = traces.pre_trace.mapv(|z| z - x_tar);
        let mut dw = transpose_matmul(&shifted_pre, traces.post_spike)?;
        if dw.shape() != weights.shape() {
            return Err(NeuralError::shape_mismatch("stdp update", weights.shape(), dw.shape()));
        }

        let (mu, bound) = (self.mu, self.w_bound);
        if mu > 0.0 {
            dw.zip_mut_with(weights, |d, &w| *d *= (bound - w).powf(mu));
        }
        dw *= self.a_plus;

        if self.a_minus > 0.0 {
            let mut depress = transpose_matmul(traces.pre_spike, traces.post_trace)?;
            if mu > 0.0 {
                depress.zip_mut_with(weights, |d, &w| *d *= w.powf(mu));
            }
            dw.scaled_add(-self.a_minus, &depress);
        }
        Ok(dw)
    }

    /// Plain STDP evolution: `W ← clip(W + η·dW, w_eps, w_bound − w_eps)`
    pub fn apply(&self, weights: &Tensor, dw: &Tensor, eta: f32, w_eps: f32) -> Tensor {
        let mut next = weights.clone();
        next.scaled_add(eta, dw);
        clip(&next, w_eps, self.w_bound - w_eps)
    }
}
