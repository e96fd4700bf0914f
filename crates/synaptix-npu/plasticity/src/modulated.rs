// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Modulated STDP with Eligibility Traces (MSTDP / MSTDP-ET)
//!
//! ```text
//! tau_elg > 0:  Elg ← Elg · exp(−dt/τ_elg) · elg_decay + dW_stdp/τ_elg
//! otherwise:    Elg ← dW_stdp
//! W   ← W + (Elg · r · η) ⊙ outmask − W/τ_w          (decay only when τ_w > 0)
//! dW_stdp ← STDP(traces, W)                           (against the new W)
//! W   ← clip(W, w_eps, w_bound − w_eps)
//! ```
//!
//! `r` is the batch mean of the `(batch, 1)` modulator. The trace update is
//! exposed on its own through [`ModulatedRule::update_eligibility`];
//! [`ModulatedRule::evolve`] consumes the already advanced trace.

use serde::{Deserialize, Serialize};
use synaptix_npu_neural::types::{clip, mul_broadcast};
use synaptix_npu_neural::{NeuralError, Result, Tensor};

use crate::stdp::{SpikeTraces, TraceStdpRule};

/// Eligibility-trace and modulation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulatedRule {
    /// Global learning rate
    pub eta: f32,
    /// Eligibility time constant (trace disabled when ≤ 0)
    pub tau_elg: f32,
    pub elg_decay: f32,
    /// Weight decay time constant (disabled when ≤ 0)
    pub tau_w: f32,
    pub w_eps: f32,
}

impl Default for ModulatedRule {
    fn default() -> Self {
        Self {
            eta: 1.0,
            tau_elg: 0.0,
            elg_decay: 1.0,
            tau_w: 0.0,
            w_eps: 0.0,
        }
    }
}

/// Result of one modulated evolution
#[derive(Debug, Clone, PartialEq)]
pub struct ModulatedStep {
    pub weights: Tensor,
    pub d_weights: Tensor,
}

/// Inputs of one modulated evolution
#[derive(Debug, Clone, Copy)]
pub struct ModulatedInputs<'a> {
    pub weights: &'a Tensor,
    /// Trace already advanced for this step
    pub eligibility: &'a Tensor,
    pub modulator: &'a Tensor,
    pub outmask: &'a Tensor,
}

impl ModulatedRule {
    /// Decay and accumulate the eligibility trace
    pub fn update_eligibility(&self, eligibility: &Tensor, d_weights: &Tensor, dt: f32) -> Tensor {
        if self.tau_elg > 0.0 {
            let keep = (-dt / self.tau_elg).exp() * self.elg_decay;
            let mut next = eligibility * keep;
            next.scaled_add(1.0 / self.tau_elg, d_weights);
            next
        } else {
            d_weights.clone()
        }
    }

    pub fn evolve(
        &self,
        stdp: &TraceStdpRule,
        traces: SpikeTraces<'_>,
        inputs: ModulatedInputs<'_>,
    ) -> Result<ModulatedStep> {
        let eligibility = inputs.eligibility;
        if eligibility.shape() != inputs.weights.shape() {
            return Err(NeuralError::shape_mismatch(
                "eligibility",
                inputs.weights.shape(),
                eligibility.shape(),
            ));
        }
        let r = inputs.modulator.mean().unwrap_or(0.0);

        let shift = mul_broadcast(&(eligibility * (r * self.eta)), inputs.outmask, "outmask")?;
        let mut weights = inputs.weights + &shift;
        if self.tau_w > 0.0 {
            weights.scaled_add(-1.0 / self.tau_w, inputs.weights);
        }

        let d_weights = stdp.calc_update(traces, &weights)?;
        let weights = clip(&weights, self.w_eps, stdp.w_bound - self.w_eps);

        Ok(ModulatedStep { weights, d_weights })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn stdp() -> TraceStdpRule {
        TraceStdpRule {
            a_plus: 1.0,
            a_minus: 0.0,
            ..TraceStdpRule::default()
        }
    }

    #[test]
    fn test_without_trace_eligibility_is_previous_update() {
        let rule = ModulatedRule::default();
        let w = array![[0.5f32, 0.5]].into_dyn();
        let dw = array![[0.1f32, -0.2]].into_dyn();
        let elg = rule.update_eligibility(&Tensor::zeros(w.raw_dim()), &dw, 1.0);
        assert_eq!(elg, dw);
        let modulator = array![[1.0f32]].into_dyn();
        let outmask = array![[1.0f32, 1.0]].into_dyn();
        let one = array![[1.0f32]].into_dyn();
        let post = array![[0.0f32, 0.0]].into_dyn();
        let step = rule
            .evolve(
                &stdp(),
                SpikeTraces {
                    pre_spike: &one,
                    post_spike: &post,
                    pre_trace: &one,
                    post_trace: &post,
                },
                ModulatedInputs {
                    weights: &w,
                    eligibility: &elg,
                    modulator: &modulator,
                    outmask: &outmask,
                },
            )
            .unwrap();
        assert!((step.weights[[0, 0]] - 0.6).abs() < 1e-6);
        assert!((step.weights[[0, 1]] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_trace_decays_and_accumulates() {
        let rule = ModulatedRule {
            tau_elg: 2.0,
            elg_decay: 0.5,
            ..ModulatedRule::default()
        };
        let elg = array![[1.0f32]].into_dyn();
        let dw = array![[2.0f32]].into_dyn();
        let next = rule.update_eligibility(&elg, &dw, 0.0);
        // 1·e^0·0.5 + 2/2
        assert!((next[[0, 0]] - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_outmask_blocks_columns() {
        let rule = ModulatedRule::default();
        let w = array![[0.5f32, 0.5]].into_dyn();
        let elg = array![[0.2f32, 0.2]].into_dyn();
        let modulator = array![[2.0f32], [0.0]].into_dyn();
        let outmask = array![[1.0f32, 0.0]].into_dyn();
        let zero1 = array![[0.0f32], [0.0]].into_dyn();
        let zero2 = array![[0.0f32, 0.0], [0.0, 0.0]].into_dyn();
        let step = rule
            .evolve(
                &stdp(),
                SpikeTraces {
                    pre_spike: &zero1,
                    post_spike: &zero2,
                    pre_trace: &zero1,
                    post_trace: &zero2,
                },
                ModulatedInputs {
                    weights: &w,
                    eligibility: &elg,
                    modulator: &modulator,
                    outmask: &outmask,
                },
            )
            .unwrap();
        // batch-mean modulator is 1
        assert!((step.weights[[0, 0]] - 0.7).abs() < 1e-6);
        assert_eq!(step.weights[[0, 1]], 0.5);
    }
}
