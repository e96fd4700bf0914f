// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Two-Factor Hebbian Plasticity
//!
//! ```text
//! pre'  = pre · pre_wght            post' = post · post_wght
//! dW    = pre'ᵀ · post'             db    = Σ_batch post'
//! dW    = dW · (w_bound − |W|)      (soft bound, when w_bound > 0)
//! dW    = dW + prior(W)
//! (dW, db) · sign_value
//! ```
//!
//! Priors:
//! - ridge / l2 / gaussian: `−λ·W`
//! - lasso / l1 / laplacian: `−λ·sign(W)`
//! - elastic_net / l1l2: `λ·(−sign(W)·l1_ratio − W·(1 − l1_ratio)/2)`
//! - constant / none: no term

use serde::{Deserialize, Serialize};
use synaptix_npu_neural::types::{sign, sum_batch, transpose_matmul};
use synaptix_npu_neural::{NeuralError, Result, Tensor};

/// Default mixing ratio when an elastic-net prior is given a single λ
pub const DEFAULT_L1_RATIO: f32 = 0.5;

/// Weight prior (regulariser) added to a Hebbian update
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Prior {
    #[default]
    Constant,
    Ridge {
        lambda: f32,
    },
    Lasso {
        lambda: f32,
    },
    ElasticNet {
        lambda: f32,
        l1_ratio: f32,
    },
}

impl Prior {
    /// Prior by name and strength. `l1_ratio` only applies to elastic-net priors.
    pub fn from_name(name: &str, lambda: f32, l1_ratio: Option<f32>) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "constant" | "none" => Ok(Prior::Constant),
            "ridge" | "l2" | "gaussian" => Ok(Prior::Ridge { lambda }),
            "lasso" | "l1" | "laplacian" => Ok(Prior::Lasso { lambda }),
            "elastic_net" | "l1l2" => Ok(Prior::ElasticNet {
                lambda,
                l1_ratio: l1_ratio.unwrap_or(DEFAULT_L1_RATIO),
            }),
            other => Err(NeuralError::UnsupportedPrior(other.to_string())),
        }
    }

    /// Regularisation term for `w`, or `None` when the prior adds nothing
    pub fn term(&self, w: &Tensor) -> Option<Tensor> {
        match *self {
            Prior::Constant => None,
            Prior::Ridge { lambda } => Some(w * -lambda),
            Prior::Lasso { lambda } => Some(sign(w) * -lambda),
            Prior::ElasticNet { lambda, l1_ratio } => {
                let l2 = (1.0 - l1_ratio) * 0.5;
                let mut reg = sign(w) * -l1_ratio;
                reg.zip_mut_with(w, |r, &x| *r -= x * l2);
                Some(reg * lambda)
            }
        }
    }
}

/// Hebbian update rule shared by dense and patched synapses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HebbianRule {
    /// Soft bound on weight magnitude (disabled when ≤ 0)
    pub w_bound: f32,
    /// Clip to `[0, w_bound]` instead of `[-w_bound, w_bound]`
    pub is_nonnegative: bool,
    /// Multiplier on the final update
    pub sign_value: f32,
    pub prior: Prior,
    pub pre_wght: f32,
    pub post_wght: f32,
}

impl Default for HebbianRule {
    fn default() -> Self {
        Self {
            w_bound: 1.0,
            is_nonnegative: false,
            sign_value: 1.0,
            prior: Prior::Constant,
            pre_wght: 1.0,
            post_wght: 1.0,
        }
    }
}

impl HebbianRule {
    /// `w_decay > 0` replaces the prior with `ridge(w_decay)`
    pub fn with_w_decay(mut self, w_decay: f32) -> Self {
        if w_decay > 0.0 {
            self.prior = Prior::Ridge { lambda: w_decay };
        }
        self
    }

    /// Returns `(dW, db)`, with `db` of shape `(1, n_out)`
    pub fn calc_update(&self, pre: &Tensor, post: &Tensor, w: &Tensor) -> Result<(Tensor, Tensor)> {
        let pre_w = pre * self.pre_wght;
        let post_w = post * self.post_wght;
        let mut dw = transpose_matmul(&pre_w, &post_w)?;
        if dw.shape() != w.shape() {
            return Err(NeuralError::shape_mismatch("hebbian update", w.shape(), dw.shape()));
        }
        let db = sum_batch(&post_w);

        if self.w_bound > 0.0 {
            let bound = self.w_bound;
            dw.zip_mut_with(w, |d, &x| *d *= bound - x.abs());
        }
        if let Some(reg) = self.prior.term(w) {
            dw += &reg;
        }
        Ok((dw * self.sign_value, db * self.sign_value))
    }
}
