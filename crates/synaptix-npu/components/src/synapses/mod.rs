// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Synaptic Cables
//!
//! Synapses transform an `inputs` compartment into `outputs` through a parameter
//! tensor, `outputs = transform(inputs, weights) · resist_scale + biases`.
//! Plastic variants add `evolve`, which adapts the parameters through a local rule
//! and an optimizer.
//!
//! Biases are disabled unless a `bias_init` is configured; a disabled bias is the
//! scalar `0` and is neither optimized nor persisted.

pub mod conv;
pub mod deconv;
pub mod dense;
pub mod hebbian;
pub mod hebbian_conv;
pub mod mstdpet;
pub mod patched;
pub mod trace_stdp;

use synaptix_npu_neural::types::scalar;
use synaptix_npu_neural::{sample, RngKey, Tensor, WeightInit};
use synaptix_npu_runtime::Result;
use tracing::{info, warn};

/// Sample initial weights, falling back to `fallback` when no initializer is configured
pub(crate) fn init_weights(
    component: &str,
    key: RngKey,
    init: Option<&WeightInit>,
    fallback: WeightInit,
    shape: &[usize],
) -> Result<Tensor> {
    let weights = match init {
        Some(init) => sample(key, init, shape)?,
        None => {
            info!(component, dist = fallback.name(), "using default weight initializer");
            sample(key, &fallback, shape)?
        }
    };
    Ok(weights)
}

/// Zero out connections with probability `1 - p_conn` when `p_conn` is in `(0, 1)`
pub(crate) fn sparsify(component: &str, key: RngKey, weights: Tensor, p_conn: f64) -> Result<Tensor> {
    if p_conn > 0.0 && p_conn < 1.0 {
        let mask = key.bernoulli(p_conn, weights.shape())?;
        return Ok(weights * &mask);
    }
    if p_conn != 1.0 {
        warn!(component, p_conn, "connection probability outside (0, 1) ignored");
    }
    Ok(weights)
}

/// Sample biases of `shape`, or `None` when biases are disabled
pub(crate) fn init_biases(
    component: &str,
    key: RngKey,
    init: Option<&WeightInit>,
    shape: &[usize],
) -> Result<Option<Tensor>> {
    match init {
        Some(init) => Ok(Some(sample(key, init, shape)?)),
        None => {
            info!(component, "no bias initializer, biases disabled");
            Ok(None)
        }
    }
}

/// Declared value of a possibly disabled bias
pub(crate) fn bias_value(biases: Option<&Tensor>) -> Tensor {
    biases.cloned().unwrap_or_else(|| scalar(0.0))
}

/// Parameter keys persisted by a synapse
pub(crate) fn persistent_params(bias_enabled: bool) -> Vec<&'static str> {
    if bias_enabled {
        vec!["weights", "biases"]
    } else {
        vec!["weights"]
    }
}
