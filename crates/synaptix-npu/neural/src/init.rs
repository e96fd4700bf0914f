// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Weight Initialisation
//!
//! Parameter tensors are sampled from a named distribution. The serialised form is
//! tagged by `dist`, e.g. `{"dist": "uniform", "amin": 0.025, "amax": 0.8}`.
//!
//! Fan-in scaled variants use `1/sqrt(fan_in)`, where fan-in is the leading
//! dimension of a matrix or the product of all but the last dimension of a kernel.

use ndarray::{ArrayD, IxDyn};
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};

use crate::rng::RngKey;
use crate::types::{full, NeuralError, Result, Tensor};

/// Weight initialisation distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dist", rename_all = "snake_case")]
pub enum WeightInit {
    Uniform { amin: f32, amax: f32 },
    Constant { value: f32 },
    Gaussian { mu: f32, sigma: f32 },
    FanInGaussian,
    FanInUniform,
}

impl WeightInit {
    pub fn uniform(amin: f32, amax: f32) -> Self {
        WeightInit::Uniform { amin, amax }
    }

    pub fn constant(value: f32) -> Self {
        WeightInit::Constant { value }
    }

    pub fn gaussian(mu: f32, sigma: f32) -> Self {
        WeightInit::Gaussian { mu, sigma }
    }

    /// Distribution name as used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            WeightInit::Uniform { .. } => "uniform",
            WeightInit::Constant { .. } => "constant",
            WeightInit::Gaussian { .. } => "gaussian",
            WeightInit::FanInGaussian => "fan_in_gaussian",
            WeightInit::FanInUniform => "fan_in_uniform",
        }
    }
}

/// Fan-in of a parameter shape
pub fn fan_in(shape: &[usize]) -> usize {
    match shape.len() {
        0 => 1,
        1 | 2 => shape[0],
        n => shape[..n - 1].iter().product(),
    }
}

/// Sample a tensor of `shape` from `init`
pub fn sample(key: RngKey, init: &WeightInit, shape: &[usize]) -> Result<Tensor> {
    match *init {
        WeightInit::Constant { value } => Ok(full(shape, value)),
        WeightInit::Uniform { amin, amax } => uniform(key, amin, amax, shape),
        WeightInit::Gaussian { mu, sigma } => gaussian(key, mu, sigma, shape),
        WeightInit::FanInGaussian => {
            let scale = fan_in_scale(shape)?;
            gaussian(key, 0.0, scale, shape)
        }
        WeightInit::FanInUniform => {
            let scale = fan_in_scale(shape)?;
            uniform(key, -scale, scale, shape)
        }
    }
}

fn fan_in_scale(shape: &[usize]) -> Result<f32> {
    let fan_in = fan_in(shape);
    if fan_in == 0 {
        return Err(NeuralError::invalid_shape(
            "fan-in initialiser",
            format!("zero fan-in for shape {:?}", shape),
        ));
    }
    Ok(1.0 / (fan_in as f32).sqrt())
}

fn uniform(key: RngKey, amin: f32, amax: f32, shape: &[usize]) -> Result<Tensor> {
    if !(amin <= amax) {
        return Err(NeuralError::invalid_parameter(
            "uniform",
            format!("amin ({}) must not exceed amax ({})", amin, amax),
        ));
    }
    let dist = Uniform::new_inclusive(amin, amax);
    let mut rng = key.into_rng();
    Ok(ArrayD::from_shape_simple_fn(IxDyn(shape), || dist.sample(&mut rng)))
}

fn gaussian(key: RngKey, mu: f32, sigma: f32, shape: &[usize]) -> Result<Tensor> {
    let dist =
        Normal::new(mu, sigma).map_err(|e| NeuralError::invalid_parameter("gaussian", e.to_string()))?;
    let mut rng = key.into_rng();
    Ok(ArrayD::from_shape_simple_fn(IxDyn(shape), || dist.sample(&mut rng)))
}
