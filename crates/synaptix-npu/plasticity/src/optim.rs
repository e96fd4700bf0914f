// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Parameter Optimizers
//!
//! Optimizers turn an update signal `g` into a parameter change. All state lives
//! in one packed 1-D tensor so it can sit in an ordinary compartment:
//!
//! ```text
//! sgd:  [step]
//! adam: [step, m_0.., v_0.., m_1.., v_1.., ...]
//! ```
//!
//! One `step` call moves every parameter of a component in lock-step.

use core::fmt;
use core::str::FromStr;

use ndarray::{s, Array1, IxDyn};
use serde::{Deserialize, Serialize};
use synaptix_npu_neural::{NeuralError, Result, Tensor};

/// Optimizer algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    #[default]
    Sgd,
    Adam,
}

impl FromStr for OptimizerKind {
    type Err = NeuralError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sgd" => Ok(OptimizerKind::Sgd),
            "adam" => Ok(OptimizerKind::Adam),
            other => Err(NeuralError::UnsupportedOptimizer(other.to_string())),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizerKind::Sgd => write!(f, "sgd"),
            OptimizerKind::Adam => write!(f, "adam"),
        }
    }
}

/// Unpacked optimizer statistics
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerState {
    /// Number of steps taken so far
    pub step: f32,
    /// First and second moments per parameter (adam only)
    pub moments: Vec<(Tensor, Tensor)>,
}

impl OptimizerState {
    /// Flatten into the packed compartment layout
    pub fn pack(&self) -> Tensor {
        let len = 1 + self
            .moments
            .iter()
            .map(|(m, v)| m.len() + v.len())
            .sum::<usize>();
        let mut packed = Vec::with_capacity(len);
        packed.push(self.step);
        for (m, v) in &self.moments {
            packed.extend(m.iter().copied());
            packed.extend(v.iter().copied());
        }
        Array1::from(packed).into_dyn()
    }

    /// Rebuild from the packed layout, given the parameter shapes
    pub fn unpack(kind: OptimizerKind, packed: &Tensor, shapes: &[&[usize]]) -> Result<Self> {
        let flat = packed
            .view()
            .into_dimensionality::<ndarray::Ix1>()
            .map_err(|_| NeuralError::invalid_shape("opt_params", "expected a 1-D packed tensor"))?;
        let expected = packed_len(kind, shapes);
        if flat.len() != expected {
            return Err(NeuralError::shape_mismatch("opt_params", &[expected], &[flat.len()]));
        }
        let step = flat[0];
        let mut moments = Vec::new();
        if kind == OptimizerKind::Adam {
            let mut offset = 1;
            for shape in shapes {
                let n: usize = shape.iter().product();
                let m = take(&flat, offset, shape)?;
                let v = take(&flat, offset + n, shape)?;
                moments.push((m, v));
                offset += 2 * n;
            }
        }
        Ok(Self { step, moments })
    }
}

fn take(flat: &ndarray::ArrayView1<f32>, offset: usize, shape: &[usize]) -> Result<Tensor> {
    let n: usize = shape.iter().product();
    flat.slice(s![offset..offset + n])
        .to_owned()
        .into_shape_with_order(IxDyn(shape))
        .map_err(|e| NeuralError::invalid_shape("opt_params", e.to_string()))
}

/// Length of the packed state for parameters of the given shapes
pub fn packed_len(kind: OptimizerKind, shapes: &[&[usize]]) -> usize {
    match kind {
        OptimizerKind::Sgd => 1,
        OptimizerKind::Adam => 1 + shapes.iter().map(|s| 2 * s.iter().product::<usize>()).sum::<usize>(),
    }
}

/// Initial packed optimizer state for `params`
pub fn opt_init(kind: OptimizerKind, params: &[&Tensor]) -> Tensor {
    let moments = match kind {
        OptimizerKind::Sgd => Vec::new(),
        OptimizerKind::Adam => params
            .iter()
            .map(|p| (Tensor::zeros(p.raw_dim()), Tensor::zeros(p.raw_dim())))
            .collect(),
    };
    OptimizerState { step: 0.0, moments }.pack()
}

/// Configured optimizer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Optimizer {
    pub kind: OptimizerKind,
    /// Learning rate
    pub eta: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
}

impl Optimizer {
    pub fn new(kind: OptimizerKind, eta: f32) -> Self {
        Self {
            kind,
            eta,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }

    pub fn sgd(eta: f32) -> Self {
        Self::new(OptimizerKind::Sgd, eta)
    }

    pub fn adam(eta: f32) -> Self {
        Self::new(OptimizerKind::Adam, eta)
    }

    /// Optimizer by name (`"sgd"`, `"adam"`)
    pub fn from_name(name: &str, eta: f32) -> Result<Self> {
        Ok(Self::new(name.parse()?, eta))
    }

    pub fn init(&self, params: &[&Tensor]) -> Tensor {
        opt_init(self.kind, params)
    }

    /// `(state, params, grads) -> (state', params')`
    pub fn step(&self, state: &Tensor, params: &[Tensor], grads: &[Tensor]) -> Result<(Tensor, Vec<Tensor>)> {
        if params.len() != grads.len() {
            return Err(NeuralError::invalid_parameter(
                "optimizer",
                format!("{} parameters but {} updates", params.len(), grads.len()),
            ));
        }
        for (p, g) in params.iter().zip(grads) {
            if p.shape() != g.shape() {
                return Err(NeuralError::shape_mismatch("optimizer update", p.shape(), g.shape()));
            }
        }
        let shapes: Vec<&[usize]> = params.iter().map(|p| p.shape()).collect();
        let mut st = OptimizerState::unpack(self.kind, state, &shapes)?;
        st.step += 1.0;

        let updated: Vec<Tensor> = match self.kind {
            OptimizerKind::Sgd => params
                .iter()
                .zip(grads)
                .map(|(p, g)| p - &(g * self.eta))
                .collect(),
            OptimizerKind::Adam => {
                let (b1, b2, eps, eta) = (self.beta1, self.beta2, self.epsilon, self.eta);
                let corr1 = 1.0 - b1.powf(st.step);
                let corr2 = 1.0 - b2.powf(st.step);
                let mut out = Vec::with_capacity(params.len());
                for ((p, g), (m, v)) in params.iter().zip(grads).zip(st.moments.iter_mut()) {
                    *m = &*m * b1 + &(g * (1.0 - b1));
                    *v = &*v * b2 + &(g.mapv(|x| x * x) * (1.0 - b2));
                    let mut next = p.clone();
                    ndarray::Zip::from(&mut next)
                        .and(&*m)
                        .and(&*v)
                        .for_each(|p, &m, &v| {
                            let m_hat = m / corr1;
                            let v_hat = v / corr2;
                            *p -= eta * m_hat / (v_hat.sqrt() + eps);
                        });
                    out.push(next);
                }
                out
            }
        };
        Ok((st.pack(), updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sgd_descends() {
        let opt = Optimizer::sgd(0.1);
        let w = array![[1.0f32, 2.0]].into_dyn();
        let g = array![[1.0f32, -1.0]].into_dyn();
        let state = opt.init(&[&w]);
        assert_eq!(state.len(), 1);
        let (state, params) = opt.step(&state, &[w], &[g]).unwrap();
        assert_eq!(state[[0]], 1.0);
        let expected = array![[0.9f32, 2.1]].into_dyn();
        assert!(params[0].iter().zip(expected.iter()).all(|(a, b)| (a - b).abs() < 1e-6));
    }

    #[test]
    fn test_adam_first_step_moves_by_eta() {
        let opt = Optimizer::adam(0.01);
        let w = array![[0.5f32, 0.5, 0.5]].into_dyn();
        let g = array![[2.0f32, -3.0, 0.0]].into_dyn();
        let state = opt.init(&[&w]);
        assert_eq!(state.len(), 7);
        let (state, params) = opt.step(&state, &[w], &[g]).unwrap();
        // bias-corrected first step is eta·sign(g)
        assert!((params[0][[0, 0]] - 0.49).abs() < 1e-5);
        assert!((params[0][[0, 1]] - 0.51).abs() < 1e-5);
        assert_eq!(params[0][[0, 2]], 0.5);
        assert_eq!(state[[0]], 1.0);
    }

    #[test]
    fn test_adam_state_round_trips_through_packing() {
        let w = array![[1.0f32, 2.0], [3.0, 4.0]].into_dyn();
        let b = array![[0.0f32, 1.0]].into_dyn();
        let packed = opt_init(OptimizerKind::Adam, &[&w, &b]);
        assert_eq!(packed.len(), 1 + 8 + 4);
        let st = OptimizerState::unpack(OptimizerKind::Adam, &packed, &[w.shape(), b.shape()]).unwrap();
        assert_eq!(st.moments.len(), 2);
        assert_eq!(st.moments[1].0.shape(), &[1, 2]);
    }

    #[test]
    fn test_unknown_optimizer_name() {
        assert!(matches!(
            Optimizer::from_name("rmsprop", 0.1),
            Err(NeuralError::UnsupportedOptimizer(_))
        ));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let opt = Optimizer::sgd(0.1);
        let w = Tensor::zeros(IxDyn(&[2, 2]));
        let g = Tensor::zeros(IxDyn(&[2, 3]));
        let state = opt.init(&[&w]);
        assert!(opt.step(&state, &[w], &[g]).is_err());
    }
}
