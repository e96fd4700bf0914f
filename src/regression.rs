// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Elastic-Net Regression
//!
//! Linear regression fitted by a two-component circuit: a Hebbian cable `W`
//! predicts the targets and a Gaussian error cell `err` scores the prediction.
//! The error signal is routed back as the cable's post-synaptic term, so each
//! evolve is a gradient step on the squared error plus an elastic-net penalty:
//!
//! ```text
//! err.mu  << W.outputs
//! W.post  << err.dmu
//! dW      = −(Xᵀ · dmu) − λ·(ρ·sign(W) + ½(1 − ρ)·W)
//! ```

use serde::{Deserialize, Serialize};
use synaptix_npu_components::{
    DenseSynapseConfig, GaussianErrorCell, GaussianErrorCellConfig, HebbianSynapse,
    HebbianSynapseConfig,
};
use synaptix_npu_neural::types::zeros;
use synaptix_npu_neural::{RngKey, Tensor, WeightInit};
use synaptix_npu_plasticity::{OptimizerKind, Prior};
use synaptix_npu_runtime::{Circuit, State, StepArgs, ADVANCE_STATE, EVOLVE, RESET};
use tracing::{debug, info};

use crate::simulation::Result;

const SYNAPSE: &str = "W";
const ERROR: &str = "err";

/// Elastic-net regressor hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticNetConfig {
    /// Number of regression targets
    pub sys_dim: usize,
    /// Number of features (dictionary atoms)
    pub dict_dim: usize,
    pub batch_size: usize,
    /// Constant every coefficient starts from
    pub weight_fill: f32,
    pub lr: f32,
    /// Penalty strength (λ)
    pub lmbda: f32,
    /// Mix between the l1 and l2 penalties (ρ)
    pub l1_ratio: f32,
    pub optim_type: OptimizerKind,
    /// Coefficients with magnitude below this are zeroed by thresholding
    pub threshold: f32,
    pub epochs: usize,
    /// Advance steps per epoch
    pub steps_per_epoch: usize,
    pub dt: f32,
}

impl Default for ElasticNetConfig {
    fn default() -> Self {
        Self {
            sys_dim: 1,
            dict_dim: 1,
            batch_size: 1,
            weight_fill: 0.05,
            lr: 0.01,
            lmbda: 1e-4,
            l1_ratio: 0.5,
            optim_type: OptimizerKind::Adam,
            threshold: 0.05,
            epochs: 100,
            steps_per_epoch: 100,
            dt: 1.0,
        }
    }
}

impl ElasticNetConfig {
    pub fn new(sys_dim: usize, dict_dim: usize, batch_size: usize) -> Self {
        Self {
            sys_dim,
            dict_dim,
            batch_size,
            ..Self::default()
        }
    }

    fn synapse(&self) -> HebbianSynapseConfig {
        HebbianSynapseConfig {
            dense: DenseSynapseConfig {
                weight_init: Some(WeightInit::constant(self.weight_fill)),
                batch_size: self.batch_size,
                ..DenseSynapseConfig::new(self.dict_dim, self.sys_dim)
            },
            eta: self.lr,
            w_bound: 0.0,
            prior: Prior::ElasticNet {
                lambda: self.lmbda,
                l1_ratio: self.l1_ratio,
            },
            sign_value: -1.0,
            optim_type: self.optim_type,
            ..HebbianSynapseConfig::default()
        }
    }

    fn error_cell(&self) -> GaussianErrorCellConfig {
        GaussianErrorCellConfig {
            batch_size: self.batch_size,
            ..GaussianErrorCellConfig::new(self.sys_dim)
        }
    }
}

/// Result of [`ElasticNetRegressor::fit`]
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticNetFit {
    /// `(dict_dim, sys_dim)` coefficients
    pub coef: Tensor,
    /// Final prediction for the training batch
    pub mu: Tensor,
    /// Final Gaussian log-likelihood (scalar)
    pub loss: f32,
}

/// Thresholded coefficients from [`ElasticNetRegressor::thresholding`]
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholded {
    /// Sparse coefficients times the requested scale
    pub coef: Tensor,
    /// Coefficients before thresholding
    pub previous: Tensor,
}

/// Elastic-net linear regression on a Hebbian/error-cell circuit
#[derive(Debug)]
pub struct ElasticNetRegressor {
    config: ElasticNetConfig,
    circuit: Circuit,
    state: State,
}

impl ElasticNetRegressor {
    pub fn new(config: ElasticNetConfig, key: RngKey) -> Result<Self> {
        let mut circuit = Circuit::new();
        circuit.add_component(HebbianSynapse::new(SYNAPSE, config.synapse(), key)?)?;
        circuit.add_component(GaussianErrorCell::new(ERROR, config.error_cell())?)?;

        circuit.wire((SYNAPSE, "outputs"), (ERROR, "mu"))?;
        circuit.wire((ERROR, "dmu"), (SYNAPSE, "post"))?;

        circuit.compile("advance", &[(SYNAPSE, ADVANCE_STATE), (ERROR, ADVANCE_STATE)])?;
        circuit.compile("evolve", &[(SYNAPSE, EVOLVE)])?;
        circuit.compile("reset", &[(ERROR, RESET), (SYNAPSE, RESET)])?;

        let state = circuit.initial_state();
        info!(
            sys_dim = config.sys_dim,
            dict_dim = config.dict_dim,
            optim = %config.optim_type,
            lmbda = config.lmbda,
            l1_ratio = config.l1_ratio,
            "built elastic-net regressor"
        );
        Ok(Self {
            config,
            circuit,
            state,
        })
    }

    pub fn config(&self) -> &ElasticNetConfig {
        &self.config
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Current `(dict_dim, sys_dim)` coefficients
    pub fn coef(&self) -> Result<&Tensor> {
        Ok(self.state.value(SYNAPSE, "weights")?)
    }

    /// Fit coefficients mapping features `x` `(batch, dict_dim)` to targets `y` `(batch, sys_dim)`
    ///
    /// Each epoch runs `steps_per_epoch` advance steps with both clamped, then one
    /// evolve at `t = steps_per_epoch · dt`.
    pub fn fit(&mut self, y: &Tensor, x: &Tensor) -> Result<ElasticNetFit> {
        let dt = self.config.dt;
        let mut state = self.circuit.invoke("reset", &self.state, StepArgs::new(0.0, dt))?;
        state.clamp(SYNAPSE, "inputs", x.clone())?;
        state.clamp(SYNAPSE, "pre", x.clone())?;
        state.clamp(ERROR, "target", y.clone())?;

        let schedule: Vec<StepArgs> = (0..self.config.steps_per_epoch)
            .map(|i| StepArgs::new(i as f32 * dt, dt))
            .collect();
        let evolve_at = StepArgs::new(self.config.steps_per_epoch as f32 * dt, dt);
        let advance = self.circuit.command("advance")?;
        let evolve = self.circuit.command("evolve")?;

        for epoch in 0..self.config.epochs {
            state = advance.scan(&state, &schedule)?;
            state = evolve.run(&state, evolve_at)?;
            debug!(
                epoch,
                loss = state.value(ERROR, "L")?.sum(),
                "elastic-net epoch"
            );
        }

        let fit = ElasticNetFit {
            coef: state.value(SYNAPSE, "weights")?.clone(),
            mu: state.value(ERROR, "mu")?.clone(),
            loss: state.value(ERROR, "L")?.sum(),
        };
        self.state = state;
        info!(epochs = self.config.epochs, loss = fit.loss, "elastic-net fit finished");
        Ok(fit)
    }

    /// Zero coefficients with magnitude below the threshold
    ///
    /// The sparse (unscaled) coefficients replace the cable's weights.
    pub fn thresholding(&mut self, scale: f32) -> Result<Thresholded> {
        let previous = self.coef()?.clone();
        let threshold = self.config.threshold;
        let sparse = previous.mapv(|c| if c.abs() >= threshold { c } else { 0.0 });
        let coef = &sparse * scale;
        self.state.clamp(SYNAPSE, "weights", sparse)?;
        Ok(Thresholded { coef, previous })
    }

    /// Predict targets for `x` with the current coefficients
    pub fn predict(&self, x: &Tensor) -> Result<Tensor> {
        let mut state = self.state.clone();
        state.clamp(SYNAPSE, "inputs", x.clone())?;
        state.clamp(ERROR, "target", zeros(&[self.config.batch_size, self.config.sys_dim]))?;
        let state = self.circuit.invoke("advance", &state, StepArgs::new(0.0, self.config.dt))?;
        Ok(state.value(SYNAPSE, "outputs")?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_circuit_layout() {
        let reg = ElasticNetRegressor::new(ElasticNetConfig::new(2, 3, 4), RngKey::new(0)).unwrap();
        assert_eq!(reg.coef().unwrap().shape(), &[3, 2]);
        assert!(reg.coef().unwrap().iter().all(|&w| w == 0.05));
        let order = reg.circuit().command("advance").unwrap().order();
        assert_eq!(order, vec!["W.advance_state", "err.advance_state"]);
    }

    #[test]
    fn test_thresholding_zeros_small_coefficients() {
        let mut reg = ElasticNetRegressor::new(ElasticNetConfig::new(1, 2, 1), RngKey::new(0)).unwrap();
        reg.state
            .clamp(SYNAPSE, "weights", array![[0.5f32], [0.01]].into_dyn())
            .unwrap();
        let out = reg.thresholding(2.0).unwrap();
        assert_eq!(out.coef, array![[1.0f32], [0.0]].into_dyn());
        assert_eq!(out.previous, array![[0.5f32], [0.01]].into_dyn());
        assert_eq!(reg.coef().unwrap(), &array![[0.5f32], [0.0]].into_dyn());
    }

    #[test]
    fn test_mismatched_batch_rejected() {
        let mut reg = ElasticNetRegressor::new(ElasticNetConfig::new(1, 2, 4), RngKey::new(0)).unwrap();
        let x = zeros(&[3, 2]);
        let y = zeros(&[3, 1]);
        assert!(reg.fit(&y, &x).is_err());
    }
}
