// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Gaussian Error Cell
//!
//! Graded error unit of a fixed-variance Gaussian likelihood:
//!
//! ```text
//! e       = (target − mu) · mask
//! dmu     = e / σ
//! dtarget = −dmu
//! L       = −½ · Σ e² / σ
//! ```

use serde::{Deserialize, Serialize};
use synaptix_npu_neural::types::{full, mul_broadcast, scalar, zeros};
use synaptix_npu_neural::{NeuralError, Tensor};
use synaptix_npu_runtime::{
    unknown_transition, Component, ComponentView, Declarations, HasEventReset, HelpReport, Result,
    StepArgs, TransitionSpec, Updates, ADVANCE_STATE, RESET,
};

/// Gaussian error cell hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussianErrorCellConfig {
    pub n_units: usize,
    pub batch_size: usize,
    /// Fixed variance of the likelihood
    pub sigma: f32,
}

impl Default for GaussianErrorCellConfig {
    fn default() -> Self {
        Self {
            n_units: 1,
            batch_size: 1,
            sigma: 1.0,
        }
    }
}

impl GaussianErrorCellConfig {
    pub fn new(n_units: usize) -> Self {
        Self {
            n_units,
            ..Self::default()
        }
    }
}

const GAUSSIAN_ERROR_TRANSITIONS: &[TransitionSpec] = &[
    TransitionSpec {
        name: ADVANCE_STATE,
        reads: &["mu", "target", "mask"],
        writes: &["dmu", "dtarget", "L"],
    },
    TransitionSpec {
        name: RESET,
        reads: &[],
        writes: &["mu", "target", "dmu", "dtarget", "L", "mask"],
    },
];

#[derive(Debug, Clone)]
pub struct GaussianErrorCell {
    name: String,
    shape: [usize; 2],
    sigma: f32,
}

impl GaussianErrorCell {
    pub fn new(name: &str, config: GaussianErrorCellConfig) -> Result<Self> {
        if config.sigma <= 0.0 {
            return Err(NeuralError::invalid_parameter(
                "sigma",
                format!("must be positive, got {}", config.sigma),
            )
            .into());
        }
        Ok(Self {
            name: name.to_string(),
            shape: [config.batch_size, config.n_units],
            sigma: config.sigma,
        })
    }

    pub fn sigma(&self) -> f32 {
        self.sigma
    }

    fn advance(&self, view: &ComponentView<'_>) -> Result<Updates> {
        let diff = view.get("target")? - view.get("mu")?;
        let err = mul_broadcast(&diff, view.get("mask")?, "error mask")?;
        let dmu = &err / self.sigma;
        let dtarget = -&dmu;
        let loss = -0.5 * err.mapv(|e| e * e).sum() / self.sigma;
        Ok(vec![("dmu", dmu), ("dtarget", dtarget), ("L", scalar(loss))])
    }
}

impl HasEventReset for GaussianErrorCell {
    fn reset_values(&self) -> Updates {
        vec![
            ("mu", zeros(&self.shape)),
            ("target", zeros(&self.shape)),
            ("dmu", zeros(&self.shape)),
            ("dtarget", zeros(&self.shape)),
            ("L", scalar(0.0)),
            ("mask", full(&self.shape, 1.0)),
        ]
    }
}

impl Component for GaussianErrorCell {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "GaussianErrorCell"
    }

    fn declare(&self, decl: &mut Declarations) -> Result<()> {
        for (name, value) in self.reset_values() {
            decl.declare(name, value)?;
        }
        Ok(())
    }

    fn transitions(&self) -> &'static [TransitionSpec] {
        GAUSSIAN_ERROR_TRANSITIONS
    }

    fn execute(&self, transition: &str, _args: StepArgs, view: &ComponentView<'_>) -> Result<Updates> {
        match transition {
            ADVANCE_STATE => self.advance(view),
            RESET => Ok(self.reset_values()),
            other => Err(unknown_transition(&self.name, other)),
        }
    }

    fn help(&self) -> HelpReport {
        HelpReport::new(self.kind(), "Gaussian error cell computing mismatch signals under a fixed variance")
            .compartment("inputs", "mu", "Predicted mean of the Gaussian")
            .compartment("inputs", "target", "Desired target value")
            .compartment("inputs", "mask", "Binary mask gating which units contribute to the error")
            .compartment("outputs", "dmu", "Derivative of the log-likelihood with respect to mu")
            .compartment("outputs", "dtarget", "Derivative of the log-likelihood with respect to target")
            .compartment("outputs", "L", "Local Gaussian log-likelihood (scalar)")
            .hyperparameter("n_units", "Number of error units")
            .hyperparameter("sigma", "Fixed variance of the Gaussian likelihood")
            .dynamics("dmu = (target - mu) * mask / sigma; dtarget = -dmu; L = -0.5 * sum(((target - mu) * mask)^2) / sigma")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use synaptix_npu_runtime::Circuit;

    #[test]
    fn test_error_signals_and_loss() {
        let mut circuit = Circuit::new();
        circuit
            .add_component(
                GaussianErrorCell::new(
                    "e",
                    GaussianErrorCellConfig {
                        sigma: 2.0,
                        ..GaussianErrorCellConfig::new(2)
                    },
                )
                .unwrap(),
            )
            .unwrap();
        circuit.compile("advance", &[("e", ADVANCE_STATE)]).unwrap();
        let mut state = circuit.initial_state();
        state.clamp("e", "target", array![[3.0f32, 1.0]].into_dyn()).unwrap();
        state.clamp("e", "mu", array![[1.0f32, 2.0]].into_dyn()).unwrap();
        let next = circuit
            .invoke("advance", &state, StepArgs::default())
            .unwrap();
        assert_eq!(next.value("e", "dmu").unwrap(), &array![[1.0f32, -0.5]].into_dyn());
        assert_eq!(next.value("e", "dtarget").unwrap(), &array![[-1.0f32, 0.5]].into_dyn());
        // −½ (4 + 1) / 2
        assert_eq!(next.value("e", "L").unwrap().sum(), -1.25);
    }

    #[test]
    fn test_mask_silences_units() {
        let mut circuit = Circuit::new();
        circuit
            .add_component(GaussianErrorCell::new("e", GaussianErrorCellConfig::new(2)).unwrap())
            .unwrap();
        circuit.compile("advance", &[("e", ADVANCE_STATE)]).unwrap();
        let mut state = circuit.initial_state();
        state.clamp("e", "target", array![[1.0f32, 1.0]].into_dyn()).unwrap();
        state.clamp("e", "mask", array![[0.0f32, 1.0]].into_dyn()).unwrap();
        let next = circuit
            .invoke("advance", &state, StepArgs::default())
            .unwrap();
        assert_eq!(next.value("e", "dmu").unwrap(), &array![[0.0f32, 1.0]].into_dyn());
    }

    #[test]
    fn test_nonpositive_sigma_rejected() {
        let config = GaussianErrorCellConfig {
            sigma: 0.0,
            ..GaussianErrorCellConfig::default()
        };
        assert!(GaussianErrorCell::new("e", config).is_err());
    }
}
