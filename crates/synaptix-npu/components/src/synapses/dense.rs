// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Dense synaptic cable: `outputs = (inputs · W) · R + b`

use serde::{Deserialize, Serialize};
use synaptix_npu_neural::types::{add_broadcast, matmul, zeros};
use synaptix_npu_neural::{RngKey, Tensor, WeightInit};
use synaptix_npu_runtime::{
    unknown_transition, Component, ComponentView, Declarations, HasEventReset, HasForwardTransform,
    HelpReport, Result, StepArgs, TransitionSpec, Updates, ADVANCE_STATE, RESET,
};

use super::{bias_value, init_biases, init_weights, persistent_params, sparsify};

/// Dense synapse hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenseSynapseConfig {
    /// `(n_in, n_out)`
    pub shape: (usize, usize),
    /// Defaults to `uniform(0.025, 0.8)`
    pub weight_init: Option<WeightInit>,
    /// Biases are disabled when `None`
    pub bias_init: Option<WeightInit>,
    pub resist_scale: f32,
    /// Connection probability; values in `(0, 1)` sparsify the initial weights
    pub p_conn: f64,
    pub batch_size: usize,
}

impl Default for DenseSynapseConfig {
    fn default() -> Self {
        Self {
            shape: (1, 1),
            weight_init: None,
            bias_init: None,
            resist_scale: 1.0,
            p_conn: 1.0,
            batch_size: 1,
        }
    }
}

impl DenseSynapseConfig {
    pub fn new(n_in: usize, n_out: usize) -> Self {
        Self {
            shape: (n_in, n_out),
            ..Self::default()
        }
    }
}

/// Default dense initializer
pub fn default_dense_init() -> WeightInit {
    WeightInit::uniform(0.025, 0.8)
}

/// Matrix transform shared by dense, Hebbian and patched synapses
#[derive(Debug, Clone)]
pub struct DenseCore {
    pub shape: (usize, usize),
    pub batch_size: usize,
    pub resist_scale: f32,
    weights: Tensor,
    biases: Option<Tensor>,
}

impl DenseCore {
    /// Sample parameters from `config`, splitting `key` for weights, sparsity mask and biases
    pub fn build(name: &str, config: &DenseSynapseConfig, fallback: WeightInit, key: RngKey) -> Result<Self> {
        let (n_in, n_out) = config.shape;
        let (wkey, rest) = key.split();
        let (mkey, bkey) = rest.split();
        let weights = init_weights(name, wkey, config.weight_init.as_ref(), fallback, &[n_in, n_out])?;
        let weights = sparsify(name, mkey, weights, config.p_conn)?;
        let biases = init_biases(name, bkey, config.bias_init.as_ref(), &[1, n_out])?;
        Ok(Self::from_parts(config, weights, biases))
    }

    /// Core around explicitly given parameters
    pub fn from_parts(config: &DenseSynapseConfig, weights: Tensor, biases: Option<Tensor>) -> Self {
        Self {
            shape: (weights.shape()[0], weights.shape()[1]),
            batch_size: config.batch_size,
            resist_scale: config.resist_scale,
            weights,
            biases,
        }
    }

    pub fn weights(&self) -> &Tensor {
        &self.weights
    }

    pub fn bias_enabled(&self) -> bool {
        self.biases.is_some()
    }

    pub fn biases(&self) -> Tensor {
        bias_value(self.biases.as_ref())
    }

    /// `(batch, n_in)` zeros
    pub fn pre_zeros(&self) -> Tensor {
        zeros(&[self.batch_size, self.shape.0])
    }

    /// `(batch, n_out)` zeros
    pub fn post_zeros(&self) -> Tensor {
        zeros(&[self.batch_size, self.shape.1])
    }

    pub fn declare(&self, decl: &mut Declarations) -> Result<()> {
        decl.declare("inputs", self.pre_zeros())?;
        decl.declare("outputs", self.post_zeros())?;
        decl.declare("weights", self.weights.clone())?;
        decl.declare("biases", self.biases())
    }

    pub fn forward(&self, inputs: &Tensor, weights: &Tensor, biases: &Tensor) -> Result<Tensor> {
        let out = matmul(inputs, weights)? * self.resist_scale;
        Ok(add_broadcast(&out, biases, "dense biases")?)
    }

    pub fn advance(&self, view: &ComponentView<'_>) -> Result<Updates> {
        let outputs = self.forward(view.get("inputs")?, view.get("weights")?, view.get("biases")?)?;
        Ok(vec![("outputs", outputs)])
    }

    pub fn reset_values(&self) -> Updates {
        vec![("inputs", self.pre_zeros()), ("outputs", self.post_zeros())]
    }

    pub fn persistent(&self) -> Vec<&'static str> {
        persistent_params(self.bias_enabled())
    }

    pub fn help(&self, kind: &str, description: &str) -> HelpReport {
        HelpReport::new(kind, description)
            .compartment("inputs", "inputs", "Takes in external input signal values")
            .compartment("states", "weights", "Synapse efficacy/strength parameter values")
            .compartment("states", "biases", "Base-rate/bias parameter values")
            .compartment("outputs", "outputs", "Output of synaptic transformation")
            .hyperparameter("shape", "Shape of synaptic weight value matrix; number inputs x number outputs")
            .hyperparameter("batch_size", "Batch size dimension of this component")
            .hyperparameter("weight_init", "Initialization conditions for synaptic weight (W) values")
            .hyperparameter("bias_init", "Initialization conditions for bias/base-rate (b) values")
            .hyperparameter("resist_scale", "Resistance level scaling factor (R) applied to the transform")
            .hyperparameter("p_conn", "Probability of a connection existing (otherwise masked to zero)")
            .dynamics("outputs = [inputs · W] * R + b")
    }
}

pub(crate) const DENSE_TRANSITIONS: &[TransitionSpec] = &[
    TransitionSpec {
        name: ADVANCE_STATE,
        reads: &["inputs", "weights", "biases"],
        writes: &["outputs"],
    },
    TransitionSpec {
        name: RESET,
        reads: &[],
        writes: &["inputs", "outputs"],
    },
];

/// Non-adaptive dense cable
#[derive(Debug, Clone)]
pub struct DenseSynapse {
    name: String,
    core: DenseCore,
}

impl DenseSynapse {
    pub fn new(name: &str, config: DenseSynapseConfig, key: RngKey) -> Result<Self> {
        let core = DenseCore::build(name, &config, default_dense_init(), key)?;
        Ok(Self {
            name: name.to_string(),
            core,
        })
    }

    pub fn core(&self) -> &DenseCore {
        &self.core
    }
}

impl HasForwardTransform for DenseSynapse {
    fn forward(&self, inputs: &Tensor, weights: &Tensor, biases: &Tensor) -> Result<Tensor> {
        self.core.forward(inputs, weights, biases)
    }
}

impl HasEventReset for DenseSynapse {
    fn reset_values(&self) -> Updates {
        self.core.reset_values()
    }
}

impl Component for DenseSynapse {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "DenseSynapse"
    }

    fn declare(&self, decl: &mut Declarations) -> Result<()> {
        self.core.declare(decl)
    }

    fn transitions(&self) -> &'static [TransitionSpec] {
        DENSE_TRANSITIONS
    }

    fn execute(&self, transition: &str, _args: StepArgs, view: &ComponentView<'_>) -> Result<Updates> {
        match transition {
            ADVANCE_STATE => self.core.advance(view),
            RESET => Ok(self.reset_values()),
            other => Err(unknown_transition(&self.name, other)),
        }
    }

    fn persistent(&self) -> Vec<&'static str> {
        self.core.persistent()
    }

    fn help(&self) -> HelpReport {
        self.core.help(
            self.kind(),
            "Dense synaptic cable; a scaled linear transformation of inputs without adaptation",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use synaptix_npu_runtime::{Circuit, CompartmentPath};

    #[test]
    fn test_default_initializer_range() {
        let w = DenseSynapse::new("W", DenseSynapseConfig::new(4, 5), RngKey::new(3)).unwrap();
        let weights = w.core().weights();
        assert_eq!(weights.shape(), &[4, 5]);
        assert!(weights.iter().all(|&x| (0.025..=0.8).contains(&x)));
        assert!(!w.core().bias_enabled());
    }

    #[test]
    fn test_forward_scales_and_adds_bias() {
        let config = DenseSynapseConfig {
            shape: (2, 2),
            weight_init: Some(WeightInit::constant(1.0)),
            bias_init: Some(WeightInit::constant(0.5)),
            resist_scale: 2.0,
            ..DenseSynapseConfig::default()
        };
        let w = DenseSynapse::new("W", config, RngKey::new(0)).unwrap();
        let out = w
            .forward(&array![[1.0f32, 2.0]].into_dyn(), w.core().weights(), &w.core().biases())
            .unwrap();
        assert_eq!(out, array![[6.5f32, 6.5]].into_dyn());
        assert_eq!(w.persistent(), vec!["weights", "biases"]);
    }

    #[test]
    fn test_advance_inside_circuit() {
        let config = DenseSynapseConfig {
            shape: (3, 2),
            weight_init: Some(WeightInit::constant(0.5)),
            ..DenseSynapseConfig::default()
        };
        let mut circuit = Circuit::new();
        circuit
            .add_component(DenseSynapse::new("W", config, RngKey::new(1)).unwrap())
            .unwrap();
        circuit.compile("advance", &[("W", ADVANCE_STATE)]).unwrap();
        let mut state = circuit.initial_state();
        state
            .clamp("W", "inputs", array![[1.0f32, 1.0, 2.0]].into_dyn())
            .unwrap();
        let next = circuit
            .invoke("advance", &state, StepArgs::new(0.0, 1.0))
            .unwrap();
        let out = next.get(&CompartmentPath::new("W", "outputs")).unwrap();
        assert_eq!(out, &array![[2.0f32, 2.0]].into_dyn());
    }
}
