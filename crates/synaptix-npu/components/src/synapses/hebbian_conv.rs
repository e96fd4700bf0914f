// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Hebbian Convolutional Synapse
//!
//! Convolutional cable whose kernel adapts by a Hebbian rule over `pre`/`post`
//! feature maps. `backtransmit` sends `post` back through the kernel into
//! `dInputs`. Gradient extents are corrected by offsets measured once at
//! construction.

use serde::{Deserialize, Serialize};
use synaptix_npu_neural::types::zeros;
use synaptix_npu_neural::{RngKey, Tensor};
use synaptix_npu_plasticity::{enforce_bounds, ConvHebbianRule, Optimizer, OptimizerKind};
use synaptix_npu_runtime::{
    unknown_transition, Component, ComponentView, Declarations, HasEventReset, HasForwardTransform,
    HasPlasticityRule, HelpReport, Result, StepArgs, TransitionSpec, Updates, ADVANCE_STATE,
    BACKTRANSMIT, EVOLVE, RESET,
};

use super::conv::{ConvCore, ConvDirection, ConvSynapseConfig};

/// Hebbian convolutional synapse hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HebbianConvSynapseConfig {
    #[serde(flatten)]
    pub conv: ConvSynapseConfig,
    pub eta: f32,
    /// Kernel clipping bound (disabled when ≤ 0)
    pub w_bound: f32,
    pub is_nonnegative: bool,
    /// Synaptic decay (disabled when ≤ 0)
    pub w_decay: f32,
    pub sign_value: f32,
    pub optim_type: OptimizerKind,
}

impl Default for HebbianConvSynapseConfig {
    fn default() -> Self {
        Self {
            conv: ConvSynapseConfig::default(),
            eta: 0.0,
            w_bound: 0.0,
            is_nonnegative: false,
            w_decay: 0.0,
            sign_value: 1.0,
            optim_type: OptimizerKind::Sgd,
        }
    }
}

const HEBBIAN_CONV_TRANSITIONS: &[TransitionSpec] = &[
    TransitionSpec {
        name: ADVANCE_STATE,
        reads: &["inputs", "weights", "biases"],
        writes: &["outputs"],
    },
    TransitionSpec {
        name: EVOLVE,
        reads: &["pre", "post", "weights", "biases", "opt_params"],
        writes: &["opt_params", "weights", "biases", "dWeights", "dBiases"],
    },
    TransitionSpec {
        name: BACKTRANSMIT,
        reads: &["post", "weights"],
        writes: &["dInputs"],
    },
    TransitionSpec {
        name: RESET,
        reads: &[],
        writes: &["inputs", "outputs", "pre", "post", "dInputs"],
    },
];

#[derive(Debug, Clone)]
pub struct HebbianConvSynapse {
    name: String,
    core: ConvCore,
    rule: ConvHebbianRule,
    optimizer: Optimizer,
    w_bound: f32,
    is_nonnegative: bool,
    opt_init: Tensor,
}

impl HebbianConvSynapse {
    pub fn new(name: &str, config: HebbianConvSynapseConfig, key: RngKey) -> Result<Self> {
        let core = ConvCore::build(name, &config.conv, ConvDirection::Forward, key)?;
        let rule = ConvHebbianRule::calibrate(
            core.batch_size,
            core.x_size,
            core.weights(),
            core.stride,
            core.padding,
            config.sign_value,
            config.w_decay,
        )?;
        let optimizer = Optimizer::new(config.optim_type, config.eta);
        let biases = core.biases();
        let opt_init = if core.bias_enabled() {
            optimizer.init(&[core.weights(), &biases])
        } else {
            optimizer.init(&[core.weights()])
        };
        Ok(Self {
            name: name.to_string(),
            core,
            rule,
            optimizer,
            w_bound: config.w_bound,
            is_nonnegative: config.is_nonnegative,
            opt_init,
        })
    }

    pub fn core(&self) -> &ConvCore {
        &self.core
    }

    pub fn rule(&self) -> &ConvHebbianRule {
        &self.rule
    }

    fn backtransmit(&self, view: &ComponentView<'_>) -> Result<Updates> {
        let d_inputs = self.rule.backtransmit(view.get("weights")?, view.get("post")?)?;
        Ok(vec![("dInputs", d_inputs)])
    }
}

impl HasForwardTransform for HebbianConvSynapse {
    fn forward(&self, inputs: &Tensor, weights: &Tensor, biases: &Tensor) -> Result<Tensor> {
        self.core.forward(inputs, weights, biases)
    }
}

impl HasPlasticityRule for HebbianConvSynapse {
    fn evolve(&self, _args: StepArgs, view: &ComponentView<'_>) -> Result<Updates> {
        let weights = view.get("weights")?;
        let opt_params = view.get("opt_params")?;
        let (d_weights, d_biases) = self.rule.calc_update(
            view.get("pre")?,
            view.get("post")?,
            weights,
            self.core.bias_enabled(),
        )?;

        let mut updates: Updates = Vec::with_capacity(5);
        let mut params = match &d_biases {
            Some(db) => {
                let biases = view.get("biases")?;
                let (state, params) = self.optimizer.step(
                    opt_params,
                    &[weights.clone(), biases.clone()],
                    &[d_weights.clone(), db.clone()],
                )?;
                updates.push(("opt_params", state));
                params
            }
            None => {
                let (state, params) =
                    self.optimizer
                        .step(opt_params, &[weights.clone()], &[d_weights.clone()])?;
                updates.push(("opt_params", state));
                params
            }
        };
        if let Some(db) = d_biases {
            if let Some(biases) = params.pop() {
                updates.push(("biases", biases));
            }
            updates.push(("dBiases", db));
        }
        if let Some(w) = params.pop() {
            updates.push(("weights", enforce_bounds(w, self.w_bound, self.is_nonnegative)));
        }
        updates.push(("dWeights", d_weights));
        Ok(updates)
    }
}

impl HasEventReset for HebbianConvSynapse {
    fn reset_values(&self) -> Updates {
        let mut updates = self.core.reset_values();
        updates.push(("pre", zeros(self.core.in_shape())));
        updates.push(("post", zeros(self.core.out_shape())));
        updates.push(("dInputs", zeros(self.core.in_shape())));
        updates
    }
}

impl Component for HebbianConvSynapse {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "HebbianConvSynapse"
    }

    fn declare(&self, decl: &mut Declarations) -> Result<()> {
        self.core.declare(decl)?;
        decl.declare("dWeights", zeros(self.core.weights().shape()))?;
        decl.declare("dInputs", zeros(self.core.in_shape()))?;
        decl.declare("dBiases", self.core.biases() * 0.0)?;
        decl.declare("pre", zeros(self.core.in_shape()))?;
        decl.declare("post", zeros(self.core.out_shape()))?;
        decl.declare("opt_params", self.opt_init.clone())
    }

    fn transitions(&self) -> &'static [TransitionSpec] {
        HEBBIAN_CONV_TRANSITIONS
    }

    fn execute(&self, transition: &str, args: StepArgs, view: &ComponentView<'_>) -> Result<Updates> {
        match transition {
            ADVANCE_STATE => self.core.advance(view),
            EVOLVE => self.evolve(args, view),
            BACKTRANSMIT => self.backtransmit(view),
            RESET => Ok(self.reset_values()),
            other => Err(unknown_transition(&self.name, other)),
        }
    }

    fn persistent(&self) -> Vec<&'static str> {
        self.core.persistent()
    }

    fn help(&self) -> HelpReport {
        self.core
            .help(
                self.kind(),
                "Adaptable synaptic convolution adjusted via a two-factor Hebbian rule",
            )
            .compartment("inputs", "pre", "Pre-synaptic statistic for Hebb rule (z_j)")
            .compartment("inputs", "post", "Post-synaptic statistic for Hebb rule (z_i)")
            .compartment("analytics", "dWeights", "Synaptic filter value adjustment 4D-tensor produced at time t")
            .compartment("analytics", "dBiases", "Synaptic bias/base-rate value adjustment produced at time t")
            .compartment("outputs", "dInputs", "Tensor containing back-transmitted signal values")
            .compartment("states", "opt_params", "Locally-embedded optimizer statistics")
            .hyperparameter("eta", "Global learning rate")
            .hyperparameter("w_bound", "Kernel clipping bound applied after each update")
            .hyperparameter("is_nonnegative", "Clip kernels to [0, w_bound] instead of [-w_bound, w_bound]")
            .hyperparameter("w_decay", "Synaptic decay applied to the kernel update")
            .hyperparameter("sign_value", "Multiplier on the final update and back-transmitted signal")
            .hyperparameter("optim_type", "Optimizer used to adjust synaptic values (sgd or adam)")
            .dynamics("outputs = [K * inputs] * R + b; dK = calc_dK(pre, post) * sign_value - w_decay * K")
    }
}
