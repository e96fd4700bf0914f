// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Hebbian Synapse
//!
//! Dense cable adapted by a two-factor Hebbian rule. `evolve` computes
//! `(dW, db)` from the `pre`/`post` statistics, takes an optimizer step over the
//! enabled parameters and enforces the weight bound.

use serde::{Deserialize, Serialize};
use synaptix_npu_neural::types::zeros;
use synaptix_npu_neural::{RngKey, Tensor};
use synaptix_npu_plasticity::{enforce_bounds, HebbianRule, Optimizer, OptimizerKind, Prior};
use synaptix_npu_runtime::{
    unknown_transition, Component, ComponentView, Declarations, HasEventReset, HasForwardTransform,
    HasPlasticityRule, HelpReport, Result, StepArgs, TransitionSpec, Updates, ADVANCE_STATE,
    EVOLVE, RESET,
};

use super::dense::{default_dense_init, DenseCore, DenseSynapseConfig};

/// Hebbian synapse hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HebbianSynapseConfig {
    #[serde(flatten)]
    pub dense: DenseSynapseConfig,
    /// Global learning rate
    pub eta: f32,
    pub w_bound: f32,
    pub is_nonnegative: bool,
    pub prior: Prior,
    /// Shorthand for a ridge prior when positive
    pub w_decay: f32,
    pub sign_value: f32,
    pub optim_type: OptimizerKind,
    pub pre_wght: f32,
    pub post_wght: f32,
}

impl Default for HebbianSynapseConfig {
    fn default() -> Self {
        Self {
            dense: DenseSynapseConfig::default(),
            eta: 0.0,
            w_bound: 1.0,
            is_nonnegative: false,
            prior: Prior::Constant,
            w_decay: 0.0,
            sign_value: 1.0,
            optim_type: OptimizerKind::Sgd,
            pre_wght: 1.0,
            post_wght: 1.0,
        }
    }
}

impl HebbianSynapseConfig {
    pub fn new(n_in: usize, n_out: usize) -> Self {
        Self {
            dense: DenseSynapseConfig::new(n_in, n_out),
            ..Self::default()
        }
    }

    pub fn rule(&self) -> HebbianRule {
        HebbianRule {
            w_bound: self.w_bound,
            is_nonnegative: self.is_nonnegative,
            sign_value: self.sign_value,
            prior: self.prior,
            pre_wght: self.pre_wght,
            post_wght: self.post_wght,
        }
        .with_w_decay(self.w_decay)
    }
}

const HEBBIAN_TRANSITIONS: &[TransitionSpec] = &[
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
        name: RESET,
        reads: &[],
        writes: &["inputs", "outputs", "pre", "post", "dWeights", "dBiases"],
    },
];

/// Plastic parameters shared by dense-shaped Hebbian cables
#[derive(Debug, Clone)]
pub(crate) struct HebbianLearning {
    pub rule: HebbianRule,
    pub optimizer: Optimizer,
    pub opt_init: Tensor,
}

impl HebbianLearning {
    pub fn new(core: &DenseCore, rule: HebbianRule, optim_type: OptimizerKind, eta: f32) -> Self {
        let optimizer = Optimizer::new(optim_type, eta);
        let biases = core.biases();
        let opt_init = if core.bias_enabled() {
            optimizer.init(&[core.weights(), &biases])
        } else {
            optimizer.init(&[core.weights()])
        };
        Self {
            rule,
            optimizer,
            opt_init,
        }
    }

    pub fn declare(&self, core: &DenseCore, decl: &mut Declarations) -> Result<()> {
        decl.declare("pre", core.pre_zeros())?;
        decl.declare("post", core.post_zeros())?;
        decl.declare("dWeights", zeros(&[core.shape.0, core.shape.1]))?;
        decl.declare("dBiases", zeros(&[1, core.shape.1]))?;
        decl.declare("opt_params", self.opt_init.clone())
    }

    /// Hebbian update, optimizer step and bound enforcement; `mask` zeroes
    /// fixed-absent connections in both the update and the result
    pub fn evolve(&self, core: &DenseCore, view: &ComponentView<'_>, mask: Option<&Tensor>) -> Result<Updates> {
        let weights = view.get("weights")?;
        let biases = view.get("biases")?;
        let opt_params = view.get("opt_params")?;
        let (mut d_weights, d_biases) =
            self.rule
                .calc_update(view.get("pre")?, view.get("post")?, weights)?;
        if let Some(mask) = mask {
            d_weights *= mask;
        }

        let mut updates: Updates = Vec::with_capacity(5);
        let next_weights = if core.bias_enabled() {
            let (state, mut params) = self.optimizer.step(
                opt_params,
                &[weights.clone(), biases.clone()],
                &[d_weights.clone(), d_biases.clone()],
            )?;
            let next_biases = params.pop();
            let next_weights = params.pop();
            updates.push(("opt_params", state));
            if let Some(b) = next_biases {
                updates.push(("biases", b));
            }
            next_weights
        } else {
            let (state, mut params) =
                self.optimizer
                    .step(opt_params, &[weights.clone()], &[d_weights.clone()])?;
            updates.push(("opt_params", state));
            params.pop()
        };

        if let Some(w) = next_weights {
            let mut w = enforce_bounds(w, self.rule.w_bound, self.rule.is_nonnegative);
            if let Some(mask) = mask {
                w *= mask;
            }
            updates.push(("weights", w));
        }
        updates.push(("dWeights", d_weights));
        updates.push(("dBiases", d_biases));
        Ok(updates)
    }

    pub fn reset_values(&self, core: &DenseCore) -> Updates {
        let mut updates = core.reset_values();
        updates.push(("pre", core.pre_zeros()));
        updates.push(("post", core.post_zeros()));
        updates.push(("dWeights", zeros(&[core.shape.0, core.shape.1])));
        updates.push(("dBiases", zeros(&[1, core.shape.1])));
        updates
    }

    pub fn help(&self, report: HelpReport) -> HelpReport {
        report
            .compartment("inputs", "pre", "Pre-synaptic statistic for Hebb rule (z_j)")
            .compartment("inputs", "post", "Post-synaptic statistic for Hebb rule (z_i)")
            .compartment("analytics", "dWeights", "Synaptic weight value adjustment matrix produced at time t")
            .compartment("analytics", "dBiases", "Synaptic bias/base-rate value adjustment vector produced at time t")
            .compartment("states", "opt_params", "Locally-embedded optimizer statistics")
            .hyperparameter("eta", "Global (fixed) learning rate")
            .hyperparameter("w_bound", "Soft synaptic bound applied to synapses post-update")
            .hyperparameter("is_nonnegative", "Constrain synapses to be non-negative post-update")
            .hyperparameter("prior", "Prior name and strength for synaptic updating")
            .hyperparameter("sign_value", "Multiplier on the final update; negative values give Hebbian descent")
            .hyperparameter("optim_type", "Optimizer used to adjust synaptic values (sgd or adam)")
            .hyperparameter("pre_wght", "Pre-synaptic weighting coefficient (q_pre)")
            .hyperparameter("post_wght", "Post-synaptic weighting coefficient (q_post)")
    }
}

/// Dense cable with two-factor Hebbian adaptation
#[derive(Debug, Clone)]
pub struct HebbianSynapse {
    name: String,
    core: DenseCore,
    learning: HebbianLearning,
}

impl HebbianSynapse {
    pub fn new(name: &str, config: HebbianSynapseConfig, key: RngKey) -> Result<Self> {
        let core = DenseCore::build(name, &config.dense, default_dense_init(), key)?;
        let learning = HebbianLearning::new(&core, config.rule(), config.optim_type, config.eta);
        Ok(Self {
            name: name.to_string(),
            core,
            learning,
        })
    }

    pub fn core(&self) -> &DenseCore {
        &self.core
    }

    pub fn rule(&self) -> &HebbianRule {
        &self.learning.rule
    }
}

impl HasForwardTransform for HebbianSynapse {
    fn forward(&self, inputs: &Tensor, weights: &Tensor, biases: &Tensor) -> Result<Tensor> {
        self.core.forward(inputs, weights, biases)
    }
}

impl HasPlasticityRule for HebbianSynapse {
    fn evolve(&self, _args: StepArgs, view: &ComponentView<'_>) -> Result<Updates> {
        self.learning.evolve(&self.core, view, None)
    }
}

impl HasEventReset for HebbianSynapse {
    fn reset_values(&self) -> Updates {
        self.learning.reset_values(&self.core)
    }
}

impl Component for HebbianSynapse {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "HebbianSynapse"
    }

    fn declare(&self, decl: &mut Declarations) -> Result<()> {
        self.core.declare(decl)?;
        self.learning.declare(&self.core, decl)
    }

    fn transitions(&self) -> &'static [TransitionSpec] {
        HEBBIAN_TRANSITIONS
    }

    fn execute(&self, transition: &str, args: StepArgs, view: &ComponentView<'_>) -> Result<Updates> {
        match transition {
            ADVANCE_STATE => self.core.advance(view),
            EVOLVE => self.evolve(args, view),
            RESET => Ok(self.reset_values()),
            other => Err(unknown_transition(&self.name, other)),
        }
    }

    fn persistent(&self) -> Vec<&'static str> {
        self.core.persistent()
    }

    fn help(&self) -> HelpReport {
        let report = self.core.help(
            self.kind(),
            "Adaptable dense synaptic transformation adjusted via two-factor Hebbian plasticity",
        );
        self.learning.help(report).dynamics(
            "outputs = [inputs · W] * R + b; dW_ij/dt = eta * [(z_j * q_pre) * (z_i * q_post)] - g(W_ij) * prior_lambda",
        )
    }
}
