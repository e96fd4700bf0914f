// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # MSTDP-ET Synapse
//!
//! Three-factor learning: a trace STDP cable whose weight change is gated by an
//! external `modulator` (e.g. reward) through an eligibility trace. With
//! `tau_elg ≤ 0` the trace is disabled and the cable evolves by plain M-STDP.
//!
//! The STDP term stored in `dWeights` is recomputed against the weights produced
//! by the current step, so it feeds the eligibility of the next step.

use serde::{Deserialize, Serialize};
use synaptix_npu_neural::types::{full, zeros};
use synaptix_npu_neural::{RngKey, Tensor};
use synaptix_npu_plasticity::{ModulatedInputs, ModulatedRule};
use synaptix_npu_runtime::{
    unknown_transition, Component, ComponentView, Declarations, HasEligibilityTrace, HasEventReset,
    HasForwardTransform, HasPlasticityRule, HelpReport, Result, StepArgs, TransitionSpec, Updates,
    ADVANCE_STATE, EVOLVE, RESET,
};

use super::trace_stdp::{StdpCore, TraceStdpSynapseConfig};

/// MSTDP-ET synapse hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MstdpetSynapseConfig {
    #[serde(flatten)]
    pub stdp: TraceStdpSynapseConfig,
    /// Eligibility time constant (trace disabled when ≤ 0)
    pub tau_elg: f32,
    pub elg_decay: f32,
    /// Weight decay time constant (disabled when ≤ 0)
    pub tau_w: f32,
}

impl Default for MstdpetSynapseConfig {
    fn default() -> Self {
        Self {
            stdp: TraceStdpSynapseConfig::default(),
            tau_elg: 0.0,
            elg_decay: 1.0,
            tau_w: 0.0,
        }
    }
}

impl MstdpetSynapseConfig {
    pub fn new(n_in: usize, n_out: usize, a_plus: f32, a_minus: f32) -> Self {
        Self {
            stdp: TraceStdpSynapseConfig::new(n_in, n_out, a_plus, a_minus),
            ..Self::default()
        }
    }

    fn modulated_rule(&self) -> ModulatedRule {
        ModulatedRule {
            eta: self.stdp.eta,
            tau_elg: self.tau_elg,
            elg_decay: self.elg_decay,
            tau_w: self.tau_w,
            w_eps: 0.0,
        }
    }
}

const MSTDPET_TRANSITIONS: &[TransitionSpec] = &[
    TransitionSpec {
        name: ADVANCE_STATE,
        reads: &["inputs", "weights", "biases"],
        writes: &["outputs"],
    },
    TransitionSpec {
        name: EVOLVE,
        reads: &[
            "preSpike",
            "postSpike",
            "preTrace",
            "postTrace",
            "weights",
            "dWeights",
            "eligibility",
            "modulator",
            "outmask",
        ],
        writes: &["weights", "dWeights", "eligibility"],
    },
    TransitionSpec {
        name: RESET,
        reads: &[],
        writes: &[
            "inputs",
            "outputs",
            "preSpike",
            "postSpike",
            "preTrace",
            "postTrace",
            "dWeights",
            "eligibility",
            "outmask",
        ],
    },
];

#[derive(Debug, Clone)]
pub struct MstdpetSynapse {
    name: String,
    core: StdpCore,
    modulated: ModulatedRule,
}

impl MstdpetSynapse {
    pub fn new(name: &str, config: MstdpetSynapseConfig, key: RngKey) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            core: StdpCore::build(name, &config.stdp, key)?,
            modulated: config.modulated_rule(),
        })
    }

    pub fn modulated_rule(&self) -> &ModulatedRule {
        &self.modulated
    }

    fn syn_zeros(&self) -> Tensor {
        zeros(self.core.dense.weights().shape())
    }

    fn open_outmask(&self) -> Tensor {
        full(&[1, self.core.dense.shape.1], 1.0)
    }
}

impl HasForwardTransform for MstdpetSynapse {
    fn forward(&self, inputs: &Tensor, weights: &Tensor, biases: &Tensor) -> Result<Tensor> {
        self.core.dense.forward(inputs, weights, biases)
    }
}

impl HasPlasticityRule for MstdpetSynapse {
    fn evolve(&self, args: StepArgs, view: &ComponentView<'_>) -> Result<Updates> {
        let eligibility =
            self.decay_eligibility(view.get("eligibility")?, view.get("dWeights")?, args.dt);
        let step = self.modulated.evolve(
            &self.core.rule,
            self.core.traces(view)?,
            ModulatedInputs {
                weights: view.get("weights")?,
                eligibility: &eligibility,
                modulator: view.get("modulator")?,
                outmask: view.get("outmask")?,
            },
        )?;
        Ok(vec![
            ("weights", step.weights),
            ("dWeights", step.d_weights),
            ("eligibility", eligibility),
        ])
    }
}

impl HasEligibilityTrace for MstdpetSynapse {
    fn decay_eligibility(&self, eligibility: &Tensor, d_weights: &Tensor, dt: f32) -> Tensor {
        self.modulated.update_eligibility(eligibility, d_weights, dt)
    }
}

impl HasEventReset for MstdpetSynapse {
    fn reset_values(&self) -> Updates {
        let mut updates = self.core.reset_values();
        updates.push(("eligibility", self.syn_zeros()));
        updates.push(("outmask", self.open_outmask()));
        updates
    }
}

impl Component for MstdpetSynapse {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "MstdpetSynapse"
    }

    fn declare(&self, decl: &mut Declarations) -> Result<()> {
        self.core.declare(decl)?;
        decl.declare("modulator", zeros(&[self.core.dense.batch_size, 1]))?;
        decl.declare("eligibility", self.syn_zeros())?;
        decl.declare("outmask", self.open_outmask())
    }

    fn transitions(&self) -> &'static [TransitionSpec] {
        MSTDPET_TRANSITIONS
    }

    fn execute(&self, transition: &str, args: StepArgs, view: &ComponentView<'_>) -> Result<Updates> {
        match transition {
            ADVANCE_STATE => self.core.dense.advance(view),
            EVOLVE => self.evolve(args, view),
            RESET => Ok(self.reset_values()),
            other => Err(unknown_transition(&self.name, other)),
        }
    }

    fn persistent(&self) -> Vec<&'static str> {
        self.core.dense.persistent()
    }

    fn help(&self) -> HelpReport {
        self.core
            .help(
                self.kind(),
                "Adaptable synaptic transformation adjusted with modulated STDP (MSTDP) or MSTDP with eligibility traces (MSTDP-ET)",
            )
            .compartment("inputs", "modulator", "External modulatory signal values (e.g., reward values) (r)")
            .compartment("states", "eligibility", "Current state of eligibility trace at time t (Elg)")
            .compartment("states", "outmask", "Output-unit gate applied to the modulated update")
            .hyperparameter("tau_elg", "Eligibility trace time constant")
            .hyperparameter("elg_decay", "Eligibility decay factor")
            .hyperparameter("tau_w", "Synaptic decay time constant")
            .dynamics(
                "outputs = [W * inputs] * R; dW/dt = Elg * r * eta * outmask; \
                 dElg/dt = -Elg * elg_decay + dW_stdp/dt; \
                 dW_stdp/dt = A+ * (z_j - x_tar) * s_i - A- * s_j * z_i",
            )
    }
}
