// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Trace STDP Synapse
//!
//! Dense cable adjusted by pair-based, trace-driven STDP:
//!
//! ```text
//! dW = A+ · (z_pre − x_tar)ᵀ · s_post − A− · s_preᵀ · z_post
//! W  ← clip(W + η · dW, 0, w_bound)
//! ```

use serde::{Deserialize, Serialize};
use synaptix_npu_neural::types::zeros;
use synaptix_npu_neural::{RngKey, Tensor, WeightInit};
use synaptix_npu_plasticity::{SpikeTraces, TraceStdpRule};
use synaptix_npu_runtime::{
    unknown_transition, Component, ComponentView, Declarations, HasEventReset, HasForwardTransform,
    HasPlasticityRule, HelpReport, Result, StepArgs, TransitionSpec, Updates, ADVANCE_STATE, EVOLVE,
    RESET,
};

use super::dense::{default_dense_init, DenseCore, DenseSynapseConfig};

/// Trace STDP synapse hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceStdpSynapseConfig {
    /// `(n_in, n_out)`
    pub shape: (usize, usize),
    #[serde(flatten)]
    pub rule: TraceStdpRule,
    pub eta: f32,
    pub weight_init: Option<WeightInit>,
    pub resist_scale: f32,
    pub p_conn: f64,
    pub batch_size: usize,
}

impl Default for TraceStdpSynapseConfig {
    fn default() -> Self {
        Self {
            shape: (1, 1),
            rule: TraceStdpRule::default(),
            eta: 1.0,
            weight_init: None,
            resist_scale: 1.0,
            p_conn: 1.0,
            batch_size: 1,
        }
    }
}

impl TraceStdpSynapseConfig {
    pub fn new(n_in: usize, n_out: usize, a_plus: f32, a_minus: f32) -> Self {
        Self {
            shape: (n_in, n_out),
            rule: TraceStdpRule {
                a_plus,
                a_minus,
                ..TraceStdpRule::default()
            },
            ..Self::default()
        }
    }

    /// Underlying dense cable; STDP cables carry no biases
    pub(crate) fn dense(&self) -> DenseSynapseConfig {
        DenseSynapseConfig {
            shape: self.shape,
            weight_init: self.weight_init.clone(),
            bias_init: None,
            resist_scale: self.resist_scale,
            p_conn: self.p_conn,
            batch_size: self.batch_size,
        }
    }
}

/// Dense cable plus spike/trace compartments shared by the STDP family
#[derive(Debug, Clone)]
pub(crate) struct StdpCore {
    pub dense: DenseCore,
    pub rule: TraceStdpRule,
    pub eta: f32,
}

impl StdpCore {
    pub fn build(name: &str, config: &TraceStdpSynapseConfig, key: RngKey) -> Result<Self> {
        Ok(Self {
            dense: DenseCore::build(name, &config.dense(), default_dense_init(), key)?,
            rule: config.rule,
            eta: config.eta,
        })
    }

    pub fn declare(&self, decl: &mut Declarations) -> Result<()> {
        self.dense.declare(decl)?;
        decl.declare("preSpike", self.dense.pre_zeros())?;
        decl.declare("postSpike", self.dense.post_zeros())?;
        decl.declare("preTrace", self.dense.pre_zeros())?;
        decl.declare("postTrace", self.dense.post_zeros())?;
        decl.declare("dWeights", zeros(self.dense.weights().shape()))
    }

    pub fn traces<'a>(&self, view: &ComponentView<'a>) -> Result<SpikeTraces<'a>> {
        Ok(SpikeTraces {
            pre_spike: view.get("preSpike")?,
            post_spike: view.get("postSpike")?,
            pre_trace: view.get("preTrace")?,
            post_trace: view.get("postTrace")?,
        })
    }

    pub fn reset_values(&self) -> Updates {
        let mut updates = self.dense.reset_values();
        updates.push(("preSpike", self.dense.pre_zeros()));
        updates.push(("postSpike", self.dense.post_zeros()));
        updates.push(("preTrace", self.dense.pre_zeros()));
        updates.push(("postTrace", self.dense.post_zeros()));
        updates.push(("dWeights", zeros(self.dense.weights().shape())));
        updates
    }

    pub fn help(&self, kind: &str, description: &str) -> HelpReport {
        self.dense
            .help(kind, description)
            .compartment("inputs", "preSpike", "Pre-synaptic spike compartment value/term for STDP (s_j)")
            .compartment("inputs", "postSpike", "Post-synaptic spike compartment value/term for STDP (s_i)")
            .compartment("inputs", "preTrace", "Pre-synaptic trace value term for STDP (z_j)")
            .compartment("inputs", "postTrace", "Post-synaptic trace value term for STDP (z_i)")
            .compartment("analytics", "dWeights", "Synaptic weight value adjustment matrix produced at time t")
            .hyperparameter("a_plus", "Strength of long-term potentiation (LTP)")
            .hyperparameter("a_minus", "Strength of long-term depression (LTD)")
            .hyperparameter("eta", "Global learning rate")
            .hyperparameter("mu", "Power factor for STDP adjustment")
            .hyperparameter("pretrace_target", "Pre-synaptic disconnecting/decay factor (x_tar)")
            .hyperparameter("w_bound", "Soft weight bound")
    }
}

const TRACE_STDP_TRANSITIONS: &[TransitionSpec] = &[
    TransitionSpec {
        name: ADVANCE_STATE,
        reads: &["inputs", "weights", "biases"],
        writes: &["outputs"],
    },
    TransitionSpec {
        name: EVOLVE,
        reads: &["preSpike", "postSpike", "preTrace", "postTrace", "weights"],
        writes: &["weights", "dWeights"],
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
        ],
    },
];

#[derive(Debug, Clone)]
pub struct TraceStdpSynapse {
    name: String,
    core: StdpCore,
}

impl TraceStdpSynapse {
    pub fn new(name: &str, config: TraceStdpSynapseConfig, key: RngKey) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            core: StdpCore::build(name, &config, key)?,
        })
    }

    pub fn core(&self) -> &DenseCore {
        &self.core.dense
    }

    pub fn rule(&self) -> &TraceStdpRule {
        &self.core.rule
    }
}

impl HasForwardTransform for TraceStdpSynapse {
    fn forward(&self, inputs: &Tensor, weights: &Tensor, biases: &Tensor) -> Result<Tensor> {
        self.core.dense.forward(inputs, weights, biases)
    }
}

impl HasPlasticityRule for TraceStdpSynapse {
    fn evolve(&self, _args: StepArgs, view: &ComponentView<'_>) -> Result<Updates> {
        let weights = view.get("weights")?;
        let dw = self.core.rule.calc_update(self.core.traces(view)?, weights)?;
        let next = self.core.rule.apply(weights, &dw, self.core.eta, 0.0);
        Ok(vec![("weights", next), ("dWeights", dw)])
    }
}

impl HasEventReset for TraceStdpSynapse {
    fn reset_values(&self) -> Updates {
        self.core.reset_values()
    }
}

impl Component for TraceStdpSynapse {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "TraceStdpSynapse"
    }

    fn declare(&self, decl: &mut Declarations) -> Result<()> {
        self.core.declare(decl)
    }

    fn transitions(&self) -> &'static [TransitionSpec] {
        TRACE_STDP_TRANSITIONS
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
                "Adaptable synaptic transformation adjusted with trace-based spike-timing-dependent plasticity",
            )
            .dynamics("outputs = [W * inputs] * R; dW = A+ * (z_j - x_tar) * s_i - A- * s_j * z_i")
    }
}
