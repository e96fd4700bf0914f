// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Patched Synapses
//!
//! A dense cable whose weight matrix is block diagonal with overlap: `n_sub_models`
//! blocks of `(n_in/n + 2·s_i, n_out/n + 2·s_j)`, each shifted by one sub-block,
//! with the outer `s_i` rows and `s_j` columns cleared. Entries outside the blocks
//! are held at exactly zero by a fixed `mask`.
//!
//! ```text
//!   [ W¹  0   0  ]
//!   [ 0   W²  0  ]
//!   [ 0   0   W³ ]
//! ```

use ndarray::s;
use serde::{Deserialize, Serialize};
use synaptix_npu_neural::types::zeros;
use synaptix_npu_neural::{sample, NeuralError, RngKey, Tensor, WeightInit};
use synaptix_npu_plasticity::{apply_mask, HebbianRule, OptimizerKind, Prior};
use synaptix_npu_runtime::{
    unknown_transition, Component, ComponentView, Declarations, HasEventReset, HasForwardTransform,
    HasPlasticityRule, HelpReport, Result, StepArgs, TransitionSpec, Updates, ADVANCE_STATE,
    EVOLVE, RESET,
};
use tracing::info;

use super::dense::{DenseCore, DenseSynapseConfig, DENSE_TRANSITIONS};
use super::hebbian::HebbianLearning;
use super::{init_biases, sparsify};

/// Patched synapse hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchedSynapseConfig {
    /// Overall `(n_in, n_out)` before stride padding
    pub shape: (usize, usize),
    pub n_sub_models: usize,
    /// Overlap `(s_i, s_j)` between neighbouring blocks
    pub stride_shape: (usize, usize),
    /// Defaults to `fan_in_gaussian`
    pub weight_init: Option<WeightInit>,
    pub bias_init: Option<WeightInit>,
    pub resist_scale: f32,
    pub p_conn: f64,
    pub batch_size: usize,
}

impl Default for PatchedSynapseConfig {
    fn default() -> Self {
        Self {
            shape: (1, 1),
            n_sub_models: 1,
            stride_shape: (0, 0),
            weight_init: None,
            bias_init: None,
            resist_scale: 1.0,
            p_conn: 1.0,
            batch_size: 1,
        }
    }
}

impl PatchedSynapseConfig {
    pub fn new(shape: (usize, usize), n_sub_models: usize) -> Self {
        Self {
            shape,
            n_sub_models,
            ..Self::default()
        }
    }

    /// Full weight shape including the stride overlap
    pub fn weight_shape(&self) -> Result<(usize, usize)> {
        let n = self.checked_sub_models()?;
        let (si, sj) = self.stride_shape;
        Ok((
            n * (self.shape.0 / n) + 2 * si,
            n * (self.shape.1 / n) + 2 * sj,
        ))
    }

    fn checked_sub_models(&self) -> Result<usize> {
        if self.n_sub_models == 0 || self.n_sub_models > self.shape.0.min(self.shape.1) {
            return Err(NeuralError::invalid_parameter(
                "n_sub_models",
                format!(
                    "must be between 1 and min{:?}, got {}",
                    self.shape, self.n_sub_models
                ),
            )
            .into());
        }
        Ok(self.n_sub_models)
    }

    fn block(&self, i: usize) -> ((usize, usize), (usize, usize)) {
        let n = self.n_sub_models;
        let (di, dj) = (self.shape.0 / n, self.shape.1 / n);
        let (si, sj) = self.stride_shape;
        ((i * di, (i + 1) * di + 2 * si), (i * dj, (i + 1) * dj + 2 * sj))
    }

    fn dense(&self) -> DenseSynapseConfig {
        DenseSynapseConfig {
            shape: self.shape,
            weight_init: self.weight_init.clone(),
            bias_init: self.bias_init.clone(),
            resist_scale: self.resist_scale,
            p_conn: self.p_conn,
            batch_size: self.batch_size,
        }
    }
}

/// Ones over the blocks, zeros elsewhere (including the cleared stride border)
pub fn patch_mask(config: &PatchedSynapseConfig) -> Result<Tensor> {
    let (rows, cols) = config.weight_shape()?;
    let (si, sj) = config.stride_shape;
    let mut mask = zeros(&[rows, cols]);
    for i in 0..config.n_sub_models {
        let ((r0, r1), (c0, c1)) = config.block(i);
        mask.slice_mut(s![r0..r1, c0..c1]).fill(1.0);
    }
    if si > 0 {
        mask.slice_mut(s![..si, ..]).fill(0.0);
        mask.slice_mut(s![rows - si.., ..]).fill(0.0);
    }
    if sj > 0 {
        mask.slice_mut(s![.., ..sj]).fill(0.0);
        mask.slice_mut(s![.., cols - sj..]).fill(0.0);
    }
    Ok(mask)
}

/// Dense core plus the fixed block mask
#[derive(Debug, Clone)]
pub struct PatchedCore {
    dense: DenseCore,
    mask: Tensor,
    n_sub_models: usize,
}

impl PatchedCore {
    pub fn build(name: &str, config: &PatchedSynapseConfig, key: RngKey) -> Result<Self> {
        let (rows, cols) = config.weight_shape()?;
        let mask = patch_mask(config)?;
        let init = match &config.weight_init {
            Some(init) => init.clone(),
            None => {
                info!(component = name, "using default weight initializer");
                WeightInit::FanInGaussian
            }
        };

        let (wkey, rest) = key.split();
        let (mkey, bkey) = rest.split();
        let mut weights = zeros(&[rows, cols]);
        for (i, block_key) in wkey.split_n(config.n_sub_models).into_iter().enumerate() {
            let ((r0, r1), (c0, c1)) = config.block(i);
            let block = sample(block_key, &init, &[r1 - r0, c1 - c0])?;
            weights.slice_mut(s![r0..r1, c0..c1]).assign(&block);
        }
        let weights = apply_mask(weights, &mask);
        let weights = sparsify(name, mkey, weights, config.p_conn)?;
        let biases = init_biases(name, bkey, config.bias_init.as_ref(), &[1, cols])?;

        Ok(Self {
            dense: DenseCore::from_parts(&config.dense(), weights, biases),
            mask,
            n_sub_models: config.n_sub_models,
        })
    }

    pub fn dense(&self) -> &DenseCore {
        &self.dense
    }

    pub fn mask(&self) -> &Tensor {
        &self.mask
    }

    pub fn n_sub_models(&self) -> usize {
        self.n_sub_models
    }

    fn declare(&self, decl: &mut Declarations) -> Result<()> {
        self.dense.declare(decl)?;
        decl.declare("mask", self.mask.clone())
    }

    fn help(&self, kind: &str, description: &str) -> HelpReport {
        self.dense
            .help(kind, description)
            .compartment("states", "mask", "Fixed block mask of present connections")
            .hyperparameter("n_sub_models", "The number of sub-models (blocks) in the layer")
            .hyperparameter("stride_shape", "Overlap of neighbouring blocks")
    }
}

/// Non-adaptive patched cable
#[derive(Debug, Clone)]
pub struct PatchedSynapse {
    name: String,
    core: PatchedCore,
}

impl PatchedSynapse {
    pub fn new(name: &str, config: PatchedSynapseConfig, key: RngKey) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            core: PatchedCore::build(name, &config, key)?,
        })
    }

    pub fn core(&self) -> &PatchedCore {
        &self.core
    }
}

impl HasForwardTransform for PatchedSynapse {
    fn forward(&self, inputs: &Tensor, weights: &Tensor, biases: &Tensor) -> Result<Tensor> {
        self.core.dense.forward(inputs, weights, biases)
    }
}

impl HasEventReset for PatchedSynapse {
    fn reset_values(&self) -> Updates {
        self.core.dense.reset_values()
    }
}

impl Component for PatchedSynapse {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "PatchedSynapse"
    }

    fn declare(&self, decl: &mut Declarations) -> Result<()> {
        self.core.declare(decl)
    }

    fn transitions(&self) -> &'static [TransitionSpec] {
        DENSE_TRANSITIONS
    }

    fn execute(&self, transition: &str, _args: StepArgs, view: &ComponentView<'_>) -> Result<Updates> {
        match transition {
            ADVANCE_STATE => self.core.dense.advance(view),
            RESET => Ok(self.reset_values()),
            other => Err(unknown_transition(&self.name, other)),
        }
    }

    fn persistent(&self) -> Vec<&'static str> {
        self.core.dense.persistent()
    }

    fn help(&self) -> HelpReport {
        self.core.help(
            self.kind(),
            "Block-diagonal synaptic transformation of inputs into output signals",
        )
    }
}

/// Hebbian patched synapse hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HebbianPatchedSynapseConfig {
    #[serde(flatten)]
    pub patched: PatchedSynapseConfig,
    pub eta: f32,
    pub w_bound: f32,
    pub is_nonnegative: bool,
    pub prior: Prior,
    pub w_decay: f32,
    pub sign_value: f32,
    pub optim_type: OptimizerKind,
    pub pre_wght: f32,
    pub post_wght: f32,
}

impl Default for HebbianPatchedSynapseConfig {
    fn default() -> Self {
        Self {
            patched: PatchedSynapseConfig::default(),
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

impl HebbianPatchedSynapseConfig {
    fn rule(&self) -> HebbianRule {
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

const HEBBIAN_PATCHED_TRANSITIONS: &[TransitionSpec] = &[
    TransitionSpec {
        name: ADVANCE_STATE,
        reads: &["inputs", "weights", "biases"],
        writes: &["outputs"],
    },
    TransitionSpec {
        name: EVOLVE,
        reads: &["pre", "post", "weights", "biases", "opt_params", "mask"],
        writes: &["opt_params", "weights", "biases", "dWeights", "dBiases"],
    },
    TransitionSpec {
        name: RESET,
        reads: &[],
        writes: &["inputs", "outputs", "pre", "post", "dWeights", "dBiases"],
    },
];

/// Patched cable adapted by a masked Hebbian rule
#[derive(Debug, Clone)]
pub struct HebbianPatchedSynapse {
    name: String,
    core: PatchedCore,
    learning: HebbianLearning,
}

impl HebbianPatchedSynapse {
    pub fn new(name: &str, config: HebbianPatchedSynapseConfig, key: RngKey) -> Result<Self> {
        let core = PatchedCore::build(name, &config.patched, key)?;
        let learning = HebbianLearning::new(&core.dense, config.rule(), config.optim_type, config.eta);
        Ok(Self {
            name: name.to_string(),
            core,
            learning,
        })
    }

    pub fn core(&self) -> &PatchedCore {
        &self.core
    }
}

impl HasForwardTransform for HebbianPatchedSynapse {
    fn forward(&self, inputs: &Tensor, weights: &Tensor, biases: &Tensor) -> Result<Tensor> {
        self.core.dense.forward(inputs, weights, biases)
    }
}

impl HasPlasticityRule for HebbianPatchedSynapse {
    fn evolve(&self, _args: StepArgs, view: &ComponentView<'_>) -> Result<Updates> {
        let mask = view.get("mask")?;
        self.learning.evolve(&self.core.dense, view, Some(mask))
    }
}

impl HasEventReset for HebbianPatchedSynapse {
    fn reset_values(&self) -> Updates {
        self.learning.reset_values(&self.core.dense)
    }
}

impl Component for HebbianPatchedSynapse {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "HebbianPatchedSynapse"
    }

    fn declare(&self, decl: &mut Declarations) -> Result<()> {
        self.core.declare(decl)?;
        self.learning.declare(&self.core.dense, decl)
    }

    fn transitions(&self) -> &'static [TransitionSpec] {
        HEBBIAN_PATCHED_TRANSITIONS
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
        let report = self.core.help(
            self.kind(),
            "Block-diagonal synaptic transformation adjusted via masked two-factor Hebbian plasticity",
        );
        self.learning
            .help(report)
            .dynamics("outputs = [inputs · (W ⊙ M)] * R + b; dW = [(z_j * q_pre)ᵀ · (z_i * q_post)] ⊙ M")
    }
}
