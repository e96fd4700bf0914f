// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Convolutional synaptic cable: `outputs = conv2d(inputs, K) · R + b`
//!
//! Inputs are NHWC with square maps, kernels HWIO `(k, k, c_in, c_out)`. The
//! output shape is measured once at construction from a zero-valued pass.

use serde::{Deserialize, Serialize};
use synaptix_npu_neural::conv::{conv2d, deconv2d};
use synaptix_npu_neural::types::{add_broadcast, zeros};
use synaptix_npu_neural::{NeuralError, Padding, RngKey, Tensor, WeightInit};
use synaptix_npu_runtime::{
    unknown_transition, Component, ComponentView, Declarations, HasEventReset, HasForwardTransform,
    HelpReport, Result, StepArgs, TransitionSpec, Updates, ADVANCE_STATE, RESET,
};

use super::{bias_value, init_biases, init_weights, persistent_params};

/// Convolutional synapse hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvSynapseConfig {
    /// Kernel shape `(k, k, c_in, c_out)`
    pub shape: [usize; 4],
    /// Spatial shape of one input map
    pub x_shape: (usize, usize),
    /// Defaults to `uniform(0.025, 0.8)`
    pub filter_init: Option<WeightInit>,
    pub bias_init: Option<WeightInit>,
    pub stride: usize,
    pub padding: Padding,
    pub resist_scale: f32,
    pub batch_size: usize,
}

impl Default for ConvSynapseConfig {
    fn default() -> Self {
        Self {
            shape: [1, 1, 1, 1],
            x_shape: (1, 1),
            filter_init: None,
            bias_init: None,
            stride: 1,
            padding: Padding::Same,
            resist_scale: 1.0,
            batch_size: 1,
        }
    }
}

impl ConvSynapseConfig {
    pub fn new(shape: [usize; 4], x_size: usize) -> Self {
        Self {
            shape,
            x_shape: (x_size, x_size),
            ..Self::default()
        }
    }
}

/// Direction of the spatial transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvDirection {
    Forward,
    Transposed,
}

/// Kernel, biases and measured shapes shared by convolutional cables
#[derive(Debug, Clone)]
pub struct ConvCore {
    pub shape: [usize; 4],
    pub x_size: usize,
    pub stride: usize,
    pub padding: Padding,
    pub resist_scale: f32,
    pub batch_size: usize,
    pub direction: ConvDirection,
    weights: Tensor,
    biases: Option<Tensor>,
    in_shape: Vec<usize>,
    out_shape: Vec<usize>,
}

impl ConvCore {
    pub fn build(name: &str, config: &ConvSynapseConfig, direction: ConvDirection, key: RngKey) -> Result<Self> {
        let (rows, cols) = config.x_shape;
        if rows != cols {
            return Err(NeuralError::invalid_shape(
                "x_shape",
                format!("input maps must be square, got {:?}", config.x_shape),
            )
            .into());
        }
        let [_, _, c_in, c_out] = config.shape;
        let (wkey, bkey) = key.split();
        let weights = init_weights(
            name,
            wkey,
            config.filter_init.as_ref(),
            WeightInit::uniform(0.025, 0.8),
            &config.shape,
        )?;
        let biases = init_biases(name, bkey, config.bias_init.as_ref(), &[1, 1, 1, c_out])?;

        let in_shape = vec![config.batch_size, rows, rows, c_in];
        let mut core = Self {
            shape: config.shape,
            x_size: rows,
            stride: config.stride,
            padding: config.padding,
            resist_scale: config.resist_scale,
            batch_size: config.batch_size,
            direction,
            weights,
            biases,
            in_shape: in_shape.clone(),
            out_shape: Vec::new(),
        };
        let dry_run = core.transform(&zeros(&in_shape), &core.weights)?;
        core.out_shape = dry_run.shape().to_vec();
        Ok(core)
    }

    fn transform(&self, inputs: &Tensor, weights: &Tensor) -> Result<Tensor> {
        let out = match self.direction {
            ConvDirection::Forward => conv2d(inputs, weights, self.stride, self.padding)?,
            ConvDirection::Transposed => deconv2d(inputs, weights, self.stride, self.padding)?,
        };
        Ok(out)
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

    pub fn in_shape(&self) -> &[usize] {
        &self.in_shape
    }

    pub fn out_shape(&self) -> &[usize] {
        &self.out_shape
    }

    pub fn declare(&self, decl: &mut Declarations) -> Result<()> {
        decl.declare("inputs", zeros(&self.in_shape))?;
        decl.declare("outputs", zeros(&self.out_shape))?;
        decl.declare("weights", self.weights.clone())?;
        decl.declare("biases", self.biases())
    }

    pub fn forward(&self, inputs: &Tensor, weights: &Tensor, biases: &Tensor) -> Result<Tensor> {
        let out = self.transform(inputs, weights)? * self.resist_scale;
        Ok(add_broadcast(&out, biases, "convolution biases")?)
    }

    pub fn advance(&self, view: &ComponentView<'_>) -> Result<Updates> {
        let outputs = self.forward(view.get("inputs")?, view.get("weights")?, view.get("biases")?)?;
        Ok(vec![("outputs", outputs)])
    }

    pub fn reset_values(&self) -> Updates {
        vec![
            ("inputs", zeros(&self.in_shape)),
            ("outputs", zeros(&self.out_shape)),
        ]
    }

    pub fn persistent(&self) -> Vec<&'static str> {
        persistent_params(self.bias_enabled())
    }

    pub fn help(&self, kind: &str, description: &str) -> HelpReport {
        let op = match self.direction {
            ConvDirection::Forward => "*",
            ConvDirection::Transposed => "@.T",
        };
        HelpReport::new(kind, description)
            .compartment("inputs", "inputs", "Takes in external input signal values")
            .compartment("states", "weights", "Synaptic filter parameter values")
            .compartment("states", "biases", "Base-rate/bias parameter values")
            .compartment("outputs", "outputs", "Output of synaptic/filter transformation")
            .hyperparameter("shape", "Shape of synaptic filter; kernel height x kernel width x input channels x output channels")
            .hyperparameter("x_shape", "Shape of any single incoming/input feature map")
            .hyperparameter("filter_init", "Initialization conditions for synaptic filter (K) values")
            .hyperparameter("bias_init", "Initialization conditions for bias/base-rate (b) values")
            .hyperparameter("resist_scale", "Resistance level output scaling factor (R)")
            .hyperparameter("stride", "Length/size of stride")
            .hyperparameter("padding", "Pre-operator padding to use, i.e., VALID or SAME")
            .dynamics(&format!("outputs = [K {op} inputs] * R + b"))
    }
}

pub(crate) const CONV_TRANSITIONS: &[TransitionSpec] = &[
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

/// Non-adaptive convolutional cable
#[derive(Debug, Clone)]
pub struct ConvSynapse {
    name: String,
    core: ConvCore,
}

impl ConvSynapse {
    pub fn new(name: &str, config: ConvSynapseConfig, key: RngKey) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            core: ConvCore::build(name, &config, ConvDirection::Forward, key)?,
        })
    }

    pub fn core(&self) -> &ConvCore {
        &self.core
    }
}

impl HasForwardTransform for ConvSynapse {
    fn forward(&self, inputs: &Tensor, weights: &Tensor, biases: &Tensor) -> Result<Tensor> {
        self.core.forward(inputs, weights, biases)
    }
}

impl HasEventReset for ConvSynapse {
    fn reset_values(&self) -> Updates {
        self.core.reset_values()
    }
}

impl Component for ConvSynapse {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "ConvSynapse"
    }

    fn declare(&self, decl: &mut Declarations) -> Result<()> {
        self.core.declare(decl)
    }

    fn transitions(&self) -> &'static [TransitionSpec] {
        CONV_TRANSITIONS
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
        self.core
            .help(self.kind(), "Synaptic convolution of inputs to produce output signals")
    }
}
