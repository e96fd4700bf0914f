// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Deconvolutional (transposed convolution) synaptic cable

use synaptix_npu_neural::{RngKey, Tensor};
use synaptix_npu_runtime::{
    unknown_transition, Component, ComponentView, Declarations, HasEventReset, HasForwardTransform,
    HelpReport, Result, StepArgs, TransitionSpec, Updates, ADVANCE_STATE, RESET,
};

use super::conv::{ConvCore, ConvDirection, ConvSynapseConfig, CONV_TRANSITIONS};

/// Non-adaptive transposed convolution; output maps are `H·s` (SAME) or
/// `H·s + max(k − s, 0)` (VALID) wide
#[derive(Debug, Clone)]
pub struct DeconvSynapse {
    name: String,
    core: ConvCore,
}

impl DeconvSynapse {
    pub fn new(name: &str, config: ConvSynapseConfig, key: RngKey) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            core: ConvCore::build(name, &config, ConvDirection::Transposed, key)?,
        })
    }

    pub fn core(&self) -> &ConvCore {
        &self.core
    }
}

impl HasForwardTransform for DeconvSynapse {
    fn forward(&self, inputs: &Tensor, weights: &Tensor, biases: &Tensor) -> Result<Tensor> {
        self.core.forward(inputs, weights, biases)
    }
}

impl HasEventReset for DeconvSynapse {
    fn reset_values(&self) -> Updates {
        self.core.reset_values()
    }
}

impl Component for DeconvSynapse {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "DeconvSynapse"
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
        self.core.help(
            self.kind(),
            "Synaptic deconvolution (transposed convolution) of inputs to produce output signals",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synaptix_npu_neural::types::full;
    use synaptix_npu_neural::{Padding, WeightInit};

    #[test]
    fn test_output_extent_per_padding() {
        let same = DeconvSynapse::new(
            "D",
            ConvSynapseConfig {
                stride: 2,
                ..ConvSynapseConfig::new([3, 3, 2, 1], 4)
            },
            RngKey::new(0),
        )
        .unwrap();
        assert_eq!(same.core().out_shape(), &[1, 8, 8, 1]);

        let valid = DeconvSynapse::new(
            "D",
            ConvSynapseConfig {
                stride: 2,
                padding: Padding::Valid,
                ..ConvSynapseConfig::new([3, 3, 2, 1], 4)
            },
            RngKey::new(0),
        )
        .unwrap();
        assert_eq!(valid.core().out_shape(), &[1, 9, 9, 1]);
    }

    #[test]
    fn test_unit_kernel_stride_one_is_channel_sum() {
        let config = ConvSynapseConfig {
            filter_init: Some(WeightInit::constant(1.0)),
            resist_scale: 0.5,
            ..ConvSynapseConfig::new([1, 1, 2, 1], 3)
        };
        let d = DeconvSynapse::new("D", config, RngKey::new(0)).unwrap();
        let out = d
            .forward(&full(&[1, 3, 3, 2], 1.0), d.core().weights(), &d.core().biases())
            .unwrap();
        assert_eq!(out.shape(), &[1, 3, 3, 1]);
        assert!(out.iter().all(|&x| x == 1.0));
    }
}
