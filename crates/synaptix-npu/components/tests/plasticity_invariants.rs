// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Property tests for weight bounds and patched masks under repeated evolution

use ndarray::{Array, IxDyn};
use proptest::prelude::*;
use synaptix_npu_components::{
    patch_mask, HebbianPatchedSynapse, HebbianPatchedSynapseConfig, HebbianSynapse,
    HebbianSynapseConfig, PatchedSynapseConfig,
};
use synaptix_npu_neural::{RngKey, Tensor};
use synaptix_npu_plasticity::OptimizerKind;
use synaptix_npu_runtime::{Circuit, StepArgs, EVOLVE};

fn tensor(shape: &[usize], values: Vec<f32>) -> Tensor {
    Array::from_shape_vec(IxDyn(shape), values).unwrap()
}

fn signal(len: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-5.0f32..5.0, len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_hebbian_weights_stay_within_bound(
        pre in signal(6),
        post in signal(8),
        bound in 0.1f32..2.0,
        nonneg in any::<bool>(),
        adam in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let config = HebbianSynapseConfig {
            eta: 0.5,
            w_bound: bound,
            is_nonnegative: nonneg,
            optim_type: if adam { OptimizerKind::Adam } else { OptimizerKind::Sgd },
            ..HebbianSynapseConfig::new(3, 4)
        };
        let mut dense = config.dense.clone();
        dense.batch_size = 2;
        let config = HebbianSynapseConfig { dense, ..config };

        let mut circuit = Circuit::new();
        circuit.add_component(HebbianSynapse::new("W", config, RngKey::new(seed)).unwrap()).unwrap();
        circuit.compile("evolve", &[("W", EVOLVE)]).unwrap();
        let mut state = circuit.initial_state();
        state.clamp("W", "pre", tensor(&[2, 3], pre)).unwrap();
        state.clamp("W", "post", tensor(&[2, 4], post)).unwrap();

        for step in 0..3 {
            state = circuit.invoke("evolve", &state, StepArgs::new(step as f32, 1.0)).unwrap();
            let lo = if nonneg { 0.0 } else { -bound };
            for &w in state.value("W", "weights").unwrap().iter() {
                prop_assert!(w >= lo && w <= bound, "w = {} outside [{}, {}]", w, lo, bound);
            }
        }
    }

    #[test]
    fn test_patched_mask_entries_stay_zero(
        pre in signal(8),
        post in signal(11),
        n_sub_models in 1usize..=3,
        overlap in 0usize..=1,
        seed in any::<u64>(),
    ) {
        let patched = PatchedSynapseConfig {
            stride_shape: (overlap, overlap),
            ..PatchedSynapseConfig::new((6, 9), n_sub_models)
        };
        let (rows, cols) = patched.weight_shape().unwrap();
        let mask = patch_mask(&patched).unwrap();
        let config = HebbianPatchedSynapseConfig {
            patched,
            eta: 0.3,
            ..HebbianPatchedSynapseConfig::default()
        };

        let mut circuit = Circuit::new();
        circuit.add_component(HebbianPatchedSynapse::new("P", config, RngKey::new(seed)).unwrap()).unwrap();
        circuit.compile("evolve", &[("P", EVOLVE)]).unwrap();
        let mut state = circuit.initial_state();

        state.clamp("P", "pre", tensor(&[1, rows], pre[..rows].to_vec())).unwrap();
        state.clamp("P", "post", tensor(&[1, cols], post[..cols].to_vec())).unwrap();

        for step in 0..4 {
            state = circuit.invoke("evolve", &state, StepArgs::new(step as f32, 1.0)).unwrap();
            let weights = state.value("P", "weights").unwrap();
            for (w, m) in weights.iter().zip(mask.iter()) {
                if *m == 0.0 {
                    prop_assert_eq!(*w, 0.0);
                }
            }
        }
    }
}
