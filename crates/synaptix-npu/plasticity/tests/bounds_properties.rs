// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Property tests: a Hebbian step followed by bound enforcement never leaves the
//! configured weight range, whatever the activity and optimizer.

use ndarray::{Array2, IxDyn};
use proptest::prelude::*;
use synaptix_npu_neural::Tensor;
use synaptix_npu_plasticity::{enforce_bounds, HebbianRule, Optimizer, Prior};

fn tensor(rows: usize, cols: usize, values: Vec<f32>) -> Tensor {
    Array2::from_shape_vec((rows, cols), values)
        .expect("shape matches generated length")
        .into_dyn()
}

proptest! {
    #[test]
    fn test_bounds_hold_after_evolve(
        pre in proptest::collection::vec(-5.0f32..5.0, 6),
        post in proptest::collection::vec(-5.0f32..5.0, 6),
        w in proptest::collection::vec(-2.0f32..2.0, 9),
        eta in 0.0f32..10.0,
        bound in 0.1f32..3.0,
        nonneg in any::<bool>(),
        adam in any::<bool>(),
    ) {
        let pre = tensor(2, 3, pre);
        let post = tensor(2, 3, post);
        let w = tensor(3, 3, w);
        let rule = HebbianRule {
            w_bound: bound,
            is_nonnegative: nonneg,
            prior: Prior::Lasso { lambda: 0.01 },
            ..HebbianRule::default()
        };
        let opt = if adam { Optimizer::adam(eta) } else { Optimizer::sgd(eta) };
        let state = opt.init(&[&w]);
        let (dw, _) = rule.calc_update(&pre, &post, &w).unwrap();
        let (_, params) = opt.step(&state, &[w], &[dw]).unwrap();
        let next = enforce_bounds(params.into_iter().next().unwrap(), bound, nonneg);
        let lo = if nonneg { 0.0 } else { -bound };
        prop_assert!(next.iter().all(|&x| x >= lo && x <= bound));
    }

    #[test]
    fn test_zero_activity_without_prior_is_a_fixed_point(
        w in proptest::collection::vec(-1.0f32..1.0, 4),
        eta in 0.0f32..1.0,
    ) {
        let w = tensor(2, 2, w);
        let zero = Tensor::zeros(IxDyn(&[1, 2]));
        let rule = HebbianRule::default();
        let (dw, db) = rule.calc_update(&zero, &zero, &w).unwrap();
        prop_assert!(dw.iter().all(|&x| x == 0.0));
        prop_assert!(db.iter().all(|&x| x == 0.0));
        let opt = Optimizer::sgd(eta);
        let (_, params) = opt.step(&opt.init(&[&w]), &[w.clone()], &[dw]).unwrap();
        prop_assert_eq!(&params[0], &w);
    }
}
