// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

/*!
Elastic-net regression integration tests.

These tests validate:
- Fitting recovers the coefficients of a noiseless linear system
- Thresholding sparsifies the fitted coefficients in place
- The default (adam) configuration lowers the training error
*/

#![cfg(feature = "regression")]

use ndarray::array;
use synaptix::prelude::*;
use synaptix::regression::ElasticNetConfig;

fn features() -> Tensor {
    array![[1.0f32, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 1.0]].into_dyn()
}

fn targets() -> Tensor {
    // y = 0.5·x0 − 0.3·x1
    array![[0.5f32], [-0.3], [0.2], [0.7]].into_dyn()
}

fn sgd_config() -> ElasticNetConfig {
    ElasticNetConfig {
        optim_type: OptimizerKind::Sgd,
        lr: 0.1,
        epochs: 200,
        steps_per_epoch: 1,
        threshold: 0.4,
        ..ElasticNetConfig::new(1, 2, 4)
    }
}

#[test]
fn test_fit_recovers_linear_coefficients() {
    let mut reg = ElasticNetRegressor::new(sgd_config(), RngKey::new(0)).unwrap();
    let fit = reg.fit(&targets(), &features()).unwrap();

    assert_eq!(fit.coef.shape(), &[2, 1]);
    assert!((fit.coef[[0, 0]] - 0.5).abs() < 1e-2, "coef {:?}", fit.coef);
    assert!((fit.coef[[1, 0]] + 0.3).abs() < 1e-2, "coef {:?}", fit.coef);
    assert!(fit.loss.abs() < 1e-3);
    assert_eq!(fit.mu.shape(), &[4, 1]);

    let predicted = reg.predict(&features()).unwrap();
    for (p, y) in predicted.iter().zip(targets().iter()) {
        assert!((p - y).abs() < 2e-2);
    }
}

#[test]
fn test_thresholding_after_fit() {
    let mut reg = ElasticNetRegressor::new(sgd_config(), RngKey::new(0)).unwrap();
    reg.fit(&targets(), &features()).unwrap();

    let sparse = reg.thresholding(10.0).unwrap();
    assert!((sparse.coef[[0, 0]] - 5.0).abs() < 0.1);
    assert_eq!(sparse.coef[[1, 0]], 0.0);
    assert!(sparse.previous[[1, 0]] < 0.0);
    assert_eq!(reg.coef().unwrap()[[1, 0]], 0.0);
}

#[test]
fn test_default_adam_fit_lowers_error() {
    let config = ElasticNetConfig {
        epochs: 10,
        steps_per_epoch: 2,
        ..ElasticNetConfig::new(1, 2, 4)
    };
    let mut reg = ElasticNetRegressor::new(config, RngKey::new(0)).unwrap();

    let first = reg.fit(&targets(), &features()).unwrap();
    let second = reg.fit(&targets(), &features()).unwrap();
    assert!(second.loss > first.loss, "{} !> {}", second.loss, first.loss);
}
