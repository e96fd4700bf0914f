// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Error types for neural computation
//!
//! Everything here is a configuration error: raised at construction or compile
//! time and never retried.

/// Error types for neural computation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NeuralError {
    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Invalid shape for {what}: {reason}")]
    InvalidShape { what: String, reason: String },

    #[error("Unsupported integration type: {0}")]
    UnsupportedIntegrator(String),

    #[error("Unsupported optimizer: {0}")]
    UnsupportedOptimizer(String),

    #[error("Unsupported prior: {0}")]
    UnsupportedPrior(String),

    #[error("Unsupported padding mode: {0}")]
    UnsupportedPadding(String),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl NeuralError {
    pub fn shape_mismatch(what: impl Into<String>, expected: &[usize], actual: &[usize]) -> Self {
        NeuralError::ShapeMismatch {
            what: what.into(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    pub fn invalid_shape(what: impl Into<String>, reason: impl Into<String>) -> Self {
        NeuralError::InvalidShape {
            what: what.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        NeuralError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = core::result::Result<T, NeuralError>;
