// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Core type definitions

pub mod error;
pub mod tensor;

pub use error::{NeuralError, Result};
pub use tensor::*;
