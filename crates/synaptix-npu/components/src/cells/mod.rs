// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Cells
//!
//! Components with evolving physical state: spiking neurons integrated by an ODE
//! scheme and graded error units. Cells only implement `advance_state` and `reset`.

pub mod gaussian_error;
pub mod izhikevich;

pub use gaussian_error::{GaussianErrorCell, GaussianErrorCellConfig};
pub use izhikevich::{IzhikevichCell, IzhikevichCellConfig};
