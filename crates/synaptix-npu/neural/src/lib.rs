// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Synaptix Neural Computation
//!
//! Platform-level building blocks shared by every other crate of the workspace:
//! - **Types**: `Tensor` (dynamic-rank `f32` array, batch dimension first) and errors
//! - **Rng**: move-only, splittable pseudo-random keys
//! - **Init**: weight initialisation distributions ("sampler by name")
//! - **Ode**: fixed-step Euler and midpoint (RK2) integrators
//! - **Conv**: 2-D convolution, transposed convolution and their gradients
//! - **Models**: neuron dynamics (Izhikevich)

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod conv;
pub mod init;
pub mod models;
pub mod ode;
pub mod rng;
pub mod types;

pub use conv::{PadArgs, Padding};
pub use init::{sample, WeightInit};
pub use ode::{step_euler, step_rk2, Integrator};
pub use rng::RngKey;
pub use types::{NeuralError, Result, Tensor, TensorStats};
