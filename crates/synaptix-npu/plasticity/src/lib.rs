// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Synaptix Plasticity Module
//!
//! Local synaptic learning rules and the machinery that applies them:
//! - Optimizers (sgd, adam) with packed, compartment-friendly state
//! - Bound enforcement after each optimizer step
//! - Two-factor Hebbian updates with weight priors
//! - Convolutional Hebbian updates with gradient shape correction
//! - Trace-based STDP and its modulated, eligibility-trace form (MSTDP-ET)
//!
//! ## Architecture
//! - Every rule is a pure function of tensors; state lives in the caller's compartments
//! - Rules are small `Copy` configuration structs that synapses hold as fields

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod constraints;
pub mod conv_hebbian;
pub mod hebbian;
pub mod modulated;
pub mod optim;
pub mod stdp;

// Re-export key types
pub use constraints::{apply_mask, enforce_bounds};
pub use conv_hebbian::ConvHebbianRule;
pub use hebbian::{HebbianRule, Prior};
pub use modulated::{ModulatedInputs, ModulatedRule, ModulatedStep};
pub use optim::{opt_init, Optimizer, OptimizerKind, OptimizerState};
pub use stdp::{SpikeTraces, TraceStdpRule};
