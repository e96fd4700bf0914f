// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Synaptix Compartment Runtime
//!
//! Execution engine for compartment circuits.
//!
//! This crate provides:
//! - **State**: [`State`] of every compartment, addressed by [`CompartmentPath`]
//! - **Components**: the [`Component`] trait plus capability traits
//! - **Wiring**: single-source `src -> dst` edges between compartments
//! - **Compilation**: [`Circuit::compile`] orders transitions into a [`CompiledCommand`]
//! - **Persistence**: versioned per-component parameter archives
//!
//! ## Usage
//!
//! ```ignore
//! let mut circuit = Circuit::new();
//! circuit.add_component(w)?;
//! circuit.add_component(err)?;
//! circuit.wire(("W", "outputs"), ("err", "mu"))?;
//! circuit.compile("advance", &[("W", ADVANCE_STATE), ("err", ADVANCE_STATE)])?;
//! let state = circuit.invoke("advance", &circuit.initial_state(), StepArgs::new(0.0, 1.0))?;
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod circuit;
pub mod compartment;
pub mod component;
pub mod error;
pub mod help;
pub mod persistence;
pub mod wiring;

pub use circuit::{Circuit, CompiledCommand};
pub use compartment::{CompartmentPath, State};
pub use component::{
    unknown_transition, Component, ComponentView, Declarations, HasEligibilityTrace,
    HasEventReset, HasForwardTransform, HasPlasticityRule, StepArgs, TransitionSpec, Updates,
    ADVANCE_STATE, BACKTRANSMIT, EVOLVE, RESET,
};
pub use error::{Result, RuntimeError};
pub use help::HelpReport;
pub use persistence::{load_archive, params_path, save_archive, ParamArchive};
