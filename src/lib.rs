// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Synaptix
//!
//! Compartment-based neural circuit simulation with local plasticity rules.
//! Circuits are assembled from cells and synaptic cables, wired compartment to
//! compartment, and driven by compiled commands that advance, adapt and reset
//! every component in dependency order.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! synaptix = "0.1"  # Default: regression module enabled
//! ```
//!
//! ```rust,no_run
//! use synaptix::prelude::*;
//!
//! let key = RngKey::new(42);
//! let mut circuit = Circuit::new();
//! circuit.add_component(HebbianSynapse::new("W", HebbianSynapseConfig::new(4, 2), key)?)?;
//! circuit.add_component(GaussianErrorCell::new("e", GaussianErrorCellConfig::new(2))?)?;
//! circuit.wire(("W", "outputs"), ("e", "mu"))?;
//! circuit.compile("advance", &[("W", ADVANCE_STATE), ("e", ADVANCE_STATE)])?;
//!
//! let mut sim = Simulation::new(circuit, SynaptixConfig::default())?;
//! sim.run("advance", 10)?;
//! println!("{}", sim.describe());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//!
//! - **`regression`** (default): elastic-net regression circuit
//!
//! ## Crate Layout
//!
//! - [`neural`]: tensors, RNG keys, weight init, ODE integration, convolution algebra
//! - [`plasticity`]: optimizers, bound enforcement, Hebbian/STDP/eligibility rules
//! - [`runtime`]: compartments, wiring, command compiler, parameter persistence
//! - [`components`]: concrete cells and synapses
//! - [`config`]: TOML configuration with environment and CLI overrides
//! - [`observability`]: logging initialisation and per-crate debug flags

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export foundation
pub use synaptix_config as config;
pub use synaptix_observability as observability;

// Re-export NPU subsystem
pub use synaptix_npu_components as components;
pub use synaptix_npu_neural as neural;
pub use synaptix_npu_plasticity as plasticity;
pub use synaptix_npu_runtime as runtime;

pub mod simulation;

#[cfg(feature = "regression")]
pub mod regression;

pub use simulation::{init_logging, Simulation, SimulationError};

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::neural::{Integrator, Padding, RngKey, Tensor, WeightInit};
    pub use crate::plasticity::{OptimizerKind, Prior};
    pub use crate::runtime::{
        Circuit, CompartmentPath, Component, State, StepArgs, ADVANCE_STATE, BACKTRANSMIT, EVOLVE,
        RESET,
    };

    pub use crate::components::{
        ConvSynapse, ConvSynapseConfig, DeconvSynapse, DenseSynapse, DenseSynapseConfig,
        GaussianErrorCell, GaussianErrorCellConfig, HebbianConvSynapse, HebbianConvSynapseConfig,
        HebbianPatchedSynapse, HebbianPatchedSynapseConfig, HebbianSynapse, HebbianSynapseConfig,
        IzhikevichCell, IzhikevichCellConfig, MstdpetSynapse, MstdpetSynapseConfig, PatchedSynapse,
        PatchedSynapseConfig, TraceStdpSynapse, TraceStdpSynapseConfig,
    };

    pub use crate::config::{load_config, SynaptixConfig};
    pub use crate::simulation::{Simulation, SimulationError};

    #[cfg(feature = "regression")]
    pub use crate::regression::{ElasticNetConfig, ElasticNetFit, ElasticNetRegressor};
}
