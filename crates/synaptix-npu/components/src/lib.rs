// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Synaptix Components
//!
//! Concrete cells and synaptic cables for compartment circuits.
//!
//! ## Cells
//! - [`IzhikevichCell`]: two-variable spiking dynamics, Euler or midpoint integration
//! - [`GaussianErrorCell`]: fixed-variance error unit
//!
//! ## Synapses
//! - [`DenseSynapse`], [`HebbianSynapse`]
//! - [`ConvSynapse`], [`DeconvSynapse`], [`HebbianConvSynapse`]
//! - [`PatchedSynapse`], [`HebbianPatchedSynapse`]
//! - [`TraceStdpSynapse`], [`MstdpetSynapse`]
//!
//! Every component is built from a serde configuration struct with defaults and,
//! where parameters are sampled, an [`RngKey`](synaptix_npu_neural::RngKey) taken by value.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cells;
pub mod synapses;

pub use cells::{GaussianErrorCell, GaussianErrorCellConfig, IzhikevichCell, IzhikevichCellConfig};
pub use synapses::conv::{ConvCore, ConvSynapse, ConvSynapseConfig};
pub use synapses::deconv::DeconvSynapse;
pub use synapses::dense::{DenseCore, DenseSynapse, DenseSynapseConfig};
pub use synapses::hebbian::{HebbianSynapse, HebbianSynapseConfig};
pub use synapses::hebbian_conv::{HebbianConvSynapse, HebbianConvSynapseConfig};
pub use synapses::mstdpet::{MstdpetSynapse, MstdpetSynapseConfig};
pub use synapses::patched::{
    patch_mask, HebbianPatchedSynapse, HebbianPatchedSynapseConfig, PatchedSynapse,
    PatchedSynapseConfig,
};
pub use synapses::trace_stdp::{TraceStdpSynapse, TraceStdpSynapseConfig};
