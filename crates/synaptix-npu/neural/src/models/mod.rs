// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Neuron Model Dynamics
//!
//! Pure per-step dynamics of cell models, independent of how their state is stored.
//!
//! ## Adding a New Neuron Model
//!
//! 1. Create `src/models/your_model.rs` with a parameter struct and a `step`
//! 2. Add tests
//! 3. Export in `mod.rs`, then wrap it in a cell component

pub mod izhikevich;

pub use izhikevich::{IzhikevichParameters, IzhikevichStep};
