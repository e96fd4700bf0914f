// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `synaptix_configuration.toml`. Missing
//! sections and fields fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SynaptixConfig {
    pub simulation: SimulationConfig,
    pub integration: IntegrationConfig,
    pub optimizer: OptimizerConfig,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig,
}

/// Clock and seeding
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Integration time step
    pub dt: f32,
    /// Simulation start time
    pub t0: f32,
    /// Root seed for every `RngKey` of a run
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 1.0,
            t0: 0.0,
            seed: 42,
        }
    }
}

/// Default ODE scheme for cells that do not set their own
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IntegrationConfig {
    /// `euler` or `midpoint` (`rk1`/`rk2` aliases accepted)
    pub method: String,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            method: "euler".to_string(),
        }
    }
}

/// Default optimizer for plastic synapses
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// `sgd` or `adam`
    pub kind: String,
    /// Learning rate
    pub eta: f32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            kind: "sgd".to_string(),
            eta: 0.01,
        }
    }
}

/// Parameter archive location
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub param_dir: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            param_dir: PathBuf::from("params"),
        }
    }
}

/// Console logging
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}
