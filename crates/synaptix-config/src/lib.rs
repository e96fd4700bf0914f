// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Synaptix Configuration System
//!
//! Typed settings for a simulation run: clock and seed, default ODE scheme,
//! default optimizer, parameter directory and console logging. Loaded from
//! TOML and adjusted through `SYNAPTIX_*` variables or caller overrides.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use synaptix_config::{load_config, validate_config};
//!
//! let config = load_config(None, None).expect("Failed to load config");
//! validate_config(&config).expect("Invalid config");
//! println!("dt = {}, seed = {}", config.simulation.dt, config.simulation.seed);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{
    apply_environment_overrides, apply_overrides, load_config, set_override, CONFIG_PATH_VAR,
    OVERRIDE_KEYS,
};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SynaptixConfig::default();
        assert!(validate_config(&config).is_ok());
    }
}
