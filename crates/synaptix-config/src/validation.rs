// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Every violation is collected so a single report lists all of them.

use crate::{ConfigError, ConfigResult, SynaptixConfig};

const INTEGRATION_METHODS: &[&str] = &["euler", "rk1", "midpoint", "rk2"];
const OPTIMIZERS: &[&str] = &["sgd", "adam"];
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["text", "json"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
    UnknownChoice { field: String, value: String, allowed: &'static [&'static str] },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
            Self::UnknownChoice { field, value, allowed } => {
                write!(f, "Unknown {} '{}' (expected one of: {})", field, value, allowed.join(", "))
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation
pub fn validate_config(config: &SynaptixConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }
    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// All violations of `config`, in section order
pub fn collect_errors(config: &SynaptixConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_simulation(config, &mut errors);
    validate_choices(config, &mut errors);
    if config.optimizer.eta < 0.0 || !config.optimizer.eta.is_finite() {
        errors.push(ConfigValidationError::InvalidValue {
            field: "optimizer.eta".to_string(),
            reason: format!("must be finite and non-negative, got {}", config.optimizer.eta),
        });
    }
    if config.persistence.param_dir.as_os_str().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "persistence.param_dir".to_string(),
        });
    }
    errors
}

fn validate_simulation(config: &SynaptixConfig, errors: &mut Vec<ConfigValidationError>) {
    let sim = &config.simulation;
    if !(sim.dt > 0.0 && sim.dt.is_finite()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "simulation.dt".to_string(),
            reason: format!("must be positive, got {}", sim.dt),
        });
    }
    if !sim.t0.is_finite() {
        errors.push(ConfigValidationError::InvalidValue {
            field: "simulation.t0".to_string(),
            reason: format!("must be finite, got {}", sim.t0),
        });
    }
}

fn validate_choices(config: &SynaptixConfig, errors: &mut Vec<ConfigValidationError>) {
    let choices: [(&str, &str, &'static [&'static str]); 4] = [
        ("integration.method", config.integration.method.as_str(), INTEGRATION_METHODS),
        ("optimizer.kind", config.optimizer.kind.as_str(), OPTIMIZERS),
        ("logging.level", config.logging.level.as_str(), LOG_LEVELS),
        ("logging.format", config.logging.format.as_str(), LOG_FORMATS),
    ];
    for (field, value, allowed) in choices {
        if !allowed.contains(&value.to_lowercase().as_str()) {
            errors.push(ConfigValidationError::UnknownChoice {
                field: field.to_string(),
                value: value.to_string(),
                allowed,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_every_violation() {
        let mut config = SynaptixConfig::default();
        config.simulation.dt = 0.0;
        config.optimizer.kind = "rmsprop".to_string();
        config.logging.format = "xml".to_string();
        let errors = collect_errors(&config);
        assert_eq!(errors.len(), 3);

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("simulation.dt"));
        assert!(err.contains("rmsprop"));
        assert!(err.contains("xml"));
    }

    #[test]
    fn test_method_aliases_accepted() {
        let mut config = SynaptixConfig::default();
        config.integration.method = "RK2".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
