// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Unified logging initialization for Synaptix

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::scopes::DebugScopes;
use crate::config::{LogFormat, LoggingConfig};

/// Filter combining the configured default level with the debug scopes
///
/// `RUST_LOG`, when set, takes precedence over both.
pub fn build_filter(scopes: &DebugScopes, config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = scopes.filter_directives(&config.level);
    EnvFilter::try_new(&directives).with_context(|| format!("Invalid log filter: {}", directives))
}

/// Install a global console subscriber
///
/// # Errors
///
/// Fails on an invalid level or when a global subscriber is already installed.
pub fn init_logging(scopes: &DebugScopes, config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(scopes, config)?;
    let console_layer = match config.format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(scopes.any_enabled())
            .with_file(false)
            .with_line_number(false)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_filter(filter)
            .boxed(),
    };

    Registry::default()
        .with(console_layer)
        .try_init()
        .context("Failed to install global tracing subscriber")?;
    tracing::debug!(format = %config.format, level = %config.level, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_rejects_bad_level() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            level: "synaptix=verbose".to_string(),
            ..LoggingConfig::default()
        };
        assert!(build_filter(&DebugScopes::default(), &config).is_err());
    }

    #[test]
    fn test_second_init_fails() {
        let scopes = DebugScopes::all();
        let _ = init_logging(&scopes, &LoggingConfig::default());
        assert!(init_logging(&scopes, &LoggingConfig::default()).is_err());
    }
}
