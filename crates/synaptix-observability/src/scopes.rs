// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Debug scopes
//!
//! A scope names one simulation subsystem whose events are raised to DEBUG
//! while everything else stays at the configured level. Scopes come from
//! `SYNAPTIX_DEBUG`, a comma-separated list such as `runtime,plasticity`,
//! or `all`.

use std::collections::BTreeSet;
use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ObservabilityError;

/// Environment variable listing the debug scopes
pub const DEBUG_VAR: &str = "SYNAPTIX_DEBUG";

/// Simulation subsystem with its own tracing target
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subsystem {
    /// Clock, parameter files and the regression driver
    Simulation,
    /// Wiring, command compilation and invocation
    Runtime,
    /// Cells and synapses
    Components,
    /// Optimizers and learning rules
    Plasticity,
    /// Integrators, initializers and tensor algebra
    Neural,
}

impl Subsystem {
    pub const ALL: [Subsystem; 5] = [
        Subsystem::Simulation,
        Subsystem::Runtime,
        Subsystem::Components,
        Subsystem::Plasticity,
        Subsystem::Neural,
    ];

    /// Tracing target prefixes of the subsystem's events
    ///
    /// Targets match by prefix, so the umbrella modules are listed one by one
    /// to keep `synaptix` from matching every `synaptix_npu_*` crate.
    pub fn targets(self) -> &'static [&'static str] {
        match self {
            Subsystem::Simulation => &["synaptix::simulation", "synaptix::regression"],
            Subsystem::Runtime => &["synaptix_npu_runtime"],
            Subsystem::Components => &["synaptix_npu_components"],
            Subsystem::Plasticity => &["synaptix_npu_plasticity"],
            Subsystem::Neural => &["synaptix_npu_neural"],
        }
    }
}

impl FromStr for Subsystem {
    type Err = ObservabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simulation" | "regression" => Ok(Subsystem::Simulation),
            "runtime" | "circuit" => Ok(Subsystem::Runtime),
            "components" | "cells" | "synapses" => Ok(Subsystem::Components),
            "plasticity" | "optimizer" => Ok(Subsystem::Plasticity),
            "neural" => Ok(Subsystem::Neural),
            other => Err(ObservabilityError::UnknownSubsystem(other.to_string())),
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Subsystem::Simulation => "simulation",
            Subsystem::Runtime => "runtime",
            Subsystem::Components => "components",
            Subsystem::Plasticity => "plasticity",
            Subsystem::Neural => "neural",
        };
        f.write_str(name)
    }
}

/// Subsystems logged at DEBUG
///
/// # Example
/// ```rust
/// use synaptix_observability::{DebugScopes, Subsystem};
///
/// let scopes = DebugScopes::parse("runtime, plasticity").unwrap();
/// assert!(scopes.is_enabled(Subsystem::Plasticity));
/// assert_eq!(
///     scopes.filter_directives("info"),
///     "info,synaptix_npu_runtime=debug,synaptix_npu_plasticity=debug"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugScopes {
    enabled: BTreeSet<Subsystem>,
}

impl DebugScopes {
    pub fn all() -> Self {
        Self {
            enabled: Subsystem::ALL.into_iter().collect(),
        }
    }

    /// `all`, or subsystem names separated by commas; blank entries are skipped
    pub fn parse(list: &str) -> Result<Self, ObservabilityError> {
        if list.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }
        let enabled = list
            .split(',')
            .filter(|name| !name.trim().is_empty())
            .map(Subsystem::from_str)
            .collect::<Result<_, _>>()?;
        Ok(Self { enabled })
    }

    /// Scopes named by `SYNAPTIX_DEBUG`; none when it is unset
    pub fn from_env() -> Result<Self, ObservabilityError> {
        match env::var(DEBUG_VAR) {
            Ok(list) => Self::parse(&list),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn enable(&mut self, subsystem: Subsystem) {
        self.enabled.insert(subsystem);
    }

    pub fn is_enabled(&self, subsystem: Subsystem) -> bool {
        self.enabled.contains(&subsystem)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled.is_empty()
    }

    /// `EnvFilter` directives: the default level, then one DEBUG directive per scope
    pub fn filter_directives(&self, default_level: &str) -> String {
        let mut directives = vec![default_level.to_string()];
        directives.extend(
            self.enabled
                .iter()
                .flat_map(|subsystem| subsystem.targets())
                .map(|target| format!("{}=debug", target)),
        );
        directives.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases_and_blanks() {
        let scopes = DebugScopes::parse(" circuit, optimizer,,").unwrap();
        assert!(scopes.is_enabled(Subsystem::Runtime));
        assert!(scopes.is_enabled(Subsystem::Plasticity));
        assert!(!scopes.is_enabled(Subsystem::Neural));
        assert_eq!(DebugScopes::parse("").unwrap(), DebugScopes::default());
    }

    #[test]
    fn test_unknown_subsystem_rejected() {
        let err = DebugScopes::parse("runtime,renderer").unwrap_err();
        assert!(matches!(err, ObservabilityError::UnknownSubsystem(name) if name == "renderer"));
    }

    #[test]
    fn test_all_covers_every_subsystem() {
        let scopes = DebugScopes::parse("ALL").unwrap();
        for subsystem in Subsystem::ALL {
            assert!(scopes.is_enabled(subsystem), "{subsystem} should be enabled");
        }
    }

    #[test]
    fn test_simulation_scope_targets_umbrella_modules_only() {
        let mut scopes = DebugScopes::default();
        scopes.enable(Subsystem::Simulation);
        assert_eq!(
            scopes.filter_directives("warn"),
            "warn,synaptix::simulation=debug,synaptix::regression=debug"
        );
        assert_eq!(DebugScopes::default().filter_directives("info"), "info");
    }
}
