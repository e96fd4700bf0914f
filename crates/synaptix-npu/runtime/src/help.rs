// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Component capability reports
//!
//! Every component describes its compartments (grouped as inputs, states,
//! analytics and outputs), its hyperparameters and its dynamics.

use core::fmt;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Self-description of a component type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HelpReport {
    pub kind: String,
    pub description: String,
    /// group -> compartment -> description
    pub compartments: BTreeMap<String, BTreeMap<String, String>>,
    pub hyperparameters: BTreeMap<String, String>,
    pub dynamics: String,
}

impl HelpReport {
    pub fn new(kind: &str, description: &str) -> Self {
        Self {
            kind: kind.to_string(),
            description: description.to_string(),
            ..Self::default()
        }
    }

    pub fn compartment(mut self, group: &str, name: &str, description: &str) -> Self {
        self.compartments
            .entry(group.to_string())
            .or_default()
            .insert(name.to_string(), description.to_string());
        self
    }

    pub fn hyperparameter(mut self, name: &str, description: &str) -> Self {
        self.hyperparameters
            .insert(name.to_string(), description.to_string());
        self
    }

    pub fn dynamics(mut self, dynamics: &str) -> Self {
        self.dynamics = dynamics.to_string();
        self
    }

    /// Merge another report's entries into this one (later entries win)
    pub fn extend(mut self, other: HelpReport) -> Self {
        for (group, entries) in other.compartments {
            self.compartments.entry(group).or_default().extend(entries);
        }
        self.hyperparameters.extend(other.hyperparameters);
        self
    }
}

impl fmt::Display for HelpReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}", self.kind, self.description)?;
        for (group, entries) in &self.compartments {
            writeln!(f, "  [{}]", group)?;
            for (name, desc) in entries {
                writeln!(f, "    {}: {}", name, desc)?;
            }
        }
        if !self.hyperparameters.is_empty() {
            writeln!(f, "  [hyperparameters]")?;
            for (name, desc) in &self.hyperparameters {
                writeln!(f, "    {}: {}", name, desc)?;
            }
        }
        if !self.dynamics.is_empty() {
            writeln!(f, "  dynamics: {}", self.dynamics)?;
        }
        Ok(())
    }
}
