// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Component Architecture
//!
//! A component owns a fixed set of compartments and exposes named transitions.
//! Transitions are pure: they read an immutable [`ComponentView`] and return the
//! new values of the compartments they write. The circuit applies those updates.
//!
//! Shared behaviour is expressed as capability traits implemented per concrete
//! variant rather than through a class hierarchy:
//! - [`HasForwardTransform`]: synapses mapping inputs to outputs through parameters
//! - [`HasPlasticityRule`]: components whose parameters adapt on `evolve`
//! - [`HasEligibilityTrace`]: rules carrying a decaying trace between updates
//! - [`HasEventReset`]: components that restore transient state on `reset`

use core::fmt;

use synaptix_npu_neural::Tensor;

use crate::compartment::{CompartmentPath, State};
use crate::error::{Result, RuntimeError};
use crate::help::HelpReport;

/// Standard transition names
pub const ADVANCE_STATE: &str = "advance_state";
pub const EVOLVE: &str = "evolve";
pub const RESET: &str = "reset";
pub const BACKTRANSMIT: &str = "backtransmit";

/// Time arguments passed to every transition
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepArgs {
    pub t: f32,
    pub dt: f32,
}

impl StepArgs {
    pub fn new(t: f32, dt: f32) -> Self {
        Self { t, dt }
    }
}

/// Static description of a transition: what it reads and what it writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionSpec {
    pub name: &'static str,
    pub reads: &'static [&'static str],
    pub writes: &'static [&'static str],
}

/// New compartment values produced by a transition
pub type Updates = Vec<(&'static str, Tensor)>;

/// Collects the compartments a component declares at registration
#[derive(Debug)]
pub struct Declarations {
    component: String,
    entries: Vec<(String, Tensor)>,
}

impl Declarations {
    pub(crate) fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
            entries: Vec::new(),
        }
    }

    /// Declare compartment `name` with its initial value
    pub fn declare(&mut self, name: &str, initial: Tensor) -> Result<()> {
        if self.entries.iter().any(|(n, _)| n == name) {
            return Err(RuntimeError::DuplicateCompartment {
                component: self.component.clone(),
                compartment: name.to_string(),
            });
        }
        self.entries.push((name.to_string(), initial));
        Ok(())
    }

    pub(crate) fn into_entries(self) -> Vec<(String, Tensor)> {
        self.entries
    }
}

/// Read-only view of one component's compartments
#[derive(Debug, Clone, Copy)]
pub struct ComponentView<'a> {
    component: &'a str,
    state: &'a State,
}

impl<'a> ComponentView<'a> {
    pub fn new(component: &'a str, state: &'a State) -> Self {
        Self { component, state }
    }

    pub fn component(&self) -> &'a str {
        self.component
    }

    pub fn get(&self, compartment: &str) -> Result<&'a Tensor> {
        self.state
            .get(&CompartmentPath::new(self.component, compartment))
    }
}

/// A stateful circuit element
pub trait Component: Send + Sync + fmt::Debug {
    /// Unique name within the circuit
    fn name(&self) -> &str;

    /// Component type name, e.g. `"HebbianSynapse"`
    fn kind(&self) -> &'static str;

    /// Register every compartment with its initial value
    fn declare(&self, decl: &mut Declarations) -> Result<()>;

    fn transitions(&self) -> &'static [TransitionSpec];

    /// Run `transition` on a snapshot of this component's compartments
    fn execute(&self, transition: &str, args: StepArgs, view: &ComponentView<'_>) -> Result<Updates>;

    /// Compartments written to parameter files
    fn persistent(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn help(&self) -> HelpReport;

    fn transition(&self, name: &str) -> Option<&'static TransitionSpec> {
        self.transitions().iter().find(|spec| spec.name == name)
    }
}

/// Synapses mapping `inputs` to `outputs` through their parameters
pub trait HasForwardTransform {
    fn forward(&self, inputs: &Tensor, weights: &Tensor, biases: &Tensor) -> Result<Tensor>;
}

/// Components whose parameters adapt on `evolve`
pub trait HasPlasticityRule {
    fn evolve(&self, args: StepArgs, view: &ComponentView<'_>) -> Result<Updates>;
}

/// Rules keeping a decaying eligibility trace between updates
pub trait HasEligibilityTrace {
    fn decay_eligibility(&self, eligibility: &Tensor, d_weights: &Tensor, dt: f32) -> Tensor;
}

/// Components that restore transient compartments on `reset`
pub trait HasEventReset {
    fn reset_values(&self) -> Updates;
}

/// Error for a transition name the component does not expose
pub fn unknown_transition(component: &str, transition: &str) -> RuntimeError {
    RuntimeError::UnknownTransition {
        component: component.to_string(),
        transition: transition.to_string(),
    }
}
