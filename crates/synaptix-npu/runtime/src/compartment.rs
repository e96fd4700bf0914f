// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Compartments and Circuit State
//!
//! A compartment is a named tensor slot owned by one component and addressed by
//! `component/compartment`. A [`State`] holds the value of every compartment of a
//! circuit. Shapes are fixed by the declared initial value: every later write is
//! checked against it.

use core::fmt;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use synaptix_npu_neural::Tensor;

use crate::error::{Result, RuntimeError};

/// Address of a compartment, displayed as `component/compartment`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompartmentPath {
    pub component: String,
    pub compartment: String,
}

impl CompartmentPath {
    pub fn new(component: impl Into<String>, compartment: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            compartment: compartment.into(),
        }
    }
}

impl fmt::Display for CompartmentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.component, self.compartment)
    }
}

impl From<(&str, &str)> for CompartmentPath {
    fn from((component, compartment): (&str, &str)) -> Self {
        Self::new(component, compartment)
    }
}

/// Values of every compartment in a circuit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    values: BTreeMap<CompartmentPath, Tensor>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_initial(&mut self, path: CompartmentPath, value: Tensor) {
        self.values.insert(path, value);
    }

    pub fn get(&self, path: &CompartmentPath) -> Result<&Tensor> {
        self.values
            .get(path)
            .ok_or_else(|| RuntimeError::UnknownCompartment(path.clone()))
    }

    /// Value of `component/compartment`
    pub fn value(&self, component: &str, compartment: &str) -> Result<&Tensor> {
        self.get(&CompartmentPath::new(component, compartment))
    }

    pub fn contains(&self, path: &CompartmentPath) -> bool {
        self.values.contains_key(path)
    }

    /// Overwrite an existing compartment; the shape must not change
    pub fn set(&mut self, path: &CompartmentPath, value: Tensor) -> Result<()> {
        let slot = self
            .values
            .get_mut(path)
            .ok_or_else(|| RuntimeError::UnknownCompartment(path.clone()))?;
        if slot.shape() != value.shape() {
            return Err(RuntimeError::ShapeMismatch {
                path: path.clone(),
                expected: slot.shape().to_vec(),
                actual: value.shape().to_vec(),
            });
        }
        *slot = value;
        Ok(())
    }

    /// Externally clamp `component/compartment` between invocations
    pub fn clamp(&mut self, component: &str, compartment: &str, value: Tensor) -> Result<()> {
        self.set(&CompartmentPath::new(component, compartment), value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CompartmentPath, &Tensor)> {
        self.values.iter()
    }

    /// All compartments of one component, in name order
    pub fn component_values<'a>(
        &'a self,
        component: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Tensor)> + 'a {
        self.values
            .iter()
            .filter(move |(path, _)| path.component == component)
            .map(|(path, value)| (path.compartment.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synaptix_npu_neural::types::{full, zeros};

    fn state() -> State {
        let mut s = State::new();
        s.insert_initial(CompartmentPath::new("W", "weights"), zeros(&[2, 3]));
        s.insert_initial(CompartmentPath::new("W", "inputs"), zeros(&[1, 2]));
        s
    }

    #[test]
    fn test_path_display() {
        assert_eq!(CompartmentPath::new("W", "weights").to_string(), "W/weights");
    }

    #[test]
    fn test_set_is_shape_checked() {
        let mut s = state();
        s.clamp("W", "weights", full(&[2, 3], 1.0)).unwrap();
        assert_eq!(s.value("W", "weights").unwrap()[[1, 2]], 1.0);
        let err = s.clamp("W", "weights", zeros(&[3, 2])).unwrap_err();
        assert!(matches!(err, RuntimeError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_unknown_compartment() {
        let mut s = state();
        assert!(matches!(
            s.clamp("W", "biases", zeros(&[1])),
            Err(RuntimeError::UnknownCompartment(_))
        ));
    }

    #[test]
    fn test_component_values_filters_by_owner() {
        let s = state();
        let names: Vec<&str> = s.component_values("W").map(|(n, _)| n).collect();
        assert_eq!(names, vec!["inputs", "weights"]);
        assert_eq!(s.component_values("err").count(), 0);
    }
}
