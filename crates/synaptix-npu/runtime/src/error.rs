// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Error types for runtime operations

use synaptix_npu_neural::NeuralError;
use thiserror::Error;

use crate::compartment::CompartmentPath;

/// Runtime errors
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Neural(#[from] NeuralError),

    #[error("Component already registered: {0}")]
    DuplicateComponent(String),

    #[error("Compartment {compartment} declared twice by component {component}")]
    DuplicateCompartment { component: String, compartment: String },

    #[error("Compartment {dst} is already wired from {existing}")]
    DuplicateWire {
        dst: CompartmentPath,
        existing: CompartmentPath,
    },

    #[error("Circuit is sealed: wiring and components are frozen once a command is compiled")]
    WiringSealed,

    #[error("Unknown component: {0}")]
    UnknownComponent(String),

    #[error("Unknown compartment: {0}")]
    UnknownCompartment(CompartmentPath),

    #[error("Component {component} has no transition {transition}")]
    UnknownTransition { component: String, transition: String },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Command {0} is already compiled with a different transition list")]
    CommandConflict(String),

    #[error("Shape mismatch for {path}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        path: CompartmentPath,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Transition {component}.{transition} wrote undeclared compartment {compartment}")]
    UndeclaredWrite {
        component: String,
        transition: String,
        compartment: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid magic number: expected SYNPX, got {0:?}")]
    InvalidMagic([u8; 5]),

    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: u32,
        expected_version: u32,
    },

    #[error("Checksum mismatch: parameter file may be corrupted")]
    ChecksumMismatch,

    #[error("Parameter file for {component} is missing key {key}")]
    MissingKey { component: String, key: String },
}

/// Result type for runtime operations
pub type Result<T> = core::result::Result<T, RuntimeError>;
