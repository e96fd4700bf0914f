// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Fixed-Step ODE Integration
//!
//! ```text
//! euler:    y' = y + dt·f(t, y)
//! midpoint: k1 = f(t, y)
//!           k2 = f(t + dt/2, y + dt/2·k1)
//!           y' = y + dt·k2
//! ```
//!
//! `f` is a pure function of `(t, y, params)`; both steppers return `(t + dt, y')`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{NeuralError, Tensor};

/// One explicit Euler step
pub fn step_euler<P, F>(t: f32, y: &Tensor, f: F, dt: f32, params: &P) -> (f32, Tensor)
where
    F: Fn(f32, &Tensor, &P) -> Tensor,
{
    let dy = f(t, y, params);
    (t + dt, y + &(dy * dt))
}

/// One midpoint (second-order Runge-Kutta) step
pub fn step_rk2<P, F>(t: f32, y: &Tensor, f: F, dt: f32, params: &P) -> (f32, Tensor)
where
    F: Fn(f32, &Tensor, &P) -> Tensor,
{
    let half = dt * 0.5;
    let k1 = f(t, y, params);
    let y_mid = y + &(k1 * half);
    let k2 = f(t + half, &y_mid, params);
    (t + dt, y + &(k2 * dt))
}

/// Integration scheme selected by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integrator {
    #[default]
    Euler,
    Midpoint,
}

impl Integrator {
    pub fn step<P, F>(&self, t: f32, y: &Tensor, f: F, dt: f32, params: &P) -> (f32, Tensor)
    where
        F: Fn(f32, &Tensor, &P) -> Tensor,
    {
        match self {
            Integrator::Euler => step_euler(t, y, f, dt, params),
            Integrator::Midpoint => step_rk2(t, y, f, dt, params),
        }
    }
}

impl FromStr for Integrator {
    type Err = NeuralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euler" | "rk1" => Ok(Integrator::Euler),
            "midpoint" | "rk2" => Ok(Integrator::Midpoint),
            other => Err(NeuralError::UnsupportedIntegrator(other.to_string())),
        }
    }
}

impl fmt::Display for Integrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Integrator::Euler => write!(f, "euler"),
            Integrator::Midpoint => write!(f, "midpoint"),
        }
    }
}
