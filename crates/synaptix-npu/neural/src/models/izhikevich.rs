// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Izhikevich Neuron Model
//!
//! ## Model Dynamics
//!
//! ```text
//! Spike check (on the pre-step voltage):
//!     s = v > v_thr
//!
//! Voltage and recovery (each integrated holding the other at its pre-step value):
//!     dv/dt = (0.04·v² + 5·v + 140 − w + j·R) / τ_m
//!     dw/dt = (b·v − w) / τ_w
//!
//! Event reset:
//!     v = v'·(1 − s) + s·v_reset
//!     w = w'·(1 − s) + s·(w + w_reset)
//!     tols = tols·(1 − s) + s·t
//! ```
//!
//! With zero input and the default parameters the stable fixed point is
//! `v = −70, w = −14`.

use ndarray::Zip;
use serde::{Deserialize, Serialize};

use crate::ode::Integrator;
use crate::types::{ensure_shape, Tensor};
use crate::Result;

/// Izhikevich model parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IzhikevichParameters {
    /// Membrane time constant
    pub tau_m: f32,
    /// Membrane resistance applied to the input current
    pub resist_m: f32,
    /// Spike threshold
    pub v_thr: f32,
    /// Voltage after a spike (`c`)
    pub v_reset: f32,
    /// Recovery time constant (`a = 1/τ_w`)
    pub tau_w: f32,
    /// Recovery increment after a spike (`d`)
    pub w_reset: f32,
    /// Voltage coupling of the recovery variable (`b`)
    pub coupling_factor: f32,
    /// Initial and reset voltage
    pub v0: f32,
    /// Initial and reset recovery
    pub w0: f32,
}

impl Default for IzhikevichParameters {
    fn default() -> Self {
        Self {
            tau_m: 1.0,
            resist_m: 1.0,
            v_thr: 30.0,
            v_reset: -65.0,
            tau_w: 50.0,
            w_reset: 8.0,
            coupling_factor: 0.2,
            v0: -65.0,
            w0: -14.0,
        }
    }
}

/// State produced by one Izhikevich step
#[derive(Debug, Clone, PartialEq)]
pub struct IzhikevichStep {
    pub v: Tensor,
    pub w: Tensor,
    pub s: Tensor,
    pub tols: Tensor,
}

/// Voltage derivative, with `j` already scaled by the membrane resistance
pub fn dv_dt(j: &Tensor, v: &Tensor, w: &Tensor, tau_m: f32) -> Tensor {
    let mut out = Tensor::zeros(v.raw_dim());
    Zip::from(&mut out)
        .and(j)
        .and(v)
        .and(w)
        .for_each(|o, &j, &v, &w| *o = (0.04 * v * v + 5.0 * v + 140.0 - w + j) / tau_m);
    out
}

/// Recovery derivative
pub fn dw_dt(v: &Tensor, w: &Tensor, coupling: f32, tau_w: f32) -> Tensor {
    let mut out = Tensor::zeros(w.raw_dim());
    Zip::from(&mut out)
        .and(v)
        .and(w)
        .for_each(|o, &v, &w| *o = (coupling * v - w) / tau_w);
    out
}

impl IzhikevichParameters {
    /// Advance `(v, w, tols)` by one step of size `dt` at time `t`
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &self,
        integrator: Integrator,
        t: f32,
        dt: f32,
        j: &Tensor,
        v: &Tensor,
        w: &Tensor,
        tols: &Tensor,
    ) -> Result<IzhikevichStep> {
        let shape = v.shape();
        ensure_shape(j, shape, "izhikevich j")?;
        ensure_shape(w, shape, "izhikevich w")?;
        ensure_shape(tols, shape, "izhikevich tols")?;

        let j_scaled = j * self.resist_m;
        let v_thr = self.v_thr;
        let s = v.mapv(|x| if x > v_thr { 1.0 } else { 0.0 });

        let tau_m = self.tau_m;
        let (_, v_next) = integrator.step(
            0.0,
            v,
            |_, v, _: &()| dv_dt(&j_scaled, v, w, tau_m),
            dt,
            &(),
        );
        let (coupling, tau_w) = (self.coupling_factor, self.tau_w);
        let (_, w_next) = integrator.step(0.0, w, |_, w, _: &()| dw_dt(v, w, coupling, tau_w), dt, &());

        let (v_reset, w_reset) = (self.v_reset, self.w_reset);
        let mut v_out = v_next;
        let mut w_out = w_next;
        let mut tols_out = tols.clone();
        Zip::from(&mut v_out)
            .and(&mut w_out)
            .and(&mut tols_out)
            .and(&s)
            .and(w)
            .for_each(|v_new, w_new, tl, &spike, &w_prev| {
                *v_new = *v_new * (1.0 - spike) + spike * v_reset;
                *w_new = *w_new * (1.0 - spike) + spike * (w_prev + w_reset);
                *tl = *tl * (1.0 - spike) + spike * t;
            });

        Ok(IzhikevichStep {
            v: v_out,
            w: w_out,
            s,
            tols: tols_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{full, zeros};

    fn run_to_rest(integrator: Integrator, dt: f32, steps: usize) -> (f32, f32) {
        let p = IzhikevichParameters::default();
        let j = zeros(&[1, 1]);
        let mut v = full(&[1, 1], p.v0);
        let mut w = full(&[1, 1], p.w0);
        let mut tols = zeros(&[1, 1]);
        let mut t = 0.0;
        for _ in 0..steps {
            t += dt;
            let out = p.step(integrator, t, dt, &j, &v, &w, &tols).unwrap();
            v = out.v;
            w = out.w;
            tols = out.tols;
        }
        (v.sum(), w.sum())
    }

    #[test]
    fn test_euler_and_midpoint_reach_same_fixed_point() {
        let (ve, we) = run_to_rest(Integrator::Euler, 0.05, 10_000);
        let (vm, wm) = run_to_rest(Integrator::Midpoint, 0.05, 10_000);
        assert!((ve + 70.0).abs() < 0.05, "euler v = {}", ve);
        assert!((vm + 70.0).abs() < 0.05, "midpoint v = {}", vm);
        assert!((we + 14.0).abs() < 0.05);
        assert!((wm + 14.0).abs() < 0.05);
    }

    #[test]
    fn test_spike_resets_voltage_and_stamps_time() {
        let p = IzhikevichParameters::default();
        let dt = 0.1;
        let j = full(&[1, 3], 10.0);
        let mut v = full(&[1, 3], p.v0);
        let mut w = full(&[1, 3], p.w0);
        let mut tols = zeros(&[1, 3]);
        let mut spikes = 0;
        for step in 1..=2000 {
            let t = step as f32 * dt;
            let prev_tols = tols.clone();
            let out = p.step(Integrator::Euler, t, dt, &j, &v, &w, &tols).unwrap();
            for i in 0..3 {
                if out.s[[0, i]] == 1.0 {
                    spikes += 1;
                    assert_eq!(out.v[[0, i]], p.v_reset);
                    assert_eq!(out.tols[[0, i]], t);
                } else {
                    assert_eq!(out.tols[[0, i]], prev_tols[[0, i]]);
                }
            }
            v = out.v;
            w = out.w;
            tols = out.tols;
        }
        assert!(spikes > 0);
    }

    #[test]
    fn test_rejects_mismatched_input_current() {
        let p = IzhikevichParameters::default();
        let err = p.step(
            Integrator::Euler,
            0.0,
            1.0,
            &zeros(&[1, 2]),
            &zeros(&[1, 3]),
            &zeros(&[1, 3]),
            &zeros(&[1, 3]),
        );
        assert!(err.is_err());
    }
}
