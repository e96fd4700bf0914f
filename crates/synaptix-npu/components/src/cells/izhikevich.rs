// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Izhikevich spiking cell: two-variable voltage/recovery dynamics with event reset

use serde::{Deserialize, Serialize};
use synaptix_npu_neural::models::IzhikevichParameters;
use synaptix_npu_neural::types::{full, zeros};
use synaptix_npu_neural::{Integrator, Tensor};
use synaptix_npu_runtime::{
    unknown_transition, Component, ComponentView, Declarations, HasEventReset, HelpReport, Result,
    StepArgs, TransitionSpec, Updates, ADVANCE_STATE, RESET,
};
use tracing::debug;

/// Izhikevich cell hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IzhikevichCellConfig {
    pub n_units: usize,
    pub batch_size: usize,
    #[serde(flatten)]
    pub params: IzhikevichParameters,
    pub integration_type: Integrator,
}

impl Default for IzhikevichCellConfig {
    fn default() -> Self {
        Self {
            n_units: 1,
            batch_size: 1,
            params: IzhikevichParameters::default(),
            integration_type: Integrator::Euler,
        }
    }
}

impl IzhikevichCellConfig {
    pub fn new(n_units: usize) -> Self {
        Self {
            n_units,
            ..Self::default()
        }
    }
}

const IZHIKEVICH_TRANSITIONS: &[TransitionSpec] = &[
    TransitionSpec {
        name: ADVANCE_STATE,
        reads: &["j", "v", "w", "tols"],
        writes: &["v", "w", "s", "tols"],
    },
    TransitionSpec {
        name: RESET,
        reads: &[],
        writes: &["j", "v", "w", "s", "tols"],
    },
];

#[derive(Debug, Clone)]
pub struct IzhikevichCell {
    name: String,
    shape: [usize; 2],
    params: IzhikevichParameters,
    integrator: Integrator,
}

impl IzhikevichCell {
    pub fn new(name: &str, config: IzhikevichCellConfig) -> Self {
        debug!(
            component = name,
            integrator = %config.integration_type,
            n_units = config.n_units,
            "created izhikevich cell"
        );
        Self {
            name: name.to_string(),
            shape: [config.batch_size, config.n_units],
            params: config.params,
            integrator: config.integration_type,
        }
    }

    pub fn params(&self) -> &IzhikevichParameters {
        &self.params
    }

    pub fn integrator(&self) -> Integrator {
        self.integrator
    }

    fn rest(&self) -> Tensor {
        zeros(&self.shape)
    }

    fn advance(&self, args: StepArgs, view: &ComponentView<'_>) -> Result<Updates> {
        let out = self.params.step(
            self.integrator,
            args.t,
            args.dt,
            view.get("j")?,
            view.get("v")?,
            view.get("w")?,
            view.get("tols")?,
        )?;
        Ok(vec![("v", out.v), ("w", out.w), ("s", out.s), ("tols", out.tols)])
    }
}

impl HasEventReset for IzhikevichCell {
    fn reset_values(&self) -> Updates {
        vec![
            ("j", self.rest()),
            ("v", full(&self.shape, self.params.v0)),
            ("w", full(&self.shape, self.params.w0)),
            ("s", self.rest()),
            ("tols", self.rest()),
        ]
    }
}

impl Component for IzhikevichCell {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "IzhikevichCell"
    }

    fn declare(&self, decl: &mut Declarations) -> Result<()> {
        for (name, value) in self.reset_values() {
            decl.declare(name, value)?;
        }
        Ok(())
    }

    fn transitions(&self) -> &'static [TransitionSpec] {
        IZHIKEVICH_TRANSITIONS
    }

    fn execute(&self, transition: &str, args: StepArgs, view: &ComponentView<'_>) -> Result<Updates> {
        match transition {
            ADVANCE_STATE => self.advance(args, view),
            RESET => Ok(self.reset_values()),
            other => Err(unknown_transition(&self.name, other)),
        }
    }

    fn help(&self) -> HelpReport {
        HelpReport::new(self.kind(), "Izhikevich spiking cell with voltage/recovery dynamics")
            .compartment("inputs", "j", "External input electrical current")
            .compartment("states", "v", "Membrane potential/voltage at time t")
            .compartment("states", "w", "Recovery variable state at time t")
            .compartment("outputs", "s", "Emitted spikes/pulses at time t")
            .compartment("outputs", "tols", "Time-of-last-spike")
            .hyperparameter("n_units", "Number of neuronal cells to model in this layer")
            .hyperparameter("tau_m", "Cell membrane time constant")
            .hyperparameter("resist_m", "Membrane resistance value")
            .hyperparameter("v_thr", "Voltage threshold value to cross for emitting a spike")
            .hyperparameter("v_reset", "Voltage value to reset to after a spike")
            .hyperparameter("tau_w", "Recovery variable time constant")
            .hyperparameter("w_reset", "Increment applied to the recovery variable after a spike")
            .hyperparameter("coupling_factor", "Degree to which recovery is sensitive to voltage sub-threshold fluctuations")
            .hyperparameter("v0", "Initial condition for membrane potential/voltage")
            .hyperparameter("w0", "Initial condition for recovery variable")
            .hyperparameter("integration_type", "Numerical integration scheme (euler or midpoint)")
            .dynamics(
                "tau_m * dv/dt = 0.04v^2 + 5v + 140 - w + j * R; tau_w * dw/dt = b * v - w; \
                 v > v_thr => v = v_reset, w = w + w_reset",
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synaptix_npu_runtime::Circuit;

    fn circuit(config: IzhikevichCellConfig) -> Circuit {
        let mut circuit = Circuit::new();
        circuit.add_component(IzhikevichCell::new("z", config)).unwrap();
        circuit.compile("advance", &[("z", ADVANCE_STATE)]).unwrap();
        circuit.compile("reset", &[("z", RESET)]).unwrap();
        circuit
    }

    #[test]
    fn test_declares_initial_conditions() {
        let circuit = circuit(IzhikevichCellConfig::new(4));
        let state = circuit.initial_state();
        assert!(state.value("z", "v").unwrap().iter().all(|&v| v == -65.0));
        assert!(state.value("z", "w").unwrap().iter().all(|&w| w == -14.0));
        assert_eq!(state.value("z", "s").unwrap().shape(), &[1, 4]);
    }

    #[test]
    fn test_driven_cell_spikes_and_resets() {
        let circuit = circuit(IzhikevichCellConfig {
            integration_type: Integrator::Midpoint,
            ..IzhikevichCellConfig::new(2)
        });
        let mut state = circuit.initial_state();
        state.clamp("z", "j", full(&[1, 2], 10.0)).unwrap();
        let schedule: Vec<StepArgs> = (1..=2000)
            .map(|i| StepArgs::new(i as f32 * 0.1, 0.1))
            .collect();
        let (state, spikes) = circuit
            .command("advance")
            .unwrap()
            .scan_record(&state, &schedule, &("z", "s").into())
            .unwrap();
        assert!(spikes.iter().any(|s| s.sum() > 0.0));
        assert!(state.value("z", "tols").unwrap().iter().all(|&t| t > 0.0));

        let state = circuit
            .invoke("reset", &state, StepArgs::default())
            .unwrap();
        assert_eq!(state, circuit.initial_state());
    }
}
