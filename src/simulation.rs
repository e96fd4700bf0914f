// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Simulation Driver
//!
//! Couples a compiled [`Circuit`] with its [`State`] and a loaded
//! [`SynaptixConfig`]. The driver owns the simulation clock: every stepped
//! command advances `t` by the configured `dt` before it runs, while
//! [`Simulation::apply`] runs a command at the current time (used for `evolve`
//! and `reset`).

use std::path::PathBuf;
use std::str::FromStr;

use synaptix_config::{validate_config, ConfigError, SynaptixConfig};
use synaptix_npu_neural::{Integrator, NeuralError, RngKey, Tensor};
use synaptix_npu_plasticity::OptimizerKind;
use synaptix_npu_runtime::{Circuit, CompartmentPath, RuntimeError, State, StepArgs};
use synaptix_observability::{DebugScopes, ObservabilityError};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised by the simulation driver
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Neural(#[from] NeuralError),

    #[error(transparent)]
    Observability(#[from] ObservabilityError),

    #[error(transparent)]
    Logging(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SimulationError>;

/// Root RNG key for a configuration; split it to seed each component
pub fn root_key(config: &SynaptixConfig) -> RngKey {
    RngKey::new(config.simulation.seed)
}

/// Default integrator named by the configuration
pub fn default_integrator(config: &SynaptixConfig) -> Result<Integrator> {
    Ok(Integrator::from_str(&config.integration.method)?)
}

/// Default optimizer named by the configuration
pub fn default_optimizer(config: &SynaptixConfig) -> Result<OptimizerKind> {
    Ok(OptimizerKind::from_str(&config.optimizer.kind)?)
}

/// Install the console subscriber described by `[logging]`
///
/// Subsystems listed in `SYNAPTIX_DEBUG` are raised to DEBUG.
pub fn init_logging(config: &SynaptixConfig) -> Result<()> {
    let logging =
        synaptix_observability::LoggingConfig::from_names(&config.logging.level, &config.logging.format)?;
    let scopes = DebugScopes::from_env()?;
    synaptix_observability::init_logging(&scopes, &logging)?;
    Ok(())
}

/// A circuit, its evolving state and the clock driving it
#[derive(Debug)]
pub struct Simulation {
    circuit: Circuit,
    state: State,
    config: SynaptixConfig,
    t: f32,
}

impl Simulation {
    /// Wrap `circuit`, starting from its declared initial state at `t0`
    pub fn new(circuit: Circuit, config: SynaptixConfig) -> Result<Self> {
        validate_config(&config)?;
        let state = circuit.initial_state();
        info!(
            components = circuit.component_names().count(),
            dt = config.simulation.dt,
            seed = config.simulation.seed,
            "simulation ready"
        );
        Ok(Self {
            t: config.simulation.t0,
            circuit,
            state,
            config,
        })
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn config(&self) -> &SynaptixConfig {
        &self.config
    }

    /// Current simulation time
    pub fn t(&self) -> f32 {
        self.t
    }

    pub fn dt(&self) -> f32 {
        self.config.simulation.dt
    }

    /// Overwrite a compartment value (e.g. clamp an input before stepping)
    pub fn clamp(&mut self, component: &str, compartment: &str, value: Tensor) -> Result<()> {
        Ok(self.state.clamp(component, compartment, value)?)
    }

    pub fn value(&self, component: &str, compartment: &str) -> Result<&Tensor> {
        Ok(self.state.value(component, compartment)?)
    }

    /// Advance the clock by `dt`, then invoke `command`
    pub fn step(&mut self, command: &str) -> Result<&State> {
        let args = StepArgs::new(self.t + self.dt(), self.dt());
        self.state = self.circuit.invoke(command, &self.state, args)?;
        self.t = args.t;
        Ok(&self.state)
    }

    /// Invoke `command` at the current time without advancing the clock
    pub fn apply(&mut self, command: &str) -> Result<&State> {
        let args = StepArgs::new(self.t, self.dt());
        self.state = self.circuit.invoke(command, &self.state, args)?;
        Ok(&self.state)
    }

    /// Step `command` `n_steps` times
    pub fn run(&mut self, command: &str, n_steps: usize) -> Result<&State> {
        let schedule = self.schedule(n_steps);
        self.state = self.circuit.command(command)?.scan(&self.state, &schedule)?;
        self.finish(&schedule);
        Ok(&self.state)
    }

    /// Step `command` `n_steps` times, returning the value of `path` after each step
    pub fn record(&mut self, command: &str, n_steps: usize, path: &CompartmentPath) -> Result<Vec<Tensor>> {
        let schedule = self.schedule(n_steps);
        let (state, trace) = self
            .circuit
            .command(command)?
            .scan_record(&self.state, &schedule, path)?;
        self.state = state;
        self.finish(&schedule);
        Ok(trace)
    }

    /// Rewind the clock to `t0`, invoking `command` (typically `reset`) when given
    pub fn rewind(&mut self, command: Option<&str>) -> Result<()> {
        self.t = self.config.simulation.t0;
        if let Some(command) = command {
            self.apply(command)?;
        }
        debug!(t = self.t, "simulation clock rewound");
        Ok(())
    }

    /// Directory parameters are saved to and loaded from
    pub fn param_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.persistence.param_dir)
    }

    pub fn save_params(&self) -> Result<()> {
        Ok(self.circuit.save_params(&self.state, self.param_dir())?)
    }

    /// Restore persistent compartments; the state is untouched on failure
    pub fn load_params(&mut self) -> Result<()> {
        let state = self.circuit.load_params(self.state.clone(), self.param_dir())?;
        self.state = state;
        Ok(())
    }

    pub fn describe(&self) -> String {
        self.circuit.describe(&self.state)
    }

    /// Consume the driver, returning the circuit and the final state
    pub fn into_parts(self) -> (Circuit, State) {
        (self.circuit, self.state)
    }

    fn schedule(&self, n_steps: usize) -> Vec<StepArgs> {
        let dt = self.dt();
        (1..=n_steps)
            .map(|i| StepArgs::new(self.t + i as f32 * dt, dt))
            .collect()
    }

    fn finish(&mut self, schedule: &[StepArgs]) {
        if let Some(last) = schedule.last() {
            self.t = last.t;
        }
    }
}
