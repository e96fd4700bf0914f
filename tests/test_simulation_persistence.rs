// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

/*!
Simulation driver integration tests.

These tests validate:
- A configuration file drives the clock, seed and parameter directory
- Saved parameters reload bit exactly into a freshly built circuit
- Spiking cells driven through Hebbian and trace STDP cables stay finite
- Help reports and state descriptions cover every component
*/

use std::collections::HashMap;
use std::fs;

use synaptix::config::load_config;
use synaptix::neural::types::full;
use synaptix::prelude::*;
use synaptix::simulation::{default_integrator, root_key};
use tempfile::TempDir;

fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let params = dir.path().join("params");
    let path = dir.path().join("synaptix_configuration.toml");
    fs::write(
        &path,
        format!(
            r#"
[simulation]
dt = 0.5
seed = 7

[integration]
method = "midpoint"

[persistence]
param_dir = "{}"
"#,
            params.display()
        ),
    )
    .unwrap();
    path
}

fn spiking_circuit(config: &SynaptixConfig) -> Circuit {
    let mut keys = root_key(config).split_n(2).into_iter();
    let integrator = default_integrator(config).unwrap();

    let mut circuit = Circuit::new();
    circuit
        .add_component(
            HebbianSynapse::new(
                "W",
                HebbianSynapseConfig {
                    eta: 0.01,
                    ..HebbianSynapseConfig::new(3, 2)
                },
                keys.next().unwrap(),
            )
            .unwrap(),
        )
        .unwrap();
    circuit
        .add_component(IzhikevichCell::new(
            "z",
            IzhikevichCellConfig {
                integration_type: integrator,
                ..IzhikevichCellConfig::new(2)
            },
        ))
        .unwrap();
    circuit
        .add_component(
            TraceStdpSynapse::new(
                "S",
                TraceStdpSynapseConfig::new(2, 2, 0.01, 0.012),
                keys.next().unwrap(),
            )
            .unwrap(),
        )
        .unwrap();
    circuit.wire(("W", "outputs"), ("z", "j")).unwrap();
    circuit.wire(("z", "s"), ("S", "inputs")).unwrap();
    circuit
        .compile(
            "advance",
            &[("W", ADVANCE_STATE), ("z", ADVANCE_STATE), ("S", ADVANCE_STATE)],
        )
        .unwrap();
    circuit
        .compile("reset", &[("W", RESET), ("z", RESET), ("S", RESET)])
        .unwrap();
    circuit
}

#[test]
fn test_config_file_drives_simulation() {
    let dir = TempDir::new().unwrap();
    let config = load_config(Some(write_config(&dir).as_path()), None).unwrap();
    assert_eq!(config.simulation.dt, 0.5);
    assert_eq!(default_integrator(&config).unwrap(), Integrator::Midpoint);

    let mut sim = Simulation::new(spiking_circuit(&config), config).unwrap();
    sim.clamp("W", "inputs", full(&[1, 3], 20.0)).unwrap();
    let voltages = sim.record("advance", 40, &("z", "v").into()).unwrap();
    assert_eq!(voltages.len(), 40);
    assert_eq!(sim.t(), 20.0);
    assert!(voltages.iter().all(|v| v.iter().all(|x| x.is_finite())));
}

#[test]
fn test_params_round_trip_through_driver() {
    let dir = TempDir::new().unwrap();
    let config = load_config(Some(write_config(&dir).as_path()), None).unwrap();

    let sim = Simulation::new(spiking_circuit(&config), config.clone()).unwrap();
    sim.save_params().unwrap();
    let saved_w = sim.value("W", "weights").unwrap().clone();
    let saved_s = sim.value("S", "weights").unwrap().clone();

    // a different seed builds different weights until the archive is loaded
    let mut overrides = HashMap::new();
    overrides.insert("seed".to_string(), "8".to_string());
    let other = load_config(Some(write_config(&dir).as_path()), Some(&overrides)).unwrap();
    let mut restored = Simulation::new(spiking_circuit(&other), config).unwrap();
    assert_ne!(restored.value("W", "weights").unwrap(), &saved_w);

    restored.load_params().unwrap();
    assert_eq!(restored.value("W", "weights").unwrap(), &saved_w);
    assert_eq!(restored.value("S", "weights").unwrap(), &saved_s);
}

#[test]
fn test_missing_param_dir_leaves_state_untouched() {
    let dir = TempDir::new().unwrap();
    let config = load_config(Some(write_config(&dir).as_path()), None).unwrap();
    let mut sim = Simulation::new(spiking_circuit(&config), config).unwrap();
    let before = sim.state().clone();
    assert!(sim.load_params().is_err());
    assert_eq!(sim.state(), &before);
}

#[test]
fn test_help_and_describe_cover_components() {
    let circuit = spiking_circuit(&SynaptixConfig::default());
    let report = circuit.help("z").unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["kind"], "IzhikevichCell");

    let sim = Simulation::new(circuit, SynaptixConfig::default()).unwrap();
    let text = sim.describe();
    for header in ["[HebbianSynapse] W", "[IzhikevichCell] z", "[TraceStdpSynapse] S"] {
        assert!(text.contains(header), "missing {header}");
    }
}
