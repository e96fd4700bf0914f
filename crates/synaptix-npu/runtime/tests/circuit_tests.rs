// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Circuit compilation, ordering, atomicity and persistence tests

use synaptix_npu_neural::types::{full, zeros};
use synaptix_npu_neural::Tensor;
use synaptix_npu_runtime::*;
use tempfile::tempdir;

/// `out = in + step`; optionally writes a compartment it never declared
#[derive(Debug)]
struct Adder {
    name: String,
    step: f32,
    rogue: bool,
}

impl Adder {
    fn new(name: &str, step: f32) -> Self {
        Self {
            name: name.to_string(),
            step,
            rogue: false,
        }
    }
}

const ADDER_TRANSITIONS: &[TransitionSpec] = &[
    TransitionSpec {
        name: ADVANCE_STATE,
        reads: &["input", "output"],
        writes: &["output"],
    },
    TransitionSpec {
        name: RESET,
        reads: &[],
        writes: &["input", "output"],
    },
];

impl Component for Adder {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "Adder"
    }

    fn declare(&self, decl: &mut Declarations) -> Result<()> {
        decl.declare("input", zeros(&[1, 2]))?;
        decl.declare("output", zeros(&[1, 2]))?;
        decl.declare("weights", full(&[2, 2], 0.5))
    }

    fn transitions(&self) -> &'static [TransitionSpec] {
        ADDER_TRANSITIONS
    }

    fn execute(&self, transition: &str, _args: StepArgs, view: &ComponentView<'_>) -> Result<Updates> {
        match transition {
            ADVANCE_STATE => {
                let out = view.get("input")? + self.step;
                if self.rogue {
                    return Ok(vec![("output", out), ("weights", zeros(&[2, 2]))]);
                }
                Ok(vec![("output", out)])
            }
            RESET => Ok(vec![("input", zeros(&[1, 2])), ("output", zeros(&[1, 2]))]),
            other => Err(unknown_transition(&self.name, other)),
        }
    }

    fn persistent(&self) -> Vec<&'static str> {
        vec!["weights"]
    }

    fn help(&self) -> HelpReport {
        HelpReport::new("Adder", "adds a constant").dynamics("output = input + step")
    }
}

fn chain() -> Circuit {
    let mut circuit = Circuit::new();
    circuit.add_component(Adder::new("a", 1.0)).unwrap();
    circuit.add_component(Adder::new("b", 10.0)).unwrap();
    circuit.wire(("a", "output"), ("b", "input")).unwrap();
    circuit
}

fn value(state: &State, component: &str, compartment: &str) -> Vec<f32> {
    state.value(component, compartment).unwrap().iter().copied().collect()
}

#[test]
fn test_upstream_runs_first_regardless_of_request_order() {
    let mut circuit = chain();
    let cmd = circuit
        .compile("advance", &[("b", ADVANCE_STATE), ("a", ADVANCE_STATE)])
        .unwrap();
    assert_eq!(cmd.order(), vec!["a.advance_state", "b.advance_state"]);

    let next = circuit
        .invoke("advance", &circuit.initial_state(), StepArgs::new(0.0, 1.0))
        .unwrap();
    assert_eq!(value(&next, "a", "output"), vec![1.0, 1.0]);
    assert_eq!(value(&next, "b", "output"), vec![11.0, 11.0]);
}

#[test]
fn test_feedback_cycle_uses_request_order() {
    let mut circuit = chain();
    circuit.wire(("b", "output"), ("a", "input")).unwrap();
    let cmd = circuit
        .compile("loop", &[("b", ADVANCE_STATE), ("a", ADVANCE_STATE)])
        .unwrap();
    assert_eq!(cmd.order(), vec!["b.advance_state", "a.advance_state"]);

    // b sees a's previous output (zero), a sees b's fresh output
    let next = cmd.run(&circuit.initial_state(), StepArgs::default()).unwrap();
    assert_eq!(value(&next, "b", "output"), vec![10.0, 10.0]);
    assert_eq!(value(&next, "a", "output"), vec![11.0, 11.0]);
}

#[test]
fn test_compile_is_idempotent_and_detects_conflicts() {
    let mut circuit = chain();
    let first = circuit.compile("advance", &[("a", ADVANCE_STATE)]).unwrap();
    let again = circuit.compile("advance", &[("a", ADVANCE_STATE)]).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &again));
    assert!(matches!(
        circuit.compile("advance", &[("b", ADVANCE_STATE)]),
        Err(RuntimeError::CommandConflict(_))
    ));
}

#[test]
fn test_wiring_is_sealed_after_compile() {
    let mut circuit = chain();
    circuit.compile("reset", &[("a", RESET), ("b", RESET)]).unwrap();
    assert!(circuit.is_sealed());
    assert!(matches!(
        circuit.wire(("b", "output"), ("a", "input")),
        Err(RuntimeError::WiringSealed)
    ));
    assert!(matches!(
        circuit.add_component(Adder::new("c", 0.0)),
        Err(RuntimeError::WiringSealed)
    ));
}

#[test]
fn test_wiring_errors() {
    let mut circuit = chain();
    assert!(matches!(
        circuit.wire(("zzz", "output"), ("a", "input")),
        Err(RuntimeError::UnknownComponent(_))
    ));
    assert!(matches!(
        circuit.wire(("a", "nope"), ("b", "output")),
        Err(RuntimeError::UnknownCompartment(_))
    ));
    assert!(matches!(
        circuit.wire(("a", "output"), ("b", "input")),
        Err(RuntimeError::DuplicateWire { .. })
    ));
    assert!(matches!(
        circuit.wire(("a", "weights"), ("a", "input")),
        Err(RuntimeError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        circuit.add_component(Adder::new("a", 0.0)),
        Err(RuntimeError::DuplicateComponent(_))
    ));
}

#[test]
fn test_unknown_transition_and_command() {
    let mut circuit = chain();
    assert!(matches!(
        circuit.compile("x", &[("a", "explode")]),
        Err(RuntimeError::UnknownTransition { .. })
    ));
    assert!(matches!(
        circuit.invoke("missing", &circuit.initial_state(), StepArgs::default()),
        Err(RuntimeError::UnknownCommand(_))
    ));
}

#[test]
fn test_failed_invocation_leaves_state_untouched() {
    let mut circuit = Circuit::new();
    circuit.add_component(Adder::new("a", 1.0)).unwrap();
    circuit
        .add_component(Adder {
            name: "rogue".to_string(),
            step: 1.0,
            rogue: true,
        })
        .unwrap();
    circuit.wire(("a", "output"), ("rogue", "input")).unwrap();
    circuit
        .compile("advance", &[("a", ADVANCE_STATE), ("rogue", ADVANCE_STATE)])
        .unwrap();

    let before = circuit.initial_state();
    let err = circuit
        .invoke("advance", &before, StepArgs::default())
        .unwrap_err();
    assert!(matches!(err, RuntimeError::UndeclaredWrite { .. }));
    assert_eq!(before, circuit.initial_state());
}

#[test]
fn test_scan_record_traces_every_step() {
    let mut circuit = Circuit::new();
    circuit.add_component(Adder::new("a", 1.0)).unwrap();
    circuit.wire(("a", "output"), ("a", "input")).unwrap();
    let cmd = circuit.compile("advance", &[("a", ADVANCE_STATE)]).unwrap();

    let schedule: Vec<StepArgs> = (0..4).map(|i| StepArgs::new(i as f32, 1.0)).collect();
    let (last, trace) = cmd
        .scan_record(
            &circuit.initial_state(),
            &schedule,
            &CompartmentPath::new("a", "output"),
        )
        .unwrap();
    let firsts: Vec<f32> = trace.iter().map(|t: &Tensor| t[[0, 0]]).collect();
    assert_eq!(firsts, vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(last, cmd.scan(&circuit.initial_state(), &schedule).unwrap());
}

#[test]
fn test_clamp_then_reset() {
    let mut circuit = chain();
    circuit
        .compile("reset", &[("a", RESET), ("b", RESET)])
        .unwrap();
    let mut state = circuit.initial_state();
    state.clamp("a", "input", full(&[1, 2], 3.0)).unwrap();
    let reset = circuit.invoke("reset", &state, StepArgs::default()).unwrap();
    assert_eq!(value(&reset, "a", "input"), vec![0.0, 0.0]);
}

#[test]
fn test_describe_lists_every_compartment() {
    let circuit = chain();
    let text = circuit.describe(&circuit.initial_state());
    assert!(text.contains("[Adder] a"));
    assert!(text.contains("weights: mean: 0.5"));
    assert_eq!(circuit.help("a").unwrap().kind, "Adder");
}

#[test]
fn test_params_round_trip() {
    let circuit = chain();
    let dir = tempdir().unwrap();
    let mut state = circuit.initial_state();
    state
        .clamp("a", "weights", Tensor::from_elem(ndarray::IxDyn(&[2, 2]), 0.123_456_7))
        .unwrap();
    circuit.save_params(&state, dir.path()).unwrap();

    let loaded = circuit
        .load_params(circuit.initial_state(), dir.path())
        .unwrap();
    let bits = |s: &State| -> Vec<u32> {
        s.value("a", "weights").unwrap().iter().map(|x| x.to_bits()).collect()
    };
    assert_eq!(bits(&loaded), bits(&state));
}

#[test]
fn test_load_rejects_archive_without_weights() {
    let circuit = chain();
    let dir = tempdir().unwrap();
    circuit.save_params(&circuit.initial_state(), dir.path()).unwrap();
    let mut archive = ParamArchive::new();
    archive.insert("biases".to_string(), zeros(&[1, 2]));
    save_archive(&archive, params_path(dir.path(), "b")).unwrap();

    let err = circuit
        .load_params(circuit.initial_state(), dir.path())
        .unwrap_err();
    assert!(matches!(err, RuntimeError::MissingKey { .. }));
}

#[test]
fn test_load_from_missing_directory_is_io_error() {
    let circuit = chain();
    let dir = tempdir().unwrap();
    let err = circuit
        .load_params(circuit.initial_state(), dir.path().join("absent"))
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Io(_)));
}
