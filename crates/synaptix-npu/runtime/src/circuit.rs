// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Circuit and Command Compiler
//!
//! A [`Circuit`] owns its components and wiring and compiles named commands into
//! [`CompiledCommand`]s. Compilation orders the requested transitions so that each
//! runs after every requested upstream transition (on another component) whose
//! written compartment is wired into one of its reads. Ties and feedback cycles
//! fall back to the requested order; a feedback edge sees the previous step's
//! value.
//!
//! Running a command never mutates the caller's [`State`]: it works on a copy and
//! returns it only when every transition succeeded.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use ahash::AHashMap;
use synaptix_npu_neural::{Tensor, TensorStats};
use tracing::{debug, info, trace};

use crate::compartment::{CompartmentPath, State};
use crate::component::{
    unknown_transition, Component, ComponentView, Declarations, StepArgs, TransitionSpec,
};
use crate::error::{Result, RuntimeError};
use crate::help::HelpReport;
use crate::persistence::{load_archive, params_path, save_archive, ParamArchive};
use crate::wiring::Wiring;

/// One transition of a compiled plan
#[derive(Debug)]
struct PlannedStep {
    component: Arc<dyn Component>,
    spec: &'static TransitionSpec,
    /// (src, dst) edges copied before the transition runs
    inbound: Vec<(CompartmentPath, CompartmentPath)>,
}

/// A compiled, ordered plan of transitions
#[derive(Debug)]
pub struct CompiledCommand {
    name: String,
    requested: Vec<(String, String)>,
    steps: Vec<PlannedStep>,
}

impl CompiledCommand {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execution order as `component.transition`
    pub fn order(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|step| format!("{}.{}", step.component.name(), step.spec.name))
            .collect()
    }

    /// Run the plan once, returning the next state
    pub fn run(&self, state: &State, args: StepArgs) -> Result<State> {
        let mut working = state.clone();
        for step in &self.steps {
            for (src, dst) in &step.inbound {
                let value = working.get(src)?.clone();
                working.set(dst, value)?;
            }

            let name = step.component.name();
            let updates = {
                let view = ComponentView::new(name, &working);
                step.component.execute(step.spec.name, args, &view)?
            };
            trace!(
                command = %self.name,
                component = name,
                transition = step.spec.name,
                updates = updates.len(),
                t = args.t,
                "transition executed"
            );

            for (compartment, value) in updates {
                if !step.spec.writes.contains(&compartment) {
                    return Err(RuntimeError::UndeclaredWrite {
                        component: name.to_string(),
                        transition: step.spec.name.to_string(),
                        compartment: compartment.to_string(),
                    });
                }
                working.set(&CompartmentPath::new(name, compartment), value)?;
            }
        }
        Ok(working)
    }

    /// Run the plan over a schedule of step arguments
    pub fn scan(&self, state: &State, schedule: &[StepArgs]) -> Result<State> {
        let mut current = state.clone();
        for args in schedule {
            current = self.run(&current, *args)?;
        }
        Ok(current)
    }

    /// Like [`scan`](Self::scan), also recording `path` after every step
    pub fn scan_record(
        &self,
        state: &State,
        schedule: &[StepArgs],
        path: &CompartmentPath,
    ) -> Result<(State, Vec<Tensor>)> {
        state.get(path)?;
        let mut current = state.clone();
        let mut trace = Vec::with_capacity(schedule.len());
        for args in schedule {
            current = self.run(&current, *args)?;
            trace.push(current.get(path)?.clone());
        }
        Ok((current, trace))
    }
}

/// Components, wiring and compiled commands
#[derive(Debug, Default)]
pub struct Circuit {
    components: Vec<Arc<dyn Component>>,
    index: AHashMap<String, usize>,
    initial: State,
    wiring: Wiring,
    commands: AHashMap<String, Arc<CompiledCommand>>,
    sealed: bool,
}

impl Circuit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component and its declared compartments
    pub fn add_component<C: Component + 'static>(&mut self, component: C) -> Result<()> {
        self.add_shared(Arc::new(component))
    }

    pub fn add_shared(&mut self, component: Arc<dyn Component>) -> Result<()> {
        if self.sealed {
            return Err(RuntimeError::WiringSealed);
        }
        let name = component.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RuntimeError::DuplicateComponent(name));
        }

        let mut decl = Declarations::new(&name);
        component.declare(&mut decl)?;
        let entries = decl.into_entries();
        debug!(component = %name, kind = component.kind(), compartments = entries.len(), "component registered");
        for (compartment, value) in entries {
            self.initial
                .insert_initial(CompartmentPath::new(name.as_str(), compartment), value);
        }

        self.index.insert(name, self.components.len());
        self.components.push(component);
        Ok(())
    }

    /// Wire `src` into `dst`; both must exist and have the same shape
    pub fn wire(
        &mut self,
        src: impl Into<CompartmentPath>,
        dst: impl Into<CompartmentPath>,
    ) -> Result<()> {
        if self.sealed {
            return Err(RuntimeError::WiringSealed);
        }
        let (src, dst) = (src.into(), dst.into());
        for path in [&src, &dst] {
            if !self.index.contains_key(&path.component) {
                return Err(RuntimeError::UnknownComponent(path.component.clone()));
            }
        }
        let src_shape = self.initial.get(&src)?.shape().to_vec();
        let dst_shape = self.initial.get(&dst)?.shape();
        if src_shape != dst_shape {
            return Err(RuntimeError::ShapeMismatch {
                path: dst,
                expected: dst_shape.to_vec(),
                actual: src_shape,
            });
        }
        debug!(src = %src, dst = %dst, "wired");
        self.wiring.connect(src, dst)
    }

    /// Compile `transitions` (component, transition) into a named command
    pub fn compile(&mut self, name: &str, transitions: &[(&str, &str)]) -> Result<Arc<CompiledCommand>> {
        let requested: Vec<(String, String)> = transitions
            .iter()
            .map(|(c, t)| (c.to_string(), t.to_string()))
            .collect();
        if let Some(existing) = self.commands.get(name) {
            if existing.requested == requested {
                return Ok(Arc::clone(existing));
            }
            return Err(RuntimeError::CommandConflict(name.to_string()));
        }

        let mut nodes = Vec::with_capacity(requested.len());
        for (component, transition) in &requested {
            let shared = self.shared(component)?;
            let spec = shared
                .transition(transition)
                .ok_or_else(|| unknown_transition(component, transition))?;
            nodes.push((shared, spec));
        }

        let order = self.schedule(name, &nodes);
        let steps = order
            .into_iter()
            .map(|i| {
                let (component, spec) = &nodes[i];
                let inbound = self
                    .wiring
                    .inbound(component.name(), spec.reads)
                    .map(|(src, dst)| (src.clone(), dst.clone()))
                    .collect();
                PlannedStep {
                    component: Arc::clone(component),
                    spec: *spec,
                    inbound,
                }
            })
            .collect();

        let command = Arc::new(CompiledCommand {
            name: name.to_string(),
            requested,
            steps,
        });
        info!(command = name, order = ?command.order(), "compiled command");
        self.sealed = true;
        self.commands.insert(name.to_string(), Arc::clone(&command));
        Ok(command)
    }

    /// Topological order over requested transitions, smallest index first
    fn schedule(&self, command: &str, nodes: &[(Arc<dyn Component>, &'static TransitionSpec)]) -> Vec<usize> {
        let n = nodes.len();
        let mut preds: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
        for (i, (component_i, spec_i)) in nodes.iter().enumerate() {
            for (j, (component_j, spec_j)) in nodes.iter().enumerate() {
                if i == j {
                    continue;
                }
                if component_i.name() == component_j.name() {
                    if j < i {
                        preds[i].insert(j);
                    }
                    continue;
                }
                let feeds = self
                    .wiring
                    .inbound(component_i.name(), spec_i.reads)
                    .any(|(src, _)| {
                        src.component == component_j.name()
                            && spec_j.writes.iter().any(|w| *w == src.compartment)
                    });
                if feeds {
                    preds[i].insert(j);
                }
            }
        }

        let mut remaining: BTreeSet<usize> = (0..n).collect();
        let mut order = Vec::with_capacity(n);
        while !remaining.is_empty() {
            let ready = remaining
                .iter()
                .copied()
                .find(|i| preds[*i].iter().all(|p| !remaining.contains(p)));
            let next = match ready {
                Some(i) => i,
                None => {
                    let i = remaining.iter().copied().next().unwrap_or_default();
                    for p in preds[i].iter().filter(|p| remaining.contains(p)) {
                        let from = format!("{}.{}", nodes[*p].0.name(), nodes[*p].1.name);
                        let to = format!("{}.{}", nodes[i].0.name(), nodes[i].1.name);
                        debug!(command, %from, %to, "feedback edge reads previous step value");
                    }
                    i
                }
            };
            remaining.remove(&next);
            order.push(next);
        }
        order
    }

    /// Run a compiled command by name
    pub fn invoke(&self, name: &str, state: &State, args: StepArgs) -> Result<State> {
        self.command(name)?.run(state, args)
    }

    pub fn command(&self, name: &str) -> Result<Arc<CompiledCommand>> {
        self.commands
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownCommand(name.to_string()))
    }

    /// Declared initial values of every compartment
    pub fn initial_state(&self) -> State {
        self.initial.clone()
    }

    pub fn component(&self, name: &str) -> Result<&dyn Component> {
        self.index
            .get(name)
            .map(|&i| self.components[i].as_ref())
            .ok_or_else(|| RuntimeError::UnknownComponent(name.to_string()))
    }

    fn shared(&self, name: &str) -> Result<Arc<dyn Component>> {
        self.index
            .get(name)
            .map(|&i| Arc::clone(&self.components[i]))
            .ok_or_else(|| RuntimeError::UnknownComponent(name.to_string()))
    }

    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|c| c.name())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn help(&self, name: &str) -> Result<HelpReport> {
        Ok(self.component(name)?.help())
    }

    /// Per-compartment tensor statistics, grouped by component
    pub fn describe(&self, state: &State) -> String {
        let mut out = String::new();
        for component in &self.components {
            let _ = writeln!(out, "[{}] {}", component.kind(), component.name());
            for (compartment, value) in state.component_values(component.name()) {
                match TensorStats::of(value) {
                    Some(stats) => {
                        let _ = writeln!(out, "  {compartment}: {stats}");
                    }
                    None => {
                        let _ = writeln!(out, "  {compartment}: shape: {:?} (empty)", value.shape());
                    }
                }
            }
        }
        out
    }

    /// Write every component's persistent compartments to `<dir>/<component>.params`
    pub fn save_params<P: AsRef<Path>>(&self, state: &State, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        for component in &self.components {
            let keys = component.persistent();
            if keys.is_empty() {
                continue;
            }
            let mut archive = ParamArchive::new();
            for key in keys {
                let value = state.value(component.name(), key)?;
                archive.insert(key.to_string(), value.clone());
            }
            save_archive(&archive, params_path(dir, component.name()))?;
        }
        info!(dir = %dir.display(), "saved parameters");
        Ok(())
    }

    /// Restore persistent compartments from `dir`
    ///
    /// `weights` is required; other persisted keys are restored when present and
    /// unknown keys are ignored. Nothing is written unless every archive is valid.
    pub fn load_params<P: AsRef<Path>>(&self, state: State, dir: P) -> Result<State> {
        let dir = dir.as_ref();
        let mut restored: Vec<(CompartmentPath, Tensor)> = Vec::new();
        for component in &self.components {
            let keys = component.persistent();
            if keys.is_empty() {
                continue;
            }
            let mut archive = load_archive(params_path(dir, component.name()))?;
            if keys.contains(&"weights") && !archive.contains_key("weights") {
                return Err(RuntimeError::MissingKey {
                    component: component.name().to_string(),
                    key: "weights".to_string(),
                });
            }
            for key in keys {
                let Some(value) = archive.remove(key) else {
                    continue;
                };
                let path = CompartmentPath::new(component.name(), key);
                let current = state.get(&path)?;
                if current.shape() != value.shape() {
                    return Err(RuntimeError::ShapeMismatch {
                        path,
                        expected: current.shape().to_vec(),
                        actual: value.shape().to_vec(),
                    });
                }
                restored.push((path, value));
            }
        }

        let mut state = state;
        for (path, value) in restored {
            state.set(&path, value)?;
        }
        info!(dir = %dir.display(), "loaded parameters");
        Ok(state)
    }
}
