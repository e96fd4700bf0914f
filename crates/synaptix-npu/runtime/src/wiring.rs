// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Wiring graph: directed `src -> dst` edges between compartments
//!
//! Each destination has at most one source. Edges are copied into their
//! destination immediately before the transition reading it runs.

use std::collections::BTreeMap;

use crate::compartment::CompartmentPath;
use crate::error::{Result, RuntimeError};

#[derive(Debug, Clone, Default)]
pub struct Wiring {
    /// dst -> src
    edges: BTreeMap<CompartmentPath, CompartmentPath>,
}

impl Wiring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `src -> dst`; fails if `dst` already has a source
    pub fn connect(&mut self, src: CompartmentPath, dst: CompartmentPath) -> Result<()> {
        if let Some(existing) = self.edges.get(&dst) {
            return Err(RuntimeError::DuplicateWire {
                dst,
                existing: existing.clone(),
            });
        }
        self.edges.insert(dst, src);
        Ok(())
    }

    pub fn source_of(&self, dst: &CompartmentPath) -> Option<&CompartmentPath> {
        self.edges.get(dst)
    }

    /// Edges `(src, dst)` whose destination is one of `compartments` of `component`
    pub fn inbound<'a>(
        &'a self,
        component: &'a str,
        compartments: &'a [&'static str],
    ) -> impl Iterator<Item = (&'a CompartmentPath, &'a CompartmentPath)> + 'a {
        self.edges.iter().filter_map(move |(dst, src)| {
            let read = dst.component == component
                && compartments.iter().any(|name| *name == dst.compartment);
            read.then_some((src, dst))
        })
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_source_per_destination() {
        let mut wiring = Wiring::new();
        wiring
            .connect(("W", "outputs").into(), ("err", "mu").into())
            .unwrap();
        let err = wiring
            .connect(("V", "outputs").into(), ("err", "mu").into())
            .unwrap_err();
        match err {
            RuntimeError::DuplicateWire { existing, .. } => {
                assert_eq!(existing.to_string(), "W/outputs")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_inbound_filters_by_read_set() {
        let mut wiring = Wiring::new();
        wiring
            .connect(("err", "dmu").into(), ("W", "post").into())
            .unwrap();
        wiring
            .connect(("X", "outputs").into(), ("W", "inputs").into())
            .unwrap();
        let reads: &[&'static str] = &["post"];
        let inbound: Vec<_> = wiring.inbound("W", reads).collect();
        assert_eq!(inbound.len(), 1);
        assert_eq!(inbound[0].0.to_string(), "err/dmu");
    }
}
