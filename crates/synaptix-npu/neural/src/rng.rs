// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Splittable Random Keys
//!
//! A `RngKey` is consumed by whoever draws from it. Deriving several independent
//! streams goes through [`RngKey::split`] / [`RngKey::split_n`], so two consumers can
//! never silently share one stream: the key is neither `Copy` nor `Clone`.

use ndarray::{ArrayD, IxDyn};
use rand::distributions::{Bernoulli, Distribution};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::types::{NeuralError, Result, Tensor};

/// Stream id reserved for key derivation, distinct from the sampling stream (0)
const SPLIT_STREAM: u64 = 1;

/// Move-only pseudo-random key
#[derive(Debug, PartialEq, Eq)]
pub struct RngKey {
    seed: [u8; 32],
}

impl RngKey {
    /// Root key from a 64-bit seed
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self { seed: bytes }
    }

    /// Split into two independent keys
    pub fn split(self) -> (RngKey, RngKey) {
        let mut derive = self.deriver();
        let first = Self::derive_one(&mut derive);
        let second = Self::derive_one(&mut derive);
        (first, second)
    }

    /// Split into `n` independent keys
    pub fn split_n(self, n: usize) -> Vec<RngKey> {
        let mut derive = self.deriver();
        (0..n).map(|_| Self::derive_one(&mut derive)).collect()
    }

    /// Turn the key into a generator for sampling
    pub fn into_rng(self) -> ChaCha8Rng {
        ChaCha8Rng::from_seed(self.seed)
    }

    /// Draw a `{0, 1}` mask where each entry is 1 with probability `p`
    pub fn bernoulli(self, p: f64, shape: &[usize]) -> Result<Tensor> {
        let dist = Bernoulli::new(p)
            .map_err(|e| NeuralError::invalid_parameter("p_conn", e.to_string()))?;
        let mut rng = self.into_rng();
        Ok(ArrayD::from_shape_simple_fn(IxDyn(shape), || {
            if dist.sample(&mut rng) {
                1.0
            } else {
                0.0
            }
        }))
    }

    fn deriver(self) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::from_seed(self.seed);
        rng.set_stream(SPLIT_STREAM);
        rng
    }

    fn derive_one(derive: &mut ChaCha8Rng) -> RngKey {
        let mut bytes = [0u8; 32];
        derive.fill_bytes(&mut bytes);
        RngKey { seed: bytes }
    }
}
