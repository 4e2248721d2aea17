//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through SimStream instances derived from
//! the single master seed for the run.
//!
//! Each concern gets its own stream, seeded deterministically from
//! (master_seed XOR slot_index). Growth noise additionally derives a
//! short-lived stream per cell from (seed, x, y, age), so the result
//! of a growth pass is a pure function of stand state and never
//! depends on how the grid rows were partitioned across workers.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

const SEED_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

/// A named, deterministic RNG stream for a single concern.
pub struct SimStream {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SimStream {
    /// Create a stream from the master seed and a stable slot index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, slot_index: u64) -> Self {
        let derived_seed = master_seed ^ slot_index.wrapping_mul(SEED_MIX);
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Roll a float in [lo, hi).
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// All RNG streams for a single run, indexed by stable slot.
pub struct StreamBank {
    master_seed: u64,
}

impl StreamBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_stream(&self, slot: StreamSlot) -> SimStream {
        SimStream::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries — only append.
/// Reordering changes every stream's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    Growth = 0,
    Agents = 1,
    Policy = 2,
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Growth => "growth",
            Self::Agents => "agents",
            Self::Policy => "policy",
        }
    }
}

/// Derive a per-cell stream for growth noise. Stable in (seed, x, y, age):
/// two workers growing the same cell at the same age draw the same values.
pub fn cell_stream(master_seed: u64, x: usize, y: usize, age: u32) -> SimStream {
    let mut h = master_seed ^ StreamSlot::Growth as u64;
    for part in [x as u64, y as u64, age as u64] {
        h ^= part.wrapping_add(SEED_MIX).wrapping_add(h << 6).wrapping_add(h >> 2);
        h = h.wrapping_mul(SEED_MIX);
    }
    SimStream::new(h, 0).with_name("cell")
}
