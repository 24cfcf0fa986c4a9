//! Deterministic random number generation.
//!
//! RULE: Nothing in the generator may call any platform RNG.
//! All randomness flows through StageRng instances derived
//! from the single master seed given to the run.
//!
//! Each stage gets its own stream, seeded from
//! (master_seed XOR mixed stage_index). This means:
//!   - Regenerating one table never shifts another table's draws.
//!   - Each stage's stream is fully reproducible in isolation.
//!
//! Per-entity streams (`RngBank::for_entity`) mix the entity index in as
//! well, so one entity's event sequence never depends on how many draws
//! its predecessors consumed.

use rand::{RngCore, SeedableRng};
use rand_distr::{Distribution, Exp, StandardNormal};
use rand_pcg::Pcg64Mcg;

const STAGE_MIX: u64 = 0x9e37_79b9_7f4a_7c15;
const ENTITY_MIX: u64 = 0xbf58_476d_1ce4_e5b9;

/// A named, deterministic RNG for a single generation stage.
pub struct StageRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl StageRng {
    /// Create a stage RNG from the master seed and a stable stage index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, stage_index: u64) -> Self {
        let derived_seed = master_seed ^ stage_index.wrapping_mul(STAGE_MIX);
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

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Uniform integer in [lo, hi] inclusive.
    pub fn int_inclusive(&mut self, lo: i64, hi: i64) -> i64 {
        assert!(hi >= lo, "empty integer range");
        let span = (hi - lo) as u64 + 1;
        lo + self.next_u64_below(span) as i64
    }

    /// Uniform float in [lo, hi).
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    pub fn standard_normal(&mut self) -> f64 {
        StandardNormal.sample(self)
    }

    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        mean + std_dev * self.standard_normal()
    }

    /// Exponential draw with the given mean (not rate).
    pub fn exponential(&mut self, mean: f64) -> f64 {
        match Exp::new(1.0 / mean) {
            Ok(dist) => dist.sample(self),
            Err(_) => 0.0,
        }
    }

    /// Index drawn from a discrete distribution by cumulative walk.
    /// Weights need not be normalised; a zero-weight entry is never chosen
    /// unless every weight is zero.
    pub fn weighted_index(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        if weights.is_empty() || total <= 0.0 {
            return 0;
        }
        let roll = self.next_f64() * total;
        let mut cumulative = 0.0;
        let mut last_positive = 0;
        for (i, w) in weights.iter().enumerate() {
            if *w <= 0.0 {
                continue;
            }
            last_positive = i;
            cumulative += w;
            if roll < cumulative {
                return i;
            }
        }
        last_positive
    }
}

impl RngCore for StageRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// All stage RNGs for a single run, indexed by stable slot.
#[derive(Debug, Clone, Copy)]
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_stage(&self, slot: StageSlot) -> StageRng {
        StageRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }

    /// Independent stream for one entity within a stage.
    pub fn for_entity(&self, slot: StageSlot, entity_index: usize) -> StageRng {
        let entity_seed = self
            .master_seed
            .wrapping_add((entity_index as u64 + 1).wrapping_mul(ENTITY_MIX));
        StageRng::new(entity_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable stage slot assignments.
/// NEVER reorder or remove entries; only append.
/// Reordering changes every stage's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StageSlot {
    Population = 0,
    Assessment = 1,
    Behavior = 2,
    EdgeCases = 3,
    Demographics = 4,
    // Add new stages here, append only.
}

impl StageSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Population => "population",
            Self::Assessment => "assessment",
            Self::Behavior => "behavior",
            Self::EdgeCases => "edge_cases",
            Self::Demographics => "demographics",
        }
    }
}
