//! Monte Carlo simulation over sampled worlds.
//!
//! - `rollout`: plays a world to the end of the round with one policy per seat.
//! - `decision`: values each candidate action by repeated sampling and rollouts.
//! - `stats`: running means and the early-stop rule shared by every decision.

mod decision;
mod rollout;
mod stats;

pub use decision::{Candidate, DecisionReport, Simulator};
pub use rollout::{RolloutOutcome, bid_out, rollout};
pub use stats::{Accumulator, Controller, StopReason};

use crate::config::ConfigError;
use crate::policy::{DecisionPhase, PolicyError};
use euchre_core::model::player::PlayerPosition;
use euchre_core::model::round::{BidError, PlayError};
use euchre_core::world::{InvariantViolation, SamplingError, SamplingStats};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("world sampling failed: {0}")]
    Sampling(#[from] SamplingError),
    #[error("simulated world broke card conservation: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error("rollout play rejected: {0}")]
    Play(#[from] PlayError),
    #[error("rollout bid rejected: {0}")]
    Bid(#[from] BidError),
    #[error("rollout driver rejected: {0}")]
    Config(#[from] ConfigError),
    #[error("rollout policy failed: {0}")]
    Policy(#[from] PolicyError),
    #[error("no candidate actions for {0:?}")]
    NoCandidates(DecisionPhase),
    #[error("{0} has no legal card")]
    NoLegalCard(PlayerPosition),
    #[error("decision context is missing {0}")]
    MissingContext(&'static str),
}

/// Work counters for one policy, accumulated across decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimStats {
    pub decisions: usize,
    pub rollouts: usize,
    /// Rollout proposals replaced by the first legal card.
    pub illegal_corrections: usize,
    pub sampling: SamplingStats,
}

impl SimStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, other: &SimStats) {
        self.decisions += other.decisions;
        self.rollouts += other.rollouts;
        self.illegal_corrections += other.illegal_corrections;
        self.sampling.merge(&other.sampling);
    }
}

/// SplitMix64 finalizer over `seed` and `salt`; derives independent stream seeds.
pub fn mix_seed(seed: u64, salt: u64) -> u64 {
    let mut z = seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::{SimStats, mix_seed};

    #[test]
    fn mix_seed_separates_streams() {
        assert_ne!(mix_seed(1, 0), mix_seed(1, 1));
        assert_ne!(mix_seed(1, 2), mix_seed(2, 1));
        assert_eq!(mix_seed(7, 9), mix_seed(7, 9));
    }

    #[test]
    fn stats_merge_adds_counters() {
        let mut total = SimStats::new();
        let mut one = SimStats::new();
        one.rollouts = 10;
        one.illegal_corrections = 1;
        one.sampling.samples = 4;
        total.merge(&one);
        total.merge(&one);
        assert_eq!(total.rollouts, 20);
        assert_eq!(total.illegal_corrections, 2);
        assert_eq!(total.sampling.samples, 8);
    }
}
