//! Determinization of hidden information.
//!
//! - `sampler`: deals the unseen cards to the other seats consistently with what one seat has observed.
//! - `validate`: conservation and uniqueness checks run on sampled and simulated worlds.

mod sampler;
mod validate;

pub use sampler::{SampledWorld, SamplingError, SamplingStats, WorldSampler};
pub use validate::{CardLocation, InvariantViolation, validate_world};
