//! Objective function seam
//!
//! The objective function (likelihoods, penalties) is an external
//! collaborator. After every full iteration the model asks it for a score
//! and adds the priors of the enabled addressables.

use crate::addressables::AddressableRegistry;
use crate::models::{DerivedQuantityState, ModelConfig};

/// What an objective function can read when scoring an iteration
pub struct ScoreContext<'a> {
    pub config: &'a ModelConfig,
    pub registry: &'a AddressableRegistry,
    pub derived: &'a DerivedQuantityState,
    /// Zero-based index of the iteration being scored
    pub iteration: u64,
}

/// Scores a completed full iteration; lower is better
pub trait ObjectiveFunction: Send {
    fn score(&mut self, ctx: &ScoreContext<'_>) -> Result<f64, String>;
}
