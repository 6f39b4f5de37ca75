//! Minimiser and MCMC sampler seams
//!
//! Run modes never optimise or sample themselves: they hand an
//! [`Evaluator`] to a [`Minimiser`] or [`McmcSampler`]. Vectors passed
//! across this boundary are aligned with the registry's enabled
//! addressables, in registration order.
//!
//! Two reference drivers ship with the engine so a model can run without
//! an external optimiser:
//!
//! - [`SimplexSearch`]: bounded Nelder-Mead search on argmin
//! - [`RandomWalkMetropolis`]: Gaussian random-walk Metropolis
//!
//! Both are deterministic for a given RNG seed.

pub mod metropolis;
pub mod simplex;

use crate::addressables::Bounds;
use crate::model::ModelError;
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};

pub use metropolis::RandomWalkMetropolis;
pub use simplex::SimplexSearch;

/// Scores candidate vectors
///
/// Lower scores are better. A failed candidate is reported as
/// `f64::INFINITY` rather than an error; errors are reserved for problems
/// that must stop the run.
pub trait Evaluator {
    /// Length of every candidate vector
    fn dimension(&self) -> usize;

    fn evaluate(&mut self, values: &[f64]) -> Result<f64, ModelError>;

    /// Whether the driver should stop early
    fn should_stop(&self) -> bool {
        false
    }
}

/// Outcome of a minimisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimiserResult {
    /// Best vector found
    pub values: Vec<f64>,
    /// Score at `values`
    pub score: f64,
    pub evaluations: usize,
    /// Whether the convergence criterion was met
    pub converged: bool,
}

/// Finds the vector with the lowest score
pub trait Minimiser: Send {
    fn minimise(
        &mut self,
        evaluator: &mut dyn Evaluator,
        start: &[f64],
        bounds: &[Bounds],
    ) -> Result<MinimiserResult, ModelError>;
}

/// One retained chain link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSample {
    /// Proposal number this link was recorded at
    pub iteration: usize,
    pub values: Vec<f64>,
    pub score: f64,
    /// Whether the proposal at this iteration was accepted
    pub accepted: bool,
}

/// MCMC chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub samples: Vec<ChainSample>,
    pub acceptance_rate: f64,
    pub evaluations: usize,
}

/// Draws a chain from the posterior defined by the evaluator
pub trait McmcSampler: Send {
    fn sample(
        &mut self,
        evaluator: &mut dyn Evaluator,
        start: &[f64],
        bounds: &[Bounds],
        rng: &mut RngManager,
    ) -> Result<Chain, ModelError>;
}

/// Keep `value` within `bounds`
pub(crate) fn clamp_to(value: f64, bounds: &Bounds) -> f64 {
    value.max(bounds.lower_or_inf()).min(bounds.upper_or_inf())
}

/// Natural step length for one dimension
///
/// A fraction of the range when both bounds are finite, otherwise a fraction
/// of the current magnitude (at least one).
pub(crate) fn natural_scale(value: f64, bounds: &Bounds, fraction: f64) -> f64 {
    if bounds.is_finite() {
        fraction * (bounds.upper_or_inf() - bounds.lower_or_inf())
    } else {
        fraction * value.abs().max(1.0)
    }
}

pub(crate) fn check_dimensions(
    evaluator: &dyn Evaluator,
    start: &[f64],
    bounds: &[Bounds],
) -> Result<(), String> {
    if start.len() != evaluator.dimension() || bounds.len() != evaluator.dimension() {
        return Err(format!(
            "expected {} values and bounds, got {} values and {} bounds",
            evaluator.dimension(),
            start.len(),
            bounds.len()
        ));
    }
    Ok(())
}
