//! Random-walk Metropolis sampler
//!
//! Scores are negative log posteriors, so a proposal with score `s'` from a
//! current point with score `s` is accepted with probability
//! `min(1, exp(s - s'))`. Proposals outside the bounds are rejected without
//! being evaluated.

use crate::addressables::Bounds;
use crate::drivers::{
    check_dimensions, natural_scale, Chain, ChainSample, Evaluator, McmcSampler,
};
use crate::model::ModelError;
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Gaussian random-walk Metropolis sampler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomWalkMetropolis {
    /// Number of proposals
    pub length: usize,
    /// Record every `keep`-th link
    pub keep: usize,
    /// Proposal standard deviation as a fraction of each dimension's range
    pub step_size: f64,
}

impl Default for RandomWalkMetropolis {
    fn default() -> Self {
        Self {
            length: 1_000,
            keep: 1,
            step_size: 0.02,
        }
    }
}

impl McmcSampler for RandomWalkMetropolis {
    fn sample(
        &mut self,
        evaluator: &mut dyn Evaluator,
        start: &[f64],
        bounds: &[Bounds],
        rng: &mut RngManager,
    ) -> Result<Chain, ModelError> {
        check_dimensions(evaluator, start, bounds).map_err(ModelError::Sampler)?;
        if self.keep == 0 {
            return Err(ModelError::Sampler("keep must be at least 1".into()));
        }
        if !(self.step_size > 0.0) {
            return Err(ModelError::Sampler("step_size must be positive".into()));
        }
        if let Some(i) = start.iter().zip(bounds).position(|(v, b)| !b.contains(*v)) {
            return Err(ModelError::Sampler(format!(
                "starting value {} of dimension {} is outside its bounds",
                start[i], i
            )));
        }

        let mut current = start.to_vec();
        let mut current_score = evaluator.evaluate(&current)?;
        let mut evaluations = 1;
        if !current_score.is_finite() {
            return Err(ModelError::Sampler(format!(
                "starting point has a non-finite score ({})",
                current_score
            )));
        }

        let scales: Vec<f64> = current
            .iter()
            .zip(bounds)
            .map(|(value, b)| natural_scale(*value, b, self.step_size))
            .collect();

        let mut chain = Chain::default();
        let mut accepted_total = 0usize;
        let mut proposals = 0usize;

        for iteration in 1..=self.length {
            if evaluator.should_stop() {
                warn!(iteration, "Sampler stopped early");
                break;
            }
            proposals += 1;

            let proposal: Vec<f64> = current
                .iter()
                .zip(&scales)
                .map(|(value, scale)| rng.normal(*value, *scale))
                .collect();

            let in_bounds = proposal.iter().zip(bounds).all(|(v, b)| b.contains(*v));
            let mut accepted = false;
            if in_bounds {
                let score = evaluator.evaluate(&proposal)?;
                evaluations += 1;
                // infinite scores are never accepted
                if score.is_finite()
                    && (score <= current_score || rng.next_f64().ln() < current_score - score)
                {
                    current = proposal;
                    current_score = score;
                    accepted = true;
                    accepted_total += 1;
                }
            }

            if iteration % self.keep == 0 {
                chain.samples.push(ChainSample {
                    iteration,
                    values: current.clone(),
                    score: current_score,
                    accepted,
                });
            }
        }

        chain.evaluations = evaluations;
        chain.acceptance_rate = if proposals == 0 {
            0.0
        } else {
            accepted_total as f64 / proposals as f64
        };
        debug!(
            proposals,
            evaluations,
            acceptance_rate = chain.acceptance_rate,
            "Chain complete"
        );
        Ok(chain)
    }
}
