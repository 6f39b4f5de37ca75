//! MCMC run
//!
//! Optionally estimates the MPD first, then hands the sampler an evaluator
//! over the enabled addressables. The sampler draws from its own RNG stream
//! so the model RNG sequence is the same whether or not a chain is run.
//! Re-evaluating a proposal only rewrites addressables and runs a full
//! iteration, so the model is returned to the chain's starting point
//! afterwards.
//!
//! Addressables registered with `mcmc_fixed` stay at their starting value:
//! they are disabled while the chain runs and enabled again afterwards.

use crate::drivers::{Chain, McmcSampler, Minimiser};
use crate::model::{Model, ModelError};
use crate::models::RunMode;
use crate::rng::RngManager;
use crate::run_modes::estimation::{estimate_phases, final_score};
use crate::run_modes::evaluator::ModelEvaluator;
use crate::run_modes::{RunDetail, RunModeStrategy, StrategyOutcome};
use tracing::info;

/// RNG stream reserved for the sampler
const SAMPLER_STREAM: u64 = 0x4d43_4d43;

pub struct McmcRun {
    minimiser: Option<Box<dyn Minimiser>>,
    sampler: Box<dyn McmcSampler>,
}

impl McmcRun {
    /// Without a minimiser the chain starts from the configured values
    pub fn new(minimiser: Option<Box<dyn Minimiser>>, sampler: Box<dyn McmcSampler>) -> Self {
        Self { minimiser, sampler }
    }
}

impl McmcRun {
    fn sample_chain(&mut self, model: &mut Model, start: &[f64]) -> Result<Chain, ModelError> {
        let bounds = model.registry().enabled_bounds();
        let mut rng = RngManager::for_stream(model.config().rng_seed, SAMPLER_STREAM);

        info!(model = %model.instance_id(), dimension = start.len(), "Starting chain");
        let chain = {
            let mut evaluator = ModelEvaluator::new(model);
            self.sampler.sample(&mut evaluator, start, &bounds, &mut rng)?
        };
        info!(
            samples = chain.samples.len(),
            acceptance_rate = chain.acceptance_rate,
            "Chain finished"
        );
        Ok(chain)
    }
}

impl RunModeStrategy for McmcRun {
    fn mode(&self) -> RunMode {
        RunMode::Mcmc
    }

    fn execute(&mut self, model: &mut Model) -> Result<StrategyOutcome, ModelError> {
        if let Some(minimiser) = self.minimiser.as_mut() {
            estimate_phases(model, minimiser.as_mut(), None)?;
        }

        let mut held = Vec::new();
        for label in model.registry().enabled() {
            if model.registry().is_mcmc_fixed(&label)? {
                held.push(label);
            }
        }
        for label in &held {
            model.registry_mut().disable(label)?;
        }

        let labels = model.registry().enabled();
        let start = model.registry().enabled_values();
        let sampled = self.sample_chain(model, &start);
        let restored = model.registry_mut().set_enabled_values(&start);
        for label in &held {
            model.registry_mut().enable(label)?;
        }
        let chain = sampled?;
        restored?;

        let score = final_score(model)?;

        Ok(StrategyOutcome {
            score,
            detail: RunDetail::Mcmc {
                labels,
                start,
                chain,
            },
        })
    }
}
