//! Simulated observations
//!
//! Candidate `c` reseeds the model RNG with stream `c` of the configured
//! seed, so candidate `c` draws the same observations however many
//! candidates are requested. Observation executors see `simulating` set.

use crate::model::{Model, ModelError};
use crate::models::RunMode;
use crate::rng::RngManager;
use crate::run_modes::{RunDetail, RunModeStrategy, StrategyOutcome};
use tracing::{info, warn};

pub struct SimulationRun {
    candidates: usize,
}

impl SimulationRun {
    pub fn new(candidates: usize) -> Self {
        Self { candidates }
    }
}

impl RunModeStrategy for SimulationRun {
    fn mode(&self) -> RunMode {
        RunMode::Simulation
    }

    fn execute(&mut self, model: &mut Model) -> Result<StrategyOutcome, ModelError> {
        let seed = model.config().rng_seed;
        info!(model = %model.instance_id(), candidates = self.candidates, "Simulating");

        model.set_simulating(true);
        let outcome = simulate(model, seed, self.candidates);
        model.set_simulating(false);
        let scores = outcome?;

        Ok(StrategyOutcome {
            score: scores.last().copied().flatten(),
            detail: RunDetail::Simulation { scores },
        })
    }
}

fn simulate(model: &mut Model, seed: u64, candidates: usize) -> Result<Vec<Option<f64>>, ModelError> {
    let mut scores = Vec::with_capacity(candidates);
    for candidate in 0..candidates {
        if model.stop_requested() {
            warn!(candidate, "Stopping simulation");
            break;
        }
        model.set_rng(RngManager::for_stream(seed, candidate as u64));

        match model.full_iteration() {
            Ok(result) => scores.push(Some(result.score)),
            Err(e) if !e.is_structural() => {
                warn!(candidate, error = %e, "Simulation candidate failed");
                model.abort_iteration();
                scores.push(None);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(scores)
}
