//! Point estimation
//!
//! The addressables enabled when the run starts are the estimation
//! candidates. Phase `n` frees the candidates whose phase is at most `n`;
//! phases run in order and each starts from the previous phase's optimum.
//! Every candidate is enabled again once the last phase finishes.

use crate::drivers::Minimiser;
use crate::model::{Model, ModelError};
use crate::models::RunMode;
use crate::run_modes::evaluator::ModelEvaluator;
use crate::run_modes::{PhaseResult, RunDetail, RunModeStrategy, StrategyOutcome};
use tracing::{info, warn};

/// Multi-phase minimisation over the enabled addressables
pub struct EstimationRun {
    minimiser: Box<dyn Minimiser>,
    max_phase: Option<u32>,
}

impl EstimationRun {
    /// `max_phase` caps the phases run; `None` runs every phase present
    pub fn new(minimiser: Box<dyn Minimiser>, max_phase: Option<u32>) -> Self {
        Self {
            minimiser,
            max_phase,
        }
    }
}

impl RunModeStrategy for EstimationRun {
    fn mode(&self) -> RunMode {
        RunMode::Estimation
    }

    fn execute(&mut self, model: &mut Model) -> Result<StrategyOutcome, ModelError> {
        let labels = model.registry().enabled();
        let phases = estimate_phases(model, self.minimiser.as_mut(), self.max_phase)?;

        let score = final_score(model)?;
        let estimates = labels
            .iter()
            .map(|label| model.registry().get(label))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StrategyOutcome {
            score,
            detail: RunDetail::Estimation {
                labels,
                estimates,
                phases,
            },
        })
    }
}

/// Run every estimation phase and leave the model at the optimum
///
/// The enabled set is restored to the starting candidates afterwards, also
/// when a phase fails.
pub(crate) fn estimate_phases(
    model: &mut Model,
    minimiser: &mut dyn Minimiser,
    max_phase: Option<u32>,
) -> Result<Vec<PhaseResult>, ModelError> {
    let candidates = model.registry().enabled();
    let highest = model.registry().max_phase(&candidates);
    let last = max_phase.map_or(highest, |cap| cap.min(highest));

    let outcome = run_phases(model, minimiser, &candidates, last);
    for label in &candidates {
        model.registry_mut().enable(label)?;
    }
    outcome
}

fn run_phases(
    model: &mut Model,
    minimiser: &mut dyn Minimiser,
    candidates: &[String],
    last: u32,
) -> Result<Vec<PhaseResult>, ModelError> {
    let mut phases = Vec::new();
    for phase in 1..=last {
        if model.stop_requested() {
            warn!(phase, "Stopping estimation before phase");
            break;
        }

        let enabled = model.registry_mut().enable_phase(phase, candidates);
        if enabled == 0 {
            continue;
        }
        info!(model = %model.instance_id(), phase, enabled, "Starting estimation phase");

        let start = model.registry().enabled_values();
        let bounds = model.registry().enabled_bounds();
        let result = {
            let mut evaluator = ModelEvaluator::new(model);
            minimiser.minimise(&mut evaluator, &start, &bounds)?
        };
        model.registry_mut().set_enabled_values(&result.values)?;

        info!(
            phase,
            score = result.score,
            evaluations = result.evaluations,
            converged = result.converged,
            "Estimation phase complete"
        );
        phases.push(PhaseResult {
            phase,
            enabled: model.registry().enabled(),
            result,
        });
    }
    Ok(phases)
}

/// Re-run the model at its current values so it is left in that state
///
/// A per-iteration failure at the optimum yields no score rather than an
/// error. Skipped once a stop has been requested.
pub(crate) fn final_score(model: &mut Model) -> Result<Option<f64>, ModelError> {
    if model.stop_requested() {
        return Ok(None);
    }
    match model.full_iteration() {
        Ok(result) => Ok(Some(result.score)),
        Err(e) if !e.is_structural() => {
            warn!(error = %e, "Final iteration failed");
            model.abort_iteration();
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
