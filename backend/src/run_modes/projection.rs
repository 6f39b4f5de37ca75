//! Projection past the final year
//!
//! A historical iteration to `final_year` comes first. The projection final
//! phase is then set and one iteration runs to `projection_final_year`, or
//! one per input row when an input table is supplied.

use crate::model::{Model, ModelError};
use crate::models::{RunMode, State};
use crate::run_modes::{InputTable, ProjectionResult, RunDetail, RunModeStrategy, StrategyOutcome};
use tracing::{info, warn};

pub struct ProjectionRun {
    input: Option<InputTable>,
}

impl ProjectionRun {
    pub fn new(input: Option<InputTable>) -> Self {
        Self { input }
    }
}

impl RunModeStrategy for ProjectionRun {
    fn mode(&self) -> RunMode {
        RunMode::Projection
    }

    fn execute(&mut self, model: &mut Model) -> Result<StrategyOutcome, ModelError> {
        if let Some(table) = &self.input {
            table.validate(model.registry())?;
        }

        model.set_projection_final_phase(false);
        let historical = model.full_iteration()?;
        info!(
            model = %model.instance_id(),
            final_year = historical.last_year,
            score = historical.score,
            "Historical iteration complete"
        );

        model.set_projection_final_phase(true);
        let mut runs = Vec::new();
        match &self.input {
            None => {
                if !model.stop_requested() {
                    let result = model.full_iteration()?;
                    runs.push(ProjectionResult {
                        row: None,
                        score: result.score,
                        last_year: result.last_year,
                    });
                }
            }
            Some(table) => {
                for index in 0..table.rows.len() {
                    if model.stop_requested() {
                        warn!(row = index, "Stopping projection replay");
                        break;
                    }
                    table.apply(index, model.registry_mut())?;
                    let result = model.full_iteration()?;
                    model.notify(State::InputIterationComplete)?;
                    runs.push(ProjectionResult {
                        row: Some(index),
                        score: result.score,
                        last_year: result.last_year,
                    });
                }
            }
        }

        Ok(StrategyOutcome {
            score: runs.last().map(|run| run.score),
            detail: RunDetail::Projection {
                historical_score: historical.score,
                runs,
            },
        })
    }
}
