//! Basic run: configured values, or one iteration per input row

use crate::model::{Model, ModelError};
use crate::models::{RunMode, State};
use crate::run_modes::{InputTable, RunDetail, RunModeStrategy, StrategyOutcome};
use tracing::{info, warn};

/// Single full iteration, or input-driven replay
///
/// With an input table, each row is written into the registry, a full
/// iteration runs, and `InputIterationComplete` is fired. Any failure is
/// fatal.
pub struct BasicRun {
    input: Option<InputTable>,
}

impl BasicRun {
    pub fn new(input: Option<InputTable>) -> Self {
        Self { input }
    }
}

impl RunModeStrategy for BasicRun {
    fn mode(&self) -> RunMode {
        RunMode::Basic
    }

    fn execute(&mut self, model: &mut Model) -> Result<StrategyOutcome, ModelError> {
        let table = match &self.input {
            None => {
                let result = model.full_iteration()?;
                return Ok(StrategyOutcome {
                    score: Some(result.score),
                    detail: RunDetail::Basic { rows: 0 },
                });
            }
            Some(table) => table,
        };

        table.validate(model.registry())?;
        info!(model = %model.instance_id(), rows = table.rows.len(), "Replaying input rows");

        let mut score = None;
        let mut rows = 0;
        for index in 0..table.rows.len() {
            if model.stop_requested() {
                warn!(row = index, "Stopping input replay");
                break;
            }
            table.apply(index, model.registry_mut())?;
            let result = model.full_iteration()?;
            model.notify(State::InputIterationComplete)?;
            score = Some(result.score);
            rows += 1;
        }

        Ok(StrategyOutcome {
            score,
            detail: RunDetail::Basic { rows },
        })
    }
}
