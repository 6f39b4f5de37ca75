//! Evaluator that scores candidate vectors with full iterations
//!
//! Each call writes the candidate into the enabled addressables, runs one
//! full iteration and returns its score. Per-iteration failures (executor
//! errors, objective errors, non-finite scores) become an infinite score
//! and the iteration is aborted so the next call starts cleanly. Structural
//! errors propagate and end the run.

use crate::drivers::Evaluator;
use crate::model::{Model, ModelError};
use tracing::{debug, warn};

/// Scores candidates against a model
pub struct ModelEvaluator<'a> {
    model: &'a mut Model,
    evaluations: usize,
    penalised: usize,
}

impl<'a> ModelEvaluator<'a> {
    pub fn new(model: &'a mut Model) -> Self {
        Self {
            model,
            evaluations: 0,
            penalised: 0,
        }
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Evaluations that failed and were scored as infinite
    pub fn penalised(&self) -> usize {
        self.penalised
    }
}

impl Evaluator for ModelEvaluator<'_> {
    fn dimension(&self) -> usize {
        self.model.registry().enabled_count()
    }

    fn evaluate(&mut self, values: &[f64]) -> Result<f64, ModelError> {
        self.model.registry_mut().set_enabled_values(values)?;
        self.evaluations += 1;

        match self.model.full_iteration() {
            Ok(result) => {
                debug!(
                    model = %self.model.instance_id(),
                    evaluation = self.evaluations,
                    score = result.score,
                    "Candidate evaluated"
                );
                Ok(result.score)
            }
            Err(e) if !e.is_structural() => {
                warn!(
                    model = %self.model.instance_id(),
                    evaluation = self.evaluations,
                    error = %e,
                    "Penalising failed evaluation"
                );
                self.penalised += 1;
                self.model.abort_iteration();
                Ok(f64::INFINITY)
            }
            Err(e) => Err(e),
        }
    }

    fn should_stop(&self) -> bool {
        self.model.stop_requested()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressables::{Bounds, SharedValue};
    use crate::executors::{ExecutionContext, Executor, ExecutorError};
    use crate::models::{ModelConfig, State};

    struct FailAbove {
        value: SharedValue,
        limit: f64,
    }

    impl Executor for FailAbove {
        fn label(&self) -> &str {
            "fail_above"
        }

        fn execute(&mut self, _ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutorError> {
            if self.value.get() > self.limit {
                Err(ExecutorError::Failed("value too large".into()))
            } else {
                Ok(())
            }
        }
    }

    fn model_with_slot() -> Model {
        let value = SharedValue::new(0.0);
        let mut model = Model::new(ModelConfig::new(2000, 2002, 1, 5));
        model
            .registry_mut()
            .register("process[test].x", value.clone(), Bounds::between(-5.0, 5.0))
            .unwrap();
        let id = model
            .add_executor(FailAbove { value, limit: 1.0 })
            .unwrap();
        model.subscribe(State::Execute, id).unwrap();
        model.start().unwrap();
        model
    }

    #[test]
    fn test_failed_iteration_penalised_and_recovers() {
        let mut model = model_with_slot();
        let mut evaluator = ModelEvaluator::new(&mut model);

        assert_eq!(evaluator.evaluate(&[3.0]).unwrap(), f64::INFINITY);
        assert_eq!(evaluator.evaluate(&[0.5]).unwrap(), 0.0);
        assert_eq!(evaluator.penalised(), 1);
        assert_eq!(evaluator.evaluations(), 2);
    }

    #[test]
    fn test_out_of_bounds_candidate_is_structural() {
        let mut model = model_with_slot();
        let mut evaluator = ModelEvaluator::new(&mut model);
        let err = evaluator.evaluate(&[9.0]).unwrap_err();
        assert!(err.is_structural());
    }
}
