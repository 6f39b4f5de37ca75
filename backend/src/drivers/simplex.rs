//! Bounded Nelder-Mead simplex search
//!
//! The simplex iterations are argmin's [`NelderMead`] solver. This module
//! only adapts an [`Evaluator`] to argmin's [`CostFunction`] and maps the
//! bounds: every vertex is clamped into the bounds before it is evaluated,
//! and the squared distance it was moved is added to its cost, so the
//! simplex is pushed back inside while the model only ever sees feasible
//! vectors.
//!
//! Argmin errors never reach callers; they surface as
//! [`ModelError::Minimiser`].
//!
//! # Example
//!
//! ```rust
//! use stock_model_core_rs::drivers::{Evaluator, Minimiser, SimplexSearch};
//! use stock_model_core_rs::{Bounds, ModelError};
//!
//! struct Bowl;
//!
//! impl Evaluator for Bowl {
//!     fn dimension(&self) -> usize {
//!         1
//!     }
//!
//!     fn evaluate(&mut self, values: &[f64]) -> Result<f64, ModelError> {
//!         Ok((values[0] - 2.0).powi(2))
//!     }
//! }
//!
//! let mut search = SimplexSearch::default();
//! let result = search
//!     .minimise(&mut Bowl, &[0.0], &[Bounds::between(-5.0, 5.0)])
//!     .unwrap();
//! assert!((result.values[0] - 2.0).abs() < 1e-3);
//! ```

use crate::addressables::Bounds;
use crate::drivers::{check_dimensions, clamp_to, natural_scale, Evaluator, Minimiser, MinimiserResult};
use crate::model::ModelError;
use argmin::core::{CostFunction, Error, Executor, State, TerminationReason};
use argmin::solver::neldermead::NelderMead;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use tracing::debug;

/// Nelder-Mead minimiser over bounded addressables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplexSearch {
    /// Edge of the starting simplex as a fraction of each dimension's range
    pub initial_step: f64,
    /// Converged once the standard deviation of the vertex scores is below this
    pub tolerance: f64,
    pub max_evaluations: usize,
}

impl Default for SimplexSearch {
    fn default() -> Self {
        Self {
            initial_step: 0.25,
            tolerance: 1e-10,
            max_evaluations: 10_000,
        }
    }
}

/// Evaluation bookkeeping shared with the cost function
struct Tracker<'e> {
    evaluator: RefCell<&'e mut dyn Evaluator>,
    max_evaluations: usize,
    evaluations: Cell<usize>,
    best: RefCell<Option<(Vec<f64>, f64)>>,
    /// Stop requested or budget spent
    halted: Cell<bool>,
    failure: RefCell<Option<ModelError>>,
}

impl Tracker<'_> {
    fn cost(&self, param: &[f64], bounds: &[Bounds]) -> Result<f64, Error> {
        let mut evaluator = self.evaluator.borrow_mut();
        if evaluator.should_stop() || self.evaluations.get() >= self.max_evaluations {
            self.halted.set(true);
            return Err(Error::msg("simplex search halted"));
        }

        let feasible: Vec<f64> = param
            .iter()
            .zip(bounds)
            .map(|(value, b)| clamp_to(*value, b))
            .collect();
        let excess: f64 = param
            .iter()
            .zip(&feasible)
            .map(|(value, inside)| (value - inside).powi(2))
            .sum();

        let score = match evaluator.evaluate(&feasible) {
            Ok(score) => score,
            Err(e) => {
                *self.failure.borrow_mut() = Some(e);
                return Err(Error::msg("evaluation failed"));
            }
        };
        self.evaluations.set(self.evaluations.get() + 1);

        let mut best = self.best.borrow_mut();
        if best.as_ref().map_or(true, |(_, current)| score < *current) {
            *best = Some((feasible, score));
        }
        Ok(score + excess)
    }
}

struct BoundedCost<'t, 'e> {
    tracker: &'t Tracker<'e>,
    bounds: &'t [Bounds],
}

impl CostFunction for BoundedCost<'_, '_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, Error> {
        self.tracker.cost(param, self.bounds)
    }
}

impl SimplexSearch {
    /// Starting simplex: the start plus one vertex per dimension
    ///
    /// Each extra vertex steps away from the start along one axis, towards
    /// the interior when a step up would cross the upper bound.
    fn simplex(&self, start: &[f64], bounds: &[Bounds]) -> Vec<Vec<f64>> {
        let mut vertices = vec![start.to_vec()];
        for (i, b) in bounds.iter().enumerate() {
            let step = natural_scale(start[i], b, self.initial_step);
            let mut vertex = start.to_vec();
            vertex[i] = if start[i] + step <= b.upper_or_inf() {
                start[i] + step
            } else {
                start[i] - step
            };
            vertices.push(vertex);
        }
        vertices
    }
}

impl Minimiser for SimplexSearch {
    fn minimise(
        &mut self,
        evaluator: &mut dyn Evaluator,
        start: &[f64],
        bounds: &[Bounds],
    ) -> Result<MinimiserResult, ModelError> {
        check_dimensions(evaluator, start, bounds).map_err(ModelError::Minimiser)?;
        if !(self.initial_step > 0.0 && self.tolerance > 0.0) {
            return Err(ModelError::Minimiser(
                "initial_step and tolerance must be positive".into(),
            ));
        }

        let start: Vec<f64> = start
            .iter()
            .zip(bounds)
            .map(|(value, b)| clamp_to(*value, b))
            .collect();

        if start.is_empty() {
            if evaluator.should_stop() {
                return Ok(MinimiserResult {
                    values: start,
                    score: f64::INFINITY,
                    evaluations: 0,
                    converged: false,
                });
            }
            let score = evaluator.evaluate(&start)?;
            return Ok(MinimiserResult {
                values: start,
                score,
                evaluations: 1,
                converged: true,
            });
        }

        let solver = NelderMead::new(self.simplex(&start, bounds))
            .with_sd_tolerance(self.tolerance)
            .map_err(|e| ModelError::Minimiser(e.to_string()))?;

        let tracker = Tracker {
            evaluator: RefCell::new(evaluator),
            max_evaluations: self.max_evaluations,
            evaluations: Cell::new(0),
            best: RefCell::new(None),
            halted: Cell::new(false),
            failure: RefCell::new(None),
        };
        let problem = BoundedCost {
            tracker: &tracker,
            bounds,
        };

        let outcome = Executor::new(problem, solver)
            .configure(|state| state.max_iters(self.max_evaluations as u64))
            .run();

        let converged = match outcome {
            Ok(result) => matches!(
                result.state().get_termination_reason(),
                Some(TerminationReason::SolverConverged)
            ),
            Err(e) => {
                if let Some(failure) = tracker.failure.take() {
                    return Err(failure);
                }
                if !tracker.halted.get() {
                    return Err(ModelError::Minimiser(e.to_string()));
                }
                false
            }
        };

        let evaluations = tracker.evaluations.get();
        let (values, score) = tracker
            .best
            .take()
            .unwrap_or((start, f64::INFINITY));

        debug!(evaluations, score, converged, "Simplex search finished");
        Ok(MinimiserResult {
            values,
            score,
            evaluations,
            converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Quadratic {
        calls: usize,
        stop_after: Option<usize>,
    }

    impl Quadratic {
        fn new() -> Self {
            Self {
                calls: 0,
                stop_after: None,
            }
        }
    }

    impl Evaluator for Quadratic {
        fn dimension(&self) -> usize {
            2
        }

        fn evaluate(&mut self, values: &[f64]) -> Result<f64, ModelError> {
            self.calls += 1;
            Ok((values[0] - 3.0).powi(2) + 2.0 * (values[1] + 1.0).powi(2))
        }

        fn should_stop(&self) -> bool {
            self.stop_after.map_or(false, |n| self.calls >= n)
        }
    }

    struct Failing;

    impl Evaluator for Failing {
        fn dimension(&self) -> usize {
            1
        }

        fn evaluate(&mut self, _values: &[f64]) -> Result<f64, ModelError> {
            Err(ModelError::Minimiser("broken model".into()))
        }
    }

    #[test]
    fn test_converges_on_convex_bowl() {
        let mut evaluator = Quadratic::new();
        let bounds = [Bounds::between(-10.0, 10.0), Bounds::between(-10.0, 10.0)];
        let result = SimplexSearch::default()
            .minimise(&mut evaluator, &[0.0, 0.0], &bounds)
            .unwrap();

        assert!(result.converged);
        assert!((result.values[0] - 3.0).abs() < 1e-3);
        assert!((result.values[1] + 1.0).abs() < 1e-3);
        assert_eq!(result.evaluations, evaluator.calls);
    }

    #[test]
    fn test_optimum_outside_bounds_stays_feasible() {
        let mut evaluator = Quadratic::new();
        let bounds = [Bounds::between(-10.0, 1.0), Bounds::between(-10.0, 10.0)];
        let result = SimplexSearch::default()
            .minimise(&mut evaluator, &[0.0, 0.0], &bounds)
            .unwrap();

        assert!(result.values[0] <= 1.0);
        assert!((result.values[0] - 1.0).abs() < 1e-3);
        assert!((result.values[1] + 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut evaluator = Quadratic::new();
        let err = SimplexSearch::default()
            .minimise(&mut evaluator, &[0.0], &[Bounds::unbounded()])
            .unwrap_err();
        assert!(matches!(err, ModelError::Minimiser(_)));
        assert_eq!(evaluator.calls, 0);
    }

    #[test]
    fn test_evaluation_budget_respected() {
        let mut evaluator = Quadratic::new();
        let mut search = SimplexSearch {
            max_evaluations: 7,
            ..SimplexSearch::default()
        };
        let bounds = [Bounds::unbounded(), Bounds::unbounded()];
        let result = search.minimise(&mut evaluator, &[0.0, 0.0], &bounds).unwrap();
        assert_eq!(result.evaluations, 7);
        assert_eq!(evaluator.calls, 7);
        assert!(!result.converged);
    }

    #[test]
    fn test_stop_checked_before_every_evaluation() {
        let mut evaluator = Quadratic::new();
        evaluator.stop_after = Some(4);
        let bounds = [Bounds::between(-10.0, 10.0), Bounds::between(-10.0, 10.0)];
        let result = SimplexSearch::default()
            .minimise(&mut evaluator, &[0.0, 0.0], &bounds)
            .unwrap();

        assert_eq!(evaluator.calls, 4);
        assert_eq!(result.evaluations, 4);
        assert!(!result.converged);
        assert!(result.score.is_finite());
    }

    #[test]
    fn test_stop_before_start_evaluates_nothing() {
        let mut evaluator = Quadratic::new();
        evaluator.stop_after = Some(0);
        let bounds = [Bounds::unbounded(), Bounds::unbounded()];
        let result = SimplexSearch::default()
            .minimise(&mut evaluator, &[20.0, 0.0], &bounds)
            .unwrap();

        assert_eq!(evaluator.calls, 0);
        assert_eq!(result.values, vec![20.0, 0.0]);
        assert_eq!(result.score, f64::INFINITY);
    }

    #[test]
    fn test_evaluator_error_propagates() {
        let err = SimplexSearch::default()
            .minimise(&mut Failing, &[0.5], &[Bounds::between(0.0, 1.0)])
            .unwrap_err();
        assert!(matches!(err, ModelError::Minimiser(reason) if reason == "broken model"));
    }
}
