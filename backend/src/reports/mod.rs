//! Report executors
//!
//! Reports are `Report`-kind executors: for any state they fire after every
//! process executor. They record what they observe into a [`TraceLog`]
//! shared with the caller, so a run can be inspected after it finishes.
//!
//! # Example
//!
//! ```rust
//! use stock_model_core_rs::reports::{StateTrace, TraceLog};
//! use stock_model_core_rs::{Model, ModelConfig, State};
//!
//! let log = TraceLog::new();
//! let mut model = Model::new(ModelConfig::new(2000, 2001, 1, 5));
//! let id = model.add_executor(StateTrace::new("years", log.clone())).unwrap();
//! model.subscribe(State::Execute, id).unwrap();
//!
//! model.start().unwrap();
//! model.full_iteration().unwrap();
//!
//! let years: Vec<u32> = log.rows().iter().map(|r| r.year).collect();
//! assert_eq!(years, vec![2000, 2001]);
//! ```

use crate::executors::{ExecutionContext, Executor, ExecutorError, ExecutorKind};
use crate::models::State;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// One observation recorded by a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRow {
    /// Report that recorded the row
    pub report: String,
    pub state: State,
    pub year: u32,
    pub time_step: Option<String>,
    pub iteration: u64,
    pub projecting: bool,
    /// Observed addressable value, for value traces
    pub value: Option<f64>,
}

/// Append-only log shared between reports and their reader
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    rows: Arc<Mutex<Vec<TraceRow>>>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, row: TraceRow) -> Result<(), ExecutorError> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| ExecutorError::Failed("trace log is poisoned".into()))?;
        rows.push(row);
        Ok(())
    }

    /// Copy of every row recorded so far
    pub fn rows(&self) -> Vec<TraceRow> {
        match self.rows.lock() {
            Ok(rows) => rows.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Rows recorded for one state
    pub fn rows_for(&self, state: State) -> Vec<TraceRow> {
        self.rows().into_iter().filter(|r| r.state == state).collect()
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn row(report: &str, ctx: &ExecutionContext<'_>, value: Option<f64>) -> TraceRow {
    TraceRow {
        report: report.to_string(),
        state: ctx.state,
        year: ctx.year,
        time_step: ctx.time_step.map(str::to_string),
        iteration: ctx.iteration,
        projecting: ctx.projection_final_phase,
        value,
    }
}

/// Records every dispatch it is subscribed to
pub struct StateTrace {
    label: String,
    log: TraceLog,
}

impl StateTrace {
    pub fn new(label: impl Into<String>, log: TraceLog) -> Self {
        Self {
            label: label.into(),
            log,
        }
    }
}

impl Executor for StateTrace {
    fn label(&self) -> &str {
        &self.label
    }

    fn kind(&self) -> ExecutorKind {
        ExecutorKind::Report
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutorError> {
        self.log.push(row(&self.label, ctx, None))
    }
}

/// Records the value of one addressable at every dispatch
pub struct AddressableTrace {
    label: String,
    addressable: String,
    log: TraceLog,
}

impl AddressableTrace {
    pub fn new(label: impl Into<String>, addressable: impl Into<String>, log: TraceLog) -> Self {
        Self {
            label: label.into(),
            addressable: addressable.into(),
            log,
        }
    }
}

impl Executor for AddressableTrace {
    fn label(&self) -> &str {
        &self.label
    }

    fn kind(&self) -> ExecutorKind {
        ExecutorKind::Report
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutorError> {
        let value = ctx.registry.get(&self.addressable)?;
        self.log.push(row(&self.label, ctx, Some(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressables::{Bounds, SharedValue};
    use crate::model::Model;
    use crate::models::ModelConfig;

    #[test]
    fn test_value_trace_sees_each_time_step() {
        let mut config = ModelConfig::new(2000, 2001, 1, 5);
        config.time_steps = vec!["summer".into(), "winter".into()];

        let log = TraceLog::new();
        let mut model = Model::new(config);
        model
            .registry_mut()
            .register("process[growth].k", SharedValue::new(0.3), Bounds::unbounded())
            .unwrap();
        let id = model
            .add_executor(AddressableTrace::new("k_trace", "process[growth].k", log.clone()))
            .unwrap();
        model.subscribe(State::Execute, id).unwrap();

        model.start().unwrap();
        model.full_iteration().unwrap();

        let steps: Vec<(u32, Option<String>)> =
            log.rows().into_iter().map(|r| (r.year, r.time_step)).collect();
        assert_eq!(
            steps,
            vec![
                (2000, Some("summer".into())),
                (2000, Some("winter".into())),
                (2001, Some("summer".into())),
                (2001, Some("winter".into())),
            ]
        );
        assert!(log.rows().iter().all(|r| r.value == Some(0.3)));
    }

    #[test]
    fn test_trace_of_unknown_addressable_is_structural() {
        let log = TraceLog::new();
        let mut model = Model::new(ModelConfig::new(2000, 2000, 1, 5));
        let id = model
            .add_executor(AddressableTrace::new("missing", "process[none].x", log))
            .unwrap();
        model.subscribe(State::Execute, id).unwrap();
        model.start().unwrap();

        let err = model.full_iteration().unwrap_err();
        assert!(err.is_structural());
    }
}
