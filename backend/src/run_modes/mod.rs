//! Run-mode strategies
//!
//! A run mode decides how many full iterations a run performs and what
//! happens between them. Every strategy goes through [`run`], which drives
//! the model StartUp → Verify once, hands it to the strategy, and enters
//! Finalise exactly once afterwards (also when the run was cancelled).
//!
//! | Mode | Policy |
//! |---|---|
//! | Basic | one iteration, or one per input row |
//! | Estimation | minimiser over the enabled addressables, phase by phase |
//! | MCMC | optional point estimate, then a sampled chain |
//! | Profiling | grid sweep of one addressable, re-optimising the rest |
//! | Simulation | one reseeded iteration per candidate with `simulating` set |
//! | Projection | historical iteration, then iterations to the projection year |
//!
//! # Example
//!
//! ```rust
//! use stock_model_core_rs::run_modes::{create_strategy, run, RunOptions};
//! use stock_model_core_rs::{Model, ModelConfig, RunMode, State};
//!
//! let mut model = Model::new(ModelConfig::new(2000, 2004, 1, 10));
//! let mut strategy = create_strategy(RunMode::Basic, &RunOptions::default()).unwrap();
//! let report = run(&mut model, strategy.as_mut()).unwrap();
//!
//! assert_eq!(report.iterations, 1);
//! assert_eq!(model.state(), State::Finalise);
//! ```

pub mod basic;
pub mod estimation;
pub mod evaluator;
pub mod mcmc;
pub mod profiling;
pub mod projection;
pub mod simulation;

use crate::addressables::{AddressableError, AddressableRegistry};
use crate::drivers::{Chain, Minimiser, MinimiserResult, RandomWalkMetropolis, SimplexSearch};
use crate::model::{Model, ModelError};
use crate::models::{ConfigError, RunMode, State};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

pub use basic::BasicRun;
pub use estimation::EstimationRun;
pub use evaluator::ModelEvaluator;
pub use mcmc::McmcRun;
pub use profiling::ProfilingRun;
pub use projection::ProjectionRun;
pub use simulation::SimulationRun;

// ============================================================================
// Strategy interface
// ============================================================================

/// What a strategy produced
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutcome {
    /// Score of the state the model was left in, if one was computed
    pub score: Option<f64>,
    pub detail: RunDetail,
}

/// One run mode
pub trait RunModeStrategy {
    fn mode(&self) -> RunMode;

    /// Perform the mode's iterations on a model that has completed Verify
    fn execute(&mut self, model: &mut Model) -> Result<StrategyOutcome, ModelError>;
}

/// Drive `model` through a complete run with `strategy`
///
/// Errors before or during the strategy abort the run without entering
/// Finalise. A raised stop signal ends the strategy early and the run is
/// still finalised, with `cancelled` set on the report.
pub fn run(
    model: &mut Model,
    strategy: &mut dyn RunModeStrategy,
) -> Result<RunReport, ModelError> {
    let mode = strategy.mode();
    if !mode.runs_lifecycle() {
        return Err(ModelError::UnsupportedRunMode(mode));
    }

    model.set_run_mode(mode)?;
    model.start()?;
    let outcome = strategy.execute(model)?;

    if matches!(model.state(), State::Initialise | State::Execute) {
        model.abort_iteration();
    }
    let cancelled = model.stop_requested();
    if cancelled {
        warn!(model = %model.instance_id(), run_mode = %mode, "Run cancelled");
    }
    model.finalise()?;

    let report = RunReport {
        run_id: model.instance_id(),
        mode,
        config_fingerprint: model.fingerprint()?,
        iterations: model.iterations(),
        score: outcome.score,
        cancelled,
        detail: outcome.detail,
    };
    info!(
        model = %report.run_id,
        run_mode = %mode,
        iterations = report.iterations,
        score = ?report.score,
        "Run complete"
    );
    Ok(report)
}

/// Build the strategy for `mode` with the reference minimiser and sampler
///
/// Help, Version, Query and Invalid never reach the lifecycle and are
/// rejected with [`ModelError::UnsupportedRunMode`].
pub fn create_strategy(
    mode: RunMode,
    options: &RunOptions,
) -> Result<Box<dyn RunModeStrategy>, ModelError> {
    let strategy: Box<dyn RunModeStrategy> = match mode {
        RunMode::Basic => Box::new(BasicRun::new(options.input.clone())),
        RunMode::Estimation => Box::new(EstimationRun::new(
            Box::new(options.minimiser.clone()),
            options.max_phase,
        )),
        RunMode::Mcmc => {
            let minimiser = if options.estimate_before_mcmc {
                Some(Box::new(options.minimiser.clone()) as Box<dyn Minimiser>)
            } else {
                None
            };
            Box::new(McmcRun::new(minimiser, Box::new(options.sampler.clone())))
        }
        RunMode::Profiling => Box::new(ProfilingRun::new(
            Box::new(options.minimiser.clone()),
            options.profiles.clone(),
        )),
        RunMode::Simulation => Box::new(SimulationRun::new(options.simulation_candidates)),
        RunMode::Projection => Box::new(ProjectionRun::new(options.input.clone())),
        RunMode::Help | RunMode::Version | RunMode::Query | RunMode::Invalid => {
            return Err(ModelError::UnsupportedRunMode(mode))
        }
    };
    Ok(strategy)
}

// ============================================================================
// Options
// ============================================================================

fn default_candidates() -> usize {
    1
}

fn default_true() -> bool {
    true
}

/// Run-mode options supplied alongside the model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOptions {
    /// Addressable vectors for input-driven replay (Basic, Projection)
    #[serde(default)]
    pub input: Option<InputTable>,

    /// Number of simulation candidates
    #[serde(default = "default_candidates")]
    pub simulation_candidates: usize,

    #[serde(default)]
    pub profiles: Vec<ProfileConfig>,

    /// Start MCMC from a point estimate
    #[serde(default = "default_true")]
    pub estimate_before_mcmc: bool,

    /// Stop multi-phase estimation after this phase
    #[serde(default)]
    pub max_phase: Option<u32>,

    #[serde(default)]
    pub minimiser: SimplexSearch,

    #[serde(default)]
    pub sampler: RandomWalkMetropolis,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            input: None,
            simulation_candidates: default_candidates(),
            profiles: Vec::new(),
            estimate_before_mcmc: true,
            max_phase: None,
            minimiser: SimplexSearch::default(),
            sampler: RandomWalkMetropolis::default(),
        }
    }
}

/// Table of addressable values, one full iteration per row
///
/// # Example
/// ```
/// use stock_model_core_rs::run_modes::InputTable;
///
/// let table: InputTable = serde_json::from_str(r#"{
///     "labels": ["process[recruitment].r0"],
///     "rows": [[1000.0], [2000.0]]
/// }"#).unwrap();
/// assert_eq!(table.rows.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputTable {
    pub labels: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl InputTable {
    /// Check every label exists and every row is complete
    pub fn validate(&self, registry: &AddressableRegistry) -> Result<(), AddressableError> {
        for label in &self.labels {
            if !registry.contains(label) {
                return Err(AddressableError::UnknownAddressable(label.clone()));
            }
        }
        for row in &self.rows {
            if row.len() != self.labels.len() {
                return Err(AddressableError::VectorLengthMismatch {
                    expected: self.labels.len(),
                    actual: row.len(),
                });
            }
        }
        Ok(())
    }

    /// Write row `index` into the registry
    ///
    /// The whole row is bounds-checked before anything is written.
    pub fn apply(&self, index: usize, registry: &mut AddressableRegistry) -> Result<(), ModelError> {
        let row = self.rows.get(index).ok_or_else(|| {
            ModelError::from(AddressableError::VectorLengthMismatch {
                expected: self.rows.len(),
                actual: index,
            })
        })?;

        for (label, &value) in self.labels.iter().zip(row) {
            let bounds = registry.bounds(label)?;
            if !bounds.contains(value) {
                return Err(AddressableError::OutOfBounds {
                    label: label.clone(),
                    value,
                    lower: bounds.lower_or_inf(),
                    upper: bounds.upper_or_inf(),
                }
                .into());
            }
        }
        for (label, &value) in self.labels.iter().zip(row) {
            registry.set(label, value)?;
        }
        Ok(())
    }
}

/// One profiled addressable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub label: String,
    /// Number of grid points, endpoints included
    pub steps: usize,
    pub lower: f64,
    pub upper: f64,
}

impl ProfileConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.steps == 0 {
            return Err(ModelError::Configuration(ConfigError::new(
                format!("profile[{}].steps", self.label),
                "at least one grid point is required",
            )));
        }
        if !(self.lower.is_finite() && self.upper.is_finite()) || self.lower > self.upper {
            return Err(ModelError::Configuration(ConfigError::new(
                format!("profile[{}].lower", self.label),
                format!(
                    "grid [{}, {}] must be finite with lower <= upper",
                    self.lower, self.upper
                ),
            )));
        }
        Ok(())
    }

    /// Evenly spaced grid from `lower` to `upper`
    ///
    /// # Example
    /// ```
    /// use stock_model_core_rs::run_modes::ProfileConfig;
    ///
    /// let profile = ProfileConfig { label: "q[survey].q".into(), steps: 3, lower: 0.0, upper: 1.0 };
    /// assert_eq!(profile.grid(), vec![0.0, 0.5, 1.0]);
    /// ```
    pub fn grid(&self) -> Vec<f64> {
        if self.steps <= 1 {
            return vec![self.lower];
        }
        let width = (self.upper - self.lower) / (self.steps - 1) as f64;
        (0..self.steps)
            .map(|i| {
                if i == self.steps - 1 {
                    self.upper
                } else {
                    self.lower + width * i as f64
                }
            })
            .collect()
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Instance id of the model that ran
    pub run_id: Uuid,
    pub mode: RunMode,
    /// SHA-256 of the model configuration
    pub config_fingerprint: String,
    /// Full iterations completed
    pub iterations: u64,
    pub score: Option<f64>,
    /// Whether the stop signal ended the run early
    pub cancelled: bool,
    pub detail: RunDetail,
}

/// Per-mode part of a [`RunReport`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RunDetail {
    Basic {
        /// Input rows replayed; zero for a single configured run
        rows: usize,
    },
    Estimation {
        labels: Vec<String>,
        estimates: Vec<f64>,
        phases: Vec<PhaseResult>,
    },
    Mcmc {
        labels: Vec<String>,
        /// Chain starting point
        start: Vec<f64>,
        chain: Chain,
    },
    Profiling {
        profiles: Vec<Profile>,
    },
    Simulation {
        /// Score per candidate; `None` where the iteration failed
        scores: Vec<Option<f64>>,
    },
    Projection {
        historical_score: f64,
        runs: Vec<ProjectionResult>,
    },
}

/// Minimisation of one estimation phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase: u32,
    /// Addressables free in this phase
    pub enabled: Vec<String>,
    pub result: MinimiserResult,
}

/// Profile of one addressable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub label: String,
    pub points: Vec<ProfilePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    /// Value the profiled addressable was held at
    pub value: f64,
    /// Best score with the other addressables re-optimised
    pub score: f64,
    /// Re-optimised values of the other enabled addressables
    pub estimates: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    /// Input row this projection replayed
    pub row: Option<usize>,
    pub score: f64,
    pub last_year: u32,
}
