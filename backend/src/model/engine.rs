//! Model - the run-scoped aggregate
//!
//! A `Model` owns everything one run needs: the global configuration, the
//! lifecycle controller, the addressable registry, the executor arena, the
//! RNG and the derived-quantity state. Nothing is shared between models, so
//! independent models can run on separate threads.
//!
//! # Full Iteration
//!
//! ```text
//! Initialise (once per initialisation phase)
//! For each year in start_year..=last_year:
//!   1. Execute (once per time step, in time step order)
//!   2. Reset (component caches dropped, Reset executors fired)
//! IterationComplete notification
//! ```
//!
//! `last_year` is `final_year`, or `projection_final_year` while the
//! projection final phase is set.
//!
//! # Critical Invariants
//!
//! 1. Every state's work runs between `check` and `enter`: a failure leaves
//!    the controller in the state it was already in
//! 2. Subscriptions are frozen once Build completes
//! 3. `current_year` stays within `start_year..=projection_final_year`
//!
//! # Example
//!
//! ```rust
//! use stock_model_core_rs::{Model, ModelConfig, State};
//!
//! let mut model = Model::new(ModelConfig::new(2000, 2002, 1, 10));
//! model.start().unwrap();
//! let result = model.full_iteration().unwrap();
//! model.finalise().unwrap();
//!
//! assert_eq!(result.years, 3);
//! assert_eq!(model.state(), State::Finalise);
//! ```

use crate::addressables::AddressableRegistry;
use crate::core::stop::StopSignal;
use crate::core::time::YearCalendar;
use crate::executors::{
    BuildContext, Component, ExecutionContext, Executor, ExecutorId, ExecutorSubscription,
    Standalone,
};
use crate::lifecycle::LifecycleController;
use crate::model::{ModelError, ObjectiveFunction, ScoreContext};
use crate::models::{ConfigError, DerivedQuantityState, ModelConfig, RunMode, State};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Outcome of one full iteration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationResult {
    /// Zero-based index of the iteration
    pub iteration: u64,
    /// Objective plus enabled priors
    pub score: f64,
    /// Number of years executed
    pub years: u32,
    /// Last year executed
    pub last_year: u32,
}

/// Run-scoped population model
pub struct Model {
    instance_id: Uuid,
    config: ModelConfig,
    run_mode: RunMode,
    calendar: Option<YearCalendar>,
    controller: LifecycleController,
    registry: AddressableRegistry,
    executors: ExecutorSubscription,
    objective: Option<Box<dyn ObjectiveFunction>>,
    rng: RngManager,
    derived: DerivedQuantityState,
    projection_final_phase: bool,
    simulating: bool,
    iterations: u64,
    stop: StopSignal,
}

impl Model {
    /// Create a model in `StartUp` with the given configuration
    ///
    /// The configuration is not checked until [`validate`](Self::validate).
    pub fn new(config: ModelConfig) -> Self {
        let rng = RngManager::new(config.rng_seed);
        Self {
            instance_id: Uuid::new_v4(),
            config,
            run_mode: RunMode::Basic,
            calendar: None,
            controller: LifecycleController::new(),
            registry: AddressableRegistry::new(),
            executors: ExecutorSubscription::new(),
            objective: None,
            rng,
            derived: DerivedQuantityState::default(),
            projection_final_phase: false,
            simulating: false,
            iterations: 0,
            stop: StopSignal::new(),
        }
    }

    // ========================================================================
    // Setup
    // ========================================================================

    /// Add a component to the executor arena
    pub fn add_component<C: Component + 'static>(
        &mut self,
        component: C,
    ) -> Result<ExecutorId, ModelError> {
        Ok(self.executors.add(Box::new(component))?)
    }

    /// Add a plain executor with no validate/build/verify/reset hooks
    pub fn add_executor<E: Executor + 'static>(
        &mut self,
        executor: E,
    ) -> Result<ExecutorId, ModelError> {
        self.add_component(Standalone(executor))
    }

    /// Fire `id` whenever `state` is entered
    pub fn subscribe(&mut self, state: State, id: ExecutorId) -> Result<(), ModelError> {
        Ok(self.executors.subscribe(state, id)?)
    }

    pub fn set_objective<O: ObjectiveFunction + 'static>(&mut self, objective: O) {
        self.objective = Some(Box::new(objective));
    }

    /// Select the run mode; only allowed before the lifecycle starts
    pub fn set_run_mode(&mut self, run_mode: RunMode) -> Result<(), ModelError> {
        if self.controller.state() != State::StartUp {
            return Err(ModelError::InvalidTransition {
                from: self.controller.state(),
                to: State::StartUp,
            });
        }
        self.run_mode = run_mode;
        Ok(())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// StartUp → Validate
    ///
    /// Checks the global configuration, then every component's own values.
    /// Re-entering Validate is a no-op.
    pub fn validate(&mut self) -> Result<(), ModelError> {
        if self.controller.state() == State::Validate {
            debug!(model = %self.instance_id, "Validate already entered");
            return Ok(());
        }
        self.controller.check(State::Validate)?;

        self.config.validate()?;
        for member in self.executors.members_mut() {
            let label = member.label().to_string();
            member
                .validate(&self.config)
                .map_err(|e| ConfigError::new(format!("{}.{}", label, e.field), e.reason))?;
        }

        self.calendar = Some(YearCalendar::new(
            self.config.start_year,
            self.config.final_year,
            self.config.projection_final_year(),
        ));
        self.dispatch(State::Validate, None, None)?;
        self.controller.enter(State::Validate);
        Ok(())
    }

    /// Validate → Build
    ///
    /// Components are built in insertion order, so a component may only
    /// reference addressables registered by components added before it.
    /// Subscriptions are frozen once Build completes.
    pub fn build(&mut self) -> Result<(), ModelError> {
        if self.controller.state() == State::Build {
            debug!(model = %self.instance_id, "Build already entered");
            return Ok(());
        }
        self.controller.check(State::Build)?;

        let labels = self.executors.labels();
        for member in self.executors.members_mut() {
            let owner = member.label().to_string();
            let mut ctx = BuildContext::new(&self.config, &mut self.registry, &labels, &owner);
            member.build(&mut ctx)?;
        }

        self.dispatch(State::Build, None, None)?;
        self.executors.freeze();
        self.controller.enter(State::Build);
        debug!(
            model = %self.instance_id,
            components = self.executors.len(),
            addressables = self.registry.len(),
            "Build complete"
        );
        Ok(())
    }

    /// Build → Verify
    pub fn verify(&mut self) -> Result<(), ModelError> {
        if self.controller.state() == State::Verify {
            debug!(model = %self.instance_id, "Verify already entered");
            return Ok(());
        }
        self.controller.check(State::Verify)?;

        for member in self.executors.members() {
            member
                .verify(&self.config)
                .map_err(|reason| ModelError::Verify {
                    component: member.label().to_string(),
                    reason,
                })?;
        }

        self.dispatch(State::Verify, None, None)?;
        self.controller.enter(State::Verify);
        Ok(())
    }

    /// Drive StartUp → Validate → Build → Verify
    pub fn start(&mut self) -> Result<(), ModelError> {
        info!(
            model = %self.instance_id,
            run_mode = %self.run_mode,
            start_year = self.config.start_year,
            final_year = self.config.final_year,
            "Starting model"
        );
        self.validate()?;
        self.build()?;
        self.verify()
    }

    /// Run one full iteration and score it
    ///
    /// Allowed straight after Verify or after the Reset that closed the
    /// previous iteration. On failure the controller is left in the last
    /// state successfully entered; call [`abort_iteration`](Self::abort_iteration)
    /// before trying again.
    pub fn full_iteration(&mut self) -> Result<IterationResult, ModelError> {
        self.controller.check(State::Initialise)?;
        let (first_year, last_year) = {
            let projecting = self.projection_final_phase;
            let calendar = self.calendar_mut()?;
            calendar.begin_iteration();
            (calendar.start_year(), calendar.last_year(projecting))
        };

        self.derived.clear();
        let phases = self.config.initialisation_phases.len();
        if phases == 0 {
            self.dispatch(State::Initialise, None, None)?;
        } else {
            for phase in 0..phases {
                self.dispatch(State::Initialise, None, Some(phase))?;
            }
        }
        self.controller.enter(State::Initialise);

        for year in first_year..=last_year {
            if year > first_year {
                self.calendar_mut()?.advance_year();
            }

            self.controller.check(State::Execute)?;
            for step in 0..self.config.time_steps.len() {
                self.dispatch(State::Execute, Some(step), None)?;
            }
            self.controller.enter(State::Execute);

            self.controller.check(State::Reset)?;
            for member in self.executors.members_mut() {
                member.reset();
            }
            self.dispatch(State::Reset, None, None)?;
            self.controller.enter(State::Reset);
        }

        let score = self.score()?;
        self.notify(State::IterationComplete)?;

        let result = IterationResult {
            iteration: self.iterations,
            score,
            years: last_year - first_year + 1,
            last_year,
        };
        self.iterations += 1;
        debug!(
            model = %self.instance_id,
            iteration = result.iteration,
            score = result.score,
            "Full iteration complete"
        );
        Ok(result)
    }

    /// Score the state left by the last iteration
    ///
    /// Objective plus the priors of every enabled addressable. A NaN or
    /// infinite total is reported as [`ModelError::NonFinitePenalty`].
    pub fn score(&mut self) -> Result<f64, ModelError> {
        let objective = match self.objective.as_mut() {
            Some(objective) => {
                let ctx = ScoreContext {
                    config: &self.config,
                    registry: &self.registry,
                    derived: &self.derived,
                    iteration: self.iterations,
                };
                objective.score(&ctx).map_err(ModelError::Objective)?
            }
            None => 0.0,
        };

        let total = objective + self.registry.prior_score();
        if total.is_finite() {
            Ok(total)
        } else {
            Err(ModelError::NonFinitePenalty { score: total })
        }
    }

    /// Fire a notification marker without changing state
    pub fn notify(&mut self, marker: State) -> Result<usize, ModelError> {
        if !marker.is_notification() {
            return Err(ModelError::InvalidTransition {
                from: self.controller.state(),
                to: marker,
            });
        }
        self.dispatch(marker, None, None)
    }

    /// Enter Finalise; the model accepts no further transitions
    pub fn finalise(&mut self) -> Result<(), ModelError> {
        self.controller.check(State::Finalise)?;
        self.dispatch(State::Finalise, None, None)?;
        self.controller.enter(State::Finalise);
        info!(
            model = %self.instance_id,
            run_mode = %self.run_mode,
            iterations = self.iterations,
            transitions = self.controller.transitions(),
            "Model finalised"
        );
        Ok(())
    }

    /// Abandon a failed iteration
    ///
    /// Drops component caches and moves the controller to Reset so the next
    /// full iteration starts from a consistent state.
    pub fn abort_iteration(&mut self) {
        self.controller.abort_iteration();
        for member in self.executors.members_mut() {
            member.reset();
        }
    }

    fn calendar_mut(&mut self) -> Result<&mut YearCalendar, ModelError> {
        let from = self.controller.state();
        self.calendar.as_mut().ok_or(ModelError::InvalidTransition {
            from,
            to: State::Initialise,
        })
    }

    fn dispatch(
        &mut self,
        state: State,
        time_step: Option<usize>,
        phase: Option<usize>,
    ) -> Result<usize, ModelError> {
        let year = self.current_year();
        let mut ctx = ExecutionContext {
            state,
            run_mode: self.run_mode,
            year,
            time_step: time_step
                .and_then(|i| self.config.time_steps.get(i))
                .map(String::as_str),
            time_step_index: time_step,
            initialisation_phase: phase
                .and_then(|i| self.config.initialisation_phases.get(i))
                .map(String::as_str),
            projection_final_phase: self.projection_final_phase,
            simulating: self.simulating,
            iteration: self.iterations,
            registry: &self.registry,
            derived: &mut self.derived,
            rng: &mut self.rng,
        };
        self.executors.dispatch(&mut ctx)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn state(&self) -> State {
        self.controller.state()
    }

    /// Setup states followed by the states of the latest iteration
    pub fn history(&self) -> &[State] {
        self.controller.history()
    }

    /// Transitions entered over the model's lifetime
    pub fn transitions(&self) -> u64 {
        self.controller.transitions()
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn registry(&self) -> &AddressableRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AddressableRegistry {
        &mut self.registry
    }

    pub fn derived(&self) -> &DerivedQuantityState {
        &self.derived
    }

    pub fn derived_mut(&mut self) -> &mut DerivedQuantityState {
        &mut self.derived
    }

    /// Year being executed, `start_year` before the first iteration
    pub fn current_year(&self) -> u32 {
        self.calendar
            .as_ref()
            .map_or(self.config.start_year, YearCalendar::current_year)
    }

    pub fn years(&self) -> Vec<u32> {
        self.config.years()
    }

    pub fn years_all(&self) -> Vec<u32> {
        (self.config.start_year..=self.config.projection_final_year()).collect()
    }

    /// Number of historical years
    pub fn year_spread(&self) -> u32 {
        (self.config.final_year + 1).saturating_sub(self.config.start_year)
    }

    pub fn age_spread(&self) -> u32 {
        self.config.age_spread()
    }

    pub fn projection_final_phase(&self) -> bool {
        self.projection_final_phase
    }

    /// Extend iterations to `projection_final_year`
    pub fn set_projection_final_phase(&mut self, projecting: bool) {
        self.projection_final_phase = projecting;
    }

    pub fn simulating(&self) -> bool {
        self.simulating
    }

    /// Ask observation executors to add stochastic error
    pub fn set_simulating(&mut self, simulating: bool) {
        self.simulating = simulating;
    }

    pub fn rng(&self) -> &RngManager {
        &self.rng
    }

    /// Replace the model RNG
    pub fn set_rng(&mut self, rng: RngManager) {
        self.rng = rng;
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Share an externally owned stop signal
    pub fn set_stop_signal(&mut self, stop: StopSignal) {
        self.stop = stop;
    }

    /// Whether cancellation has been requested
    pub fn stop_requested(&self) -> bool {
        self.stop.is_raised()
    }

    /// Number of full iterations completed
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// SHA-256 fingerprint of the configuration
    pub fn fingerprint(&self) -> Result<String, ModelError> {
        Ok(self.config.fingerprint()?)
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("instance_id", &self.instance_id)
            .field("run_mode", &self.run_mode)
            .field("state", &self.controller.state())
            .field("registry", &self.registry)
            .field("executors", &self.executors)
            .field("iterations", &self.iterations)
            .finish()
    }
}
