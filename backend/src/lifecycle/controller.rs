//! Lifecycle controller
//!
//! Owns the current state and the recent history of states entered. The
//! history keeps the setup states up to Verify plus the states of the
//! latest full iteration, so it stays the same size however many
//! iterations a run performs. The controller only guards and records
//! transitions; the model does the work
//! of each state between [`check`] and [`enter`], so a failure in that work
//! leaves the controller in the state it was already in.
//!
//! [`check`]: LifecycleController::check
//! [`enter`]: LifecycleController::enter

use crate::model::ModelError;
use crate::models::State;
use tracing::{debug, warn};

/// Guards and records lifecycle transitions
///
/// # Example
/// ```
/// use stock_model_core_rs::{LifecycleController, State};
///
/// let mut controller = LifecycleController::new();
/// controller.check(State::Validate).unwrap();
/// controller.enter(State::Validate);
///
/// assert!(controller.check(State::Execute).is_err());
/// assert_eq!(controller.history(), &[State::StartUp, State::Validate]);
/// ```
#[derive(Debug, Clone)]
pub struct LifecycleController {
    state: State,
    history: Vec<State>,
    /// History length once Verify was entered
    setup_len: Option<usize>,
    transitions: u64,
}

impl Default for LifecycleController {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleController {
    pub fn new() -> Self {
        Self {
            state: State::StartUp,
            history: vec![State::StartUp],
            setup_len: None,
            transitions: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> State {
        self.state
    }

    /// States entered, starting with `StartUp`
    ///
    /// Earlier iterations are dropped when a new one enters Initialise.
    pub fn history(&self) -> &[State] {
        &self.history
    }

    /// Number of transitions entered since construction
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Verify that `to` may be entered from the current state
    pub fn check(&self, to: State) -> Result<(), ModelError> {
        if self.state.can_transition_to(to) {
            Ok(())
        } else {
            Err(ModelError::InvalidTransition {
                from: self.state,
                to,
            })
        }
    }

    /// Record that `to` has been entered
    ///
    /// Call only after [`check`](Self::check) succeeded and the state's
    /// work completed.
    pub fn enter(&mut self, to: State) {
        debug!(from = %self.state, to = %to, "Lifecycle transition");
        match (to, self.setup_len) {
            (State::Initialise, Some(len)) => self.history.truncate(len),
            (State::Verify, None) => self.setup_len = Some(self.history.len() + 1),
            _ => {}
        }
        self.state = to;
        self.history.push(to);
        self.transitions += 1;
    }

    /// Abandon the iteration in progress and fall back to `Reset`
    ///
    /// Used when an evaluation fails part-way through a year so the next
    /// full iteration starts from a consistent state. A no-op before
    /// Verify has completed or after Finalise.
    pub fn abort_iteration(&mut self) {
        match self.state {
            State::Verify | State::Initialise | State::Execute => {
                warn!(from = %self.state, "Aborting iteration");
                self.enter(State::Reset);
            }
            _ => {}
        }
    }
}
