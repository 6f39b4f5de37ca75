//! Lifecycle states and run modes
//!
//! A model moves through a fixed set of lifecycle states:
//!
//! ```text
//! StartUp → Validate → Build → Verify → Initialise → Execute ⇄ Reset → Finalise
//!                                            ↑                   │
//!                                            └───────────────────┘  (next iteration)
//! ```
//!
//! `IterationComplete` and `InputIterationComplete` are notification markers:
//! executors can subscribe to them, but dispatching them never changes the
//! controller's current state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum State {
    /// Configuration is being loaded into components
    StartUp,
    /// User supplied values are range/type checked
    Validate,
    /// Relationships between objects are built and checked
    Build,
    /// Business rules are verified
    Verify,
    /// Initialisation phases produce the starting state
    Initialise,
    /// One year of time steps is executed
    Execute,
    /// A full iteration has completed
    IterationComplete,
    /// Caches depending on time-varying values are invalidated
    Reset,
    /// A full iteration driven by an input row has completed
    InputIterationComplete,
    /// The model is finished
    Finalise,
}

impl State {
    /// Every state, in declaration order
    pub const ALL: [State; 10] = [
        State::StartUp,
        State::Validate,
        State::Build,
        State::Verify,
        State::Initialise,
        State::Execute,
        State::IterationComplete,
        State::Reset,
        State::InputIterationComplete,
        State::Finalise,
    ];

    /// Whether this state is a notification marker rather than a transition
    pub fn is_notification(self) -> bool {
        matches!(self, State::IterationComplete | State::InputIterationComplete)
    }

    /// Whether the controller may move from `self` to `next`
    ///
    /// Validate, Build and Verify may be re-entered from themselves so that a
    /// repeated request is safe. Reset leads to the next year, the next
    /// iteration or the end of the run. Verify may lead straight to Finalise
    /// when a run is cancelled before its first iteration.
    ///
    /// # Example
    /// ```
    /// use stock_model_core_rs::State;
    ///
    /// assert!(State::StartUp.can_transition_to(State::Validate));
    /// assert!(State::Reset.can_transition_to(State::Execute));
    /// assert!(!State::StartUp.can_transition_to(State::Execute));
    /// ```
    pub fn can_transition_to(self, next: State) -> bool {
        use State::*;
        matches!(
            (self, next),
            (StartUp, Validate)
                | (Validate, Validate)
                | (Validate, Build)
                | (Build, Build)
                | (Build, Verify)
                | (Verify, Verify)
                | (Verify, Initialise)
                | (Verify, Finalise)
                | (Initialise, Execute)
                | (Execute, Reset)
                | (Reset, Execute)
                | (Reset, Initialise)
                | (Reset, Finalise)
        )
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::StartUp => "start_up",
            State::Validate => "validate",
            State::Build => "build",
            State::Verify => "verify",
            State::Initialise => "initialise",
            State::Execute => "execute",
            State::IterationComplete => "iteration_complete",
            State::Reset => "reset",
            State::InputIterationComplete => "input_iteration_complete",
            State::Finalise => "finalise",
        };
        f.write_str(name)
    }
}

/// Run mode selected once at start-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunMode {
    Basic,
    Estimation,
    Mcmc,
    Profiling,
    Simulation,
    Projection,
    Help,
    Version,
    Query,
    Invalid,
}

impl RunMode {
    /// Map a run-mode token to a run mode
    ///
    /// Accepts both the long names and the single-letter command line
    /// shorthands. Anything unrecognised is `Invalid`.
    ///
    /// # Example
    /// ```
    /// use stock_model_core_rs::RunMode;
    ///
    /// assert_eq!(RunMode::from_token("estimate"), RunMode::Estimation);
    /// assert_eq!(RunMode::from_token("-m"), RunMode::Mcmc);
    /// assert_eq!(RunMode::from_token("forecast"), RunMode::Invalid);
    /// ```
    pub fn from_token(token: &str) -> RunMode {
        match token.trim().trim_start_matches('-').to_ascii_lowercase().as_str() {
            "r" | "run" | "basic" => RunMode::Basic,
            "e" | "estimate" | "estimation" => RunMode::Estimation,
            "m" | "mcmc" => RunMode::Mcmc,
            "p" | "profile" | "profiling" => RunMode::Profiling,
            "s" | "simulate" | "simulation" => RunMode::Simulation,
            "f" | "project" | "projection" => RunMode::Projection,
            "h" | "help" => RunMode::Help,
            "v" | "version" => RunMode::Version,
            "q" | "query" => RunMode::Query,
            _ => RunMode::Invalid,
        }
    }

    /// Whether this mode drives the model lifecycle
    ///
    /// Help, Version, Query and Invalid are handled entirely by the driver.
    pub fn runs_lifecycle(self) -> bool {
        matches!(
            self,
            RunMode::Basic
                | RunMode::Estimation
                | RunMode::Mcmc
                | RunMode::Profiling
                | RunMode::Simulation
                | RunMode::Projection
        )
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunMode::Basic => "basic",
            RunMode::Estimation => "estimation",
            RunMode::Mcmc => "mcmc",
            RunMode::Profiling => "profiling",
            RunMode::Simulation => "simulation",
            RunMode::Projection => "projection",
            RunMode::Help => "help",
            RunMode::Version => "version",
            RunMode::Query => "query",
            RunMode::Invalid => "invalid",
        };
        f.write_str(name)
    }
}
