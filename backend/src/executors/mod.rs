//! Executors and components
//!
//! Executors are the callbacks the lifecycle fires when it enters a state.
//! Components are executors that also take part in Validate, Build, Verify
//! and Reset. The model owns every executor and component in one arena
//! ([`ExecutorSubscription`]); subscriptions refer to arena members by
//! [`ExecutorId`].
//!
//! # Executor Interface
//!
//! ```rust
//! use stock_model_core_rs::executors::{ExecutionContext, Executor, ExecutorError, ExecutorKind};
//!
//! struct YearLogger {
//!     years: Vec<u32>,
//! }
//!
//! impl Executor for YearLogger {
//!     fn label(&self) -> &str {
//!         "year_logger"
//!     }
//!
//!     fn kind(&self) -> ExecutorKind {
//!         ExecutorKind::Report
//!     }
//!
//!     fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutorError> {
//!         self.years.push(ctx.year);
//!         Ok(())
//!     }
//! }
//! ```

pub mod component;
pub mod subscription;

use crate::addressables::{AddressableError, AddressableRegistry};
use crate::models::{DerivedQuantityState, RunMode, State};
use crate::rng::RngManager;
use thiserror::Error;

pub use component::{BuildContext, Component, Standalone};
pub use subscription::{ExecutorId, ExecutorSubscription, SubscriptionError};

/// Failure reported by an executor
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecutorError {
    #[error("{0}")]
    Failed(String),

    #[error("{quantity} is not finite ({value})")]
    NonFinite { quantity: String, value: f64 },

    #[error(transparent)]
    Addressable(#[from] AddressableError),
}

/// Ordering group of an executor within one state
///
/// Every `Process` executor subscribed to a state fires before any `Report`
/// executor subscribed to the same state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExecutorKind {
    #[default]
    Process,
    Report,
}

/// Everything an executor can see while a state is dispatched
pub struct ExecutionContext<'a> {
    /// State being entered (or notification being fired)
    pub state: State,
    pub run_mode: RunMode,
    /// Year being executed
    pub year: u32,
    /// Time step label while executing a year
    pub time_step: Option<&'a str>,
    /// Position of `time_step` within the year
    pub time_step_index: Option<usize>,
    /// Initialisation phase label while initialising
    pub initialisation_phase: Option<&'a str>,
    /// Set while projecting past `final_year`
    pub projection_final_phase: bool,
    /// Set while generating simulated observations
    pub simulating: bool,
    /// Number of full iterations completed before this one
    pub iteration: u64,
    pub registry: &'a AddressableRegistry,
    pub derived: &'a mut DerivedQuantityState,
    pub rng: &'a mut RngManager,
}

/// Callback fired on lifecycle transitions
pub trait Executor: Send {
    /// Label used in logs and error messages
    fn label(&self) -> &str;

    fn kind(&self) -> ExecutorKind {
        ExecutorKind::Process
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutorError>;
}
