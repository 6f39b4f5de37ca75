//! Stock Model Core - Rust Engine
//!
//! Execution engine for age/length-structured population models with
//! deterministic execution.
//!
//! # Architecture
//!
//! - **core**: Year calendar and cooperative cancellation
//! - **models**: Configuration, lifecycle states, run modes, derived quantities
//! - **lifecycle**: Transition guard and history
//! - **addressables**: Label → value registry used by every run mode
//! - **executors**: Executor/component traits and the per-state arena
//! - **model**: The run-scoped `Model` aggregate
//! - **drivers**: Minimiser and MCMC sampler seams with reference drivers
//! - **run_modes**: Basic, estimation, MCMC, profiling, simulation, projection
//! - **reports**: Report executors that trace a run
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Lifecycle transitions follow the fixed transition table
//! 2. Addressable writes are bounds-checked, never clamped
//! 3. All randomness is deterministic (seeded RNG)
//! 4. No global state: independent models can run on separate threads

// Module declarations
pub mod addressables;
pub mod core;
pub mod drivers;
pub mod executors;
pub mod lifecycle;
pub mod model;
pub mod models;
pub mod reports;
pub mod rng;
pub mod run_modes;

// Re-exports for convenience
pub use addressables::{
    accessor, Accessor, AddressableError, AddressableOptions, AddressablePath,
    AddressableRegistry, Bounds, FnAccessor, Prior, SharedValue,
};
pub use core::{stop::StopSignal, time::YearCalendar};
pub use executors::{
    BuildContext, Component, ExecutionContext, Executor, ExecutorError, ExecutorId,
    ExecutorKind, ExecutorSubscription, Standalone, SubscriptionError,
};
pub use lifecycle::LifecycleController;
pub use model::{IterationResult, Model, ModelError, ObjectiveFunction, ScoreContext};
pub use models::{
    config::compute_config_hash, ConfigError, DerivedQuantityState, ModelConfig, PartitionType,
    RunMode, State, WeightUnits,
};
pub use rng::RngManager;
pub use run_modes::{create_strategy, run, RunDetail, RunModeStrategy, RunOptions, RunReport};

/// Engine version reported by the `version` run mode
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
