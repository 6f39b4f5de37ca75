//! Domain models for the population model engine

pub mod config;
pub mod derived;
pub mod state;

// Re-exports
pub use config::{ConfigError, ModelConfig, PartitionType, WeightUnits};
pub use derived::DerivedQuantityState;
pub use state::{RunMode, State};
