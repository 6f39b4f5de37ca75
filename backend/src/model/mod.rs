//! The model aggregate and its error type

pub mod engine;
pub mod error;
pub mod objective;

pub use engine::{IterationResult, Model};
pub use error::ModelError;
pub use objective::{ObjectiveFunction, ScoreContext};
