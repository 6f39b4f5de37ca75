//! Model error types

use crate::addressables::AddressableError;
use crate::executors::{ExecutorError, SubscriptionError};
use crate::models::{ConfigError, RunMode, State};
use thiserror::Error;

/// Everything that can go wrong while driving a model
#[derive(Debug, Error)]
pub enum ModelError {
    /// Bad or missing user value, raised during Validate
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Unresolved cross-reference, raised during Build
    #[error("build error in '{component}': {reason}")]
    Build { component: String, reason: String },

    /// Business rule violation, raised during Verify
    #[error("verify error in '{component}': {reason}")]
    Verify { component: String, reason: String },

    #[error(transparent)]
    Addressable(#[from] AddressableError),

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),

    #[error("executor '{executor}' failed during {state}: {source}")]
    ExecutorFailure {
        executor: String,
        state: State,
        #[source]
        source: ExecutorError,
    },

    #[error("objective function failed: {0}")]
    Objective(String),

    /// Score computation produced NaN or an infinity
    #[error("score is not finite: {score}")]
    NonFinitePenalty { score: f64 },

    #[error("invalid lifecycle transition from {from} to {to}")]
    InvalidTransition { from: State, to: State },

    #[error("run mode '{0}' does not drive the model lifecycle")]
    UnsupportedRunMode(RunMode),

    #[error("minimiser failed: {0}")]
    Minimiser(String),

    #[error("mcmc sampler failed: {0}")]
    Sampler(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ModelError {
    /// Whether this error must abort the run
    ///
    /// Non-structural errors (executor failures, objective failures and
    /// non-finite scores) are per-iteration problems; estimation-class run
    /// modes turn them into a penalised score. An executor that failed
    /// because of registry misuse is still structural.
    ///
    /// # Example
    /// ```
    /// use stock_model_core_rs::{AddressableError, ModelError};
    ///
    /// assert!(!ModelError::NonFinitePenalty { score: f64::NAN }.is_structural());
    /// assert!(ModelError::from(AddressableError::UnknownAddressable("x[a].b".into())).is_structural());
    /// ```
    pub fn is_structural(&self) -> bool {
        match self {
            ModelError::ExecutorFailure { source, .. } => {
                matches!(source, ExecutorError::Addressable(_))
            }
            ModelError::Objective(_) | ModelError::NonFinitePenalty { .. } => false,
            _ => true,
        }
    }
}
