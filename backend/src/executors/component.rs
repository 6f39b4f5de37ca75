//! Plugin capability contract
//!
//! Biological components (processes, selectivities, catchabilities, ...)
//! are external to the engine. The engine only knows them through this
//! trait: it validates them, lets them register addressables and resolve
//! references during Build, verifies them, resets their caches, and fires
//! their `execute` for the states they subscribe to.

use crate::addressables::AddressableRegistry;
use crate::executors::{ExecutionContext, Executor, ExecutorError, ExecutorKind};
use crate::model::ModelError;
use crate::models::{ConfigError, ModelConfig};

/// Lifecycle hooks of a model component
///
/// Every hook has a no-op default so a component only implements what it
/// needs.
pub trait Component: Executor {
    /// Range/type check user supplied values
    fn validate(&mut self, _config: &ModelConfig) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Register addressables and resolve references to other objects
    fn build(&mut self, _ctx: &mut BuildContext<'_>) -> Result<(), ModelError> {
        Ok(())
    }

    /// Check business rules that need every object built
    fn verify(&self, _config: &ModelConfig) -> Result<(), String> {
        Ok(())
    }

    /// Drop caches that depend on time-varying values
    fn reset(&mut self) {}
}

/// What a component can reach during Build
pub struct BuildContext<'a> {
    pub config: &'a ModelConfig,
    pub registry: &'a mut AddressableRegistry,
    component_labels: &'a [String],
    owner: String,
}

impl<'a> BuildContext<'a> {
    pub(crate) fn new(
        config: &'a ModelConfig,
        registry: &'a mut AddressableRegistry,
        component_labels: &'a [String],
        owner: &str,
    ) -> Self {
        Self {
            config,
            registry,
            component_labels,
            owner: owner.to_string(),
        }
    }

    /// Whether a component with this label exists in the model
    pub fn has_component(&self, label: &str) -> bool {
        self.component_labels.iter().any(|l| l == label)
    }

    /// Fail the build unless a component with this label exists
    pub fn require_component(&self, label: &str) -> Result<(), ModelError> {
        if self.has_component(label) {
            Ok(())
        } else {
            Err(ModelError::Build {
                component: self.owner.clone(),
                reason: format!("references unknown component '{}'", label),
            })
        }
    }

    /// Fail the build unless this addressable is registered
    ///
    /// Components are built in insertion order, so the referenced
    /// addressable must belong to a component added earlier.
    pub fn require_addressable(&self, label: &str) -> Result<(), ModelError> {
        if self.registry.contains(label) {
            Ok(())
        } else {
            Err(ModelError::Build {
                component: self.owner.clone(),
                reason: format!("references unknown addressable '{}'", label),
            })
        }
    }

    /// Fail the build unless this time step is configured
    pub fn require_time_step(&self, label: &str) -> Result<usize, ModelError> {
        self.config.time_step_index(label).ok_or_else(|| ModelError::Build {
            component: self.owner.clone(),
            reason: format!("references unknown time step '{}'", label),
        })
    }
}

/// Adapter that gives a plain executor the default component hooks
pub struct Standalone<E>(pub E);

impl<E: Executor> Executor for Standalone<E> {
    fn label(&self) -> &str {
        self.0.label()
    }

    fn kind(&self) -> ExecutorKind {
        self.0.kind()
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutorError> {
        self.0.execute(ctx)
    }
}

impl<E: Executor> Component for Standalone<E> {}
