//! Executor arena and per-state subscriptions
//!
//! The arena owns every component and executor of one model. Subscriptions
//! are ordered lists of arena handles keyed by state: no de-duplication, no
//! removal, and no changes once Build has completed.

use crate::executors::{Component, ExecutionContext, ExecutorKind};
use crate::model::ModelError;
use crate::models::State;
use std::collections::HashMap;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SubscriptionError {
    #[error("executor subscriptions are frozen once build has completed")]
    Frozen,

    #[error("unknown executor handle {0}")]
    UnknownExecutor(usize),
}

/// Handle to an executor owned by the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutorId(usize);

impl ExecutorId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Arena of components plus their state subscriptions
#[derive(Default)]
pub struct ExecutorSubscription {
    members: Vec<Box<dyn Component>>,
    subscriptions: HashMap<State, Vec<ExecutorId>>,
    frozen: bool,
}

impl ExecutorSubscription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a component and return its handle
    pub fn add(&mut self, member: Box<dyn Component>) -> Result<ExecutorId, SubscriptionError> {
        if self.frozen {
            return Err(SubscriptionError::Frozen);
        }
        self.members.push(member);
        Ok(ExecutorId(self.members.len() - 1))
    }

    /// Append `id` to the subscriber list of `state`
    pub fn subscribe(&mut self, state: State, id: ExecutorId) -> Result<(), SubscriptionError> {
        if self.frozen {
            return Err(SubscriptionError::Frozen);
        }
        if id.0 >= self.members.len() {
            return Err(SubscriptionError::UnknownExecutor(id.0));
        }
        self.subscriptions.entry(state).or_default().push(id);
        Ok(())
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Labels of every member, in insertion order
    pub fn labels(&self) -> Vec<String> {
        self.members.iter().map(|m| m.label().to_string()).collect()
    }

    pub fn members(&self) -> impl Iterator<Item = &dyn Component> {
        self.members.iter().map(|m| m.as_ref())
    }

    pub fn members_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Component>> {
        self.members.iter_mut()
    }

    /// Subscribers of `state` in firing order
    ///
    /// Process executors first, then report executors; each group in
    /// subscription order.
    pub fn subscribers(&self, state: State) -> Vec<ExecutorId> {
        let mut ordered = self.subscriptions.get(&state).cloned().unwrap_or_default();
        // stable sort keeps subscription order inside each kind
        ordered.sort_by_key(|id| self.members[id.0].kind());
        ordered
    }

    /// Fire every subscriber of `ctx.state`
    ///
    /// Stops at the first failure. Returns how many executors ran.
    pub fn dispatch(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<usize, ModelError> {
        let subscribers = self.subscribers(ctx.state);
        for id in &subscribers {
            let member = &mut self.members[id.0];
            trace!(executor = member.label(), state = %ctx.state, year = ctx.year, "Dispatching");
            member
                .execute(ctx)
                .map_err(|source| ModelError::ExecutorFailure {
                    executor: member.label().to_string(),
                    state: ctx.state,
                    source,
                })?;
        }
        Ok(subscribers.len())
    }
}

impl std::fmt::Debug for ExecutorSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorSubscription")
            .field("members", &self.labels())
            .field("frozen", &self.frozen)
            .finish()
    }
}
