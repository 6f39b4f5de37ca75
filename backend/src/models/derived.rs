//! Per-derived-quantity scalar run state
//!
//! Derived quantities (e.g. spawning biomass) are computed by external
//! components. The model only keeps the reference points they publish:
//! `b0`, `b_initial` and whether `b0` has been initialised, each keyed by
//! the derived quantity's label.

use std::collections::HashMap;

/// Reference points keyed by derived quantity label
///
/// # Example
/// ```
/// use stock_model_core_rs::DerivedQuantityState;
///
/// let mut state = DerivedQuantityState::default();
/// assert_eq!(state.b0("ssb"), None);
/// assert!(!state.b0_initialised("ssb"));
///
/// state.set_b0("ssb", 125_000.0);
/// assert_eq!(state.b0("ssb"), Some(125_000.0));
/// assert!(state.b0_initialised("ssb"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedQuantityState {
    b0: HashMap<String, f64>,
    b_initial: HashMap<String, f64>,
    b0_initialised: HashMap<String, bool>,
}

impl DerivedQuantityState {
    pub fn b0(&self, label: &str) -> Option<f64> {
        self.b0.get(label).copied()
    }

    /// Record `b0` and mark it initialised
    pub fn set_b0(&mut self, label: &str, value: f64) {
        self.b0.insert(label.to_string(), value);
        self.b0_initialised.insert(label.to_string(), true);
    }

    pub fn b_initial(&self, label: &str) -> Option<f64> {
        self.b_initial.get(label).copied()
    }

    pub fn set_b_initial(&mut self, label: &str, value: f64) {
        self.b_initial.insert(label.to_string(), value);
    }

    pub fn b0_initialised(&self, label: &str) -> bool {
        self.b0_initialised.get(label).copied().unwrap_or(false)
    }

    pub fn set_b0_initialised(&mut self, label: &str, initialised: bool) {
        self.b0_initialised.insert(label.to_string(), initialised);
    }

    /// Forget everything; used at the start of every full iteration
    pub fn clear(&mut self) {
        self.b0.clear();
        self.b_initial.clear();
        self.b0_initialised.clear();
    }
}
