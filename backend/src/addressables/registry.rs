//! Addressable registry
//!
//! Maps textual parameter paths to numeric slots owned by components. The
//! registry is the single seam through which estimation, MCMC, profiling,
//! simulation and projection manipulate model state: an optimiser sees the
//! model as a flat vector of bounded doubles aligned to [`enabled`].
//!
//! # Critical Invariants
//!
//! 1. **Unique labels**: a label is registered at most once
//! 2. **Registration order**: `enabled()` and every positional vector follow
//!    registration order, call after call
//! 3. **No clamping**: out-of-bounds writes are rejected and leave the prior
//!    value untouched
//! 4. **Immediate writes**: a successful `set` reaches the owner before it
//!    returns
//! 5. **Linked values**: an addressable linked with [`link_same`] always
//!    holds its primary's value and is never estimated on its own
//!
//! [`enabled`]: AddressableRegistry::enabled
//! [`link_same`]: AddressableRegistry::link_same

use crate::addressables::binding::Accessor;
use crate::addressables::path::AddressablePath;
use crate::addressables::prior::Prior;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Errors from registry misuse
///
/// All of these indicate a configuration or programming defect and are
/// fatal to a run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AddressableError {
    #[error("addressable '{0}' is already registered")]
    DuplicateLabel(String),

    #[error("unknown addressable '{0}'")]
    UnknownAddressable(String),

    #[error("value {value} for '{label}' is outside its bounds [{lower}, {upper}]")]
    OutOfBounds {
        label: String,
        value: f64,
        lower: f64,
        upper: f64,
    },

    #[error("malformed addressable label '{label}': {reason}")]
    MalformedLabel { label: String, reason: String },

    #[error("lower bound {lower} for '{label}' exceeds upper bound {upper}")]
    InvalidBounds { label: String, lower: f64, upper: f64 },

    #[error("invalid prior for '{label}': {reason}")]
    InvalidPrior { label: String, reason: String },

    #[error("candidate vector has {actual} values but {expected} addressables are enabled")]
    VectorLengthMismatch { expected: usize, actual: usize },

    #[error("cannot link '{label}': {reason}")]
    InvalidLink { label: String, reason: String },
}

/// Optional lower/upper bounds on an addressable
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl Bounds {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(lower: f64, upper: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    pub fn at_least(lower: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
        }
    }

    /// Whether `value` lies within the bounds
    ///
    /// NaN never lies within a bound.
    ///
    /// # Example
    /// ```
    /// use stock_model_core_rs::Bounds;
    ///
    /// let bounds = Bounds::between(0.0, 1.0);
    /// assert!(bounds.contains(0.0));
    /// assert!(bounds.contains(1.0));
    /// assert!(!bounds.contains(1.5));
    /// assert!(!bounds.contains(f64::NAN));
    /// assert!(Bounds::unbounded().contains(-1e300));
    /// ```
    pub fn contains(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        self.lower.map_or(true, |lower| value >= lower)
            && self.upper.map_or(true, |upper| value <= upper)
    }

    /// Lower bound, `-inf` when absent
    pub fn lower_or_inf(&self) -> f64 {
        self.lower.unwrap_or(f64::NEG_INFINITY)
    }

    /// Upper bound, `+inf` when absent
    pub fn upper_or_inf(&self) -> f64 {
        self.upper.unwrap_or(f64::INFINITY)
    }

    /// Whether both bounds are present and finite
    pub fn is_finite(&self) -> bool {
        self.lower_or_inf().is_finite() && self.upper_or_inf().is_finite()
    }
}

/// Estimation metadata supplied at registration
///
/// # Example
/// ```
/// use stock_model_core_rs::{AddressableOptions, Bounds, Prior};
///
/// let options = AddressableOptions::bounded(0.0, 2.0)
///     .with_prior(Prior::NormalByStdev { mu: 0.2, sigma: 0.05 })
///     .in_phase(2);
/// assert!(options.enabled);
/// assert_eq!(options.phase, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AddressableOptions {
    pub bounds: Bounds,
    pub prior: Prior,
    /// Estimation phase in which this addressable is first freed (>= 1)
    pub phase: u32,
    /// Whether the addressable starts enabled for estimation
    pub enabled: bool,
    /// Held at its point estimate while an MCMC chain is sampled
    #[serde(default)]
    pub mcmc_fixed: bool,
}

impl Default for AddressableOptions {
    fn default() -> Self {
        Self {
            bounds: Bounds::unbounded(),
            prior: Prior::Uniform,
            phase: 1,
            enabled: true,
            mcmc_fixed: false,
        }
    }
}

impl AddressableOptions {
    pub fn bounded(lower: f64, upper: f64) -> Self {
        Self {
            bounds: Bounds::between(lower, upper),
            ..Self::default()
        }
    }

    /// Registered for lookup and reporting but not estimated
    pub fn fixed() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_prior(mut self, prior: Prior) -> Self {
        self.prior = prior;
        self
    }

    pub fn in_phase(mut self, phase: u32) -> Self {
        self.phase = phase.max(1);
        self
    }

    pub fn fixed_in_mcmc(mut self) -> Self {
        self.mcmc_fixed = true;
        self
    }
}

struct Entry {
    label: String,
    accessor: Box<dyn Accessor>,
    options: AddressableOptions,
    /// Index of the addressable this one follows
    primary: Option<usize>,
    followers: Vec<usize>,
}

/// Registry of every addressable in one model
///
/// # Example
/// ```
/// use stock_model_core_rs::{AddressableRegistry, Bounds, SharedValue};
///
/// let r0 = SharedValue::new(1.0e6);
/// let mut registry = AddressableRegistry::new();
/// registry
///     .register("process[recruitment].r0", r0.clone(), Bounds::between(1.0e4, 1.0e8))
///     .unwrap();
///
/// registry.set("process[recruitment].r0", 2.0e6).unwrap();
/// assert_eq!(r0.get(), 2.0e6);
/// assert!(registry.set("process[recruitment].r0", 1.0).is_err());
/// assert_eq!(registry.enabled(), vec!["process[recruitment].r0".to_string()]);
/// ```
#[derive(Default)]
pub struct AddressableRegistry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl AddressableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an addressable, enabled for estimation, with the given bounds
    pub fn register(
        &mut self,
        label: &str,
        accessor: impl Accessor + 'static,
        bounds: Bounds,
    ) -> Result<(), AddressableError> {
        self.register_with(
            label,
            accessor,
            AddressableOptions {
                bounds,
                ..AddressableOptions::default()
            },
        )
    }

    /// Register an addressable with full estimation metadata
    pub fn register_with(
        &mut self,
        label: &str,
        accessor: impl Accessor + 'static,
        options: AddressableOptions,
    ) -> Result<(), AddressableError> {
        AddressablePath::parse(label)?;

        if self.index.contains_key(label) {
            return Err(AddressableError::DuplicateLabel(label.to_string()));
        }

        let bounds = options.bounds;
        if bounds.lower_or_inf() > bounds.upper_or_inf() {
            return Err(AddressableError::InvalidBounds {
                label: label.to_string(),
                lower: bounds.lower_or_inf(),
                upper: bounds.upper_or_inf(),
            });
        }

        let initial = accessor.get();
        if !bounds.contains(initial) {
            return Err(AddressableError::OutOfBounds {
                label: label.to_string(),
                value: initial,
                lower: bounds.lower_or_inf(),
                upper: bounds.upper_or_inf(),
            });
        }

        options
            .prior
            .validate()
            .map_err(|reason| AddressableError::InvalidPrior {
                label: label.to_string(),
                reason,
            })?;

        debug!(label, enabled = options.enabled, "Registering addressable");
        self.index.insert(label.to_string(), self.entries.len());
        self.entries.push(Entry {
            label: label.to_string(),
            accessor: Box::new(accessor),
            options,
            primary: None,
            followers: Vec::new(),
        });
        Ok(())
    }

    /// Make `follower` share the value of `primary`
    ///
    /// The follower takes the primary's bounds and value, is disabled, and
    /// from then on every write to either label lands on both.
    ///
    /// # Example
    /// ```
    /// use stock_model_core_rs::{AddressableRegistry, Bounds, SharedValue};
    ///
    /// let east = SharedValue::new(0.2);
    /// let west = SharedValue::new(0.3);
    /// let mut registry = AddressableRegistry::new();
    /// registry.register("process[m].east", east.clone(), Bounds::between(0.0, 1.0)).unwrap();
    /// registry.register("process[m].west", west.clone(), Bounds::between(0.0, 1.0)).unwrap();
    /// registry.link_same("process[m].east", "process[m].west").unwrap();
    ///
    /// registry.set("process[m].east", 0.4).unwrap();
    /// assert_eq!(west.get(), 0.4);
    /// assert_eq!(registry.enabled(), vec!["process[m].east".to_string()]);
    /// ```
    pub fn link_same(&mut self, primary: &str, follower: &str) -> Result<(), AddressableError> {
        let p = self.position(primary)?;
        let f = self.position(follower)?;
        let invalid = |reason: String| AddressableError::InvalidLink {
            label: follower.to_string(),
            reason,
        };
        if p == f {
            return Err(invalid("an addressable cannot follow itself".into()));
        }
        if let Some(existing) = self.entries[p].primary {
            return Err(invalid(format!(
                "'{}' already follows '{}'",
                primary, self.entries[existing].label
            )));
        }
        if let Some(existing) = self.entries[f].primary {
            return Err(invalid(format!(
                "already follows '{}'",
                self.entries[existing].label
            )));
        }
        if !self.entries[f].followers.is_empty() {
            return Err(invalid("it has followers of its own".into()));
        }

        debug!(primary, follower, "Linking addressables");
        let bounds = self.entries[p].options.bounds;
        let value = self.entries[p].accessor.get();
        let entry = &mut self.entries[f];
        entry.primary = Some(p);
        entry.options.bounds = bounds;
        entry.options.enabled = false;
        entry.accessor.set(value);
        self.entries[p].followers.push(f);
        Ok(())
    }

    /// Labels linked to `label` with [`link_same`](Self::link_same)
    pub fn followers(&self, label: &str) -> Result<Vec<String>, AddressableError> {
        Ok(self
            .entry(label)?
            .followers
            .iter()
            .map(|&i| self.entries[i].label.clone())
            .collect())
    }

    fn position(&self, label: &str) -> Result<usize, AddressableError> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| AddressableError::UnknownAddressable(label.to_string()))
    }

    fn entry(&self, label: &str) -> Result<&Entry, AddressableError> {
        Ok(&self.entries[self.position(label)?])
    }

    fn entry_mut(&mut self, label: &str) -> Result<&mut Entry, AddressableError> {
        let i = self.position(label)?;
        Ok(&mut self.entries[i])
    }

    /// Write through to the owner and every follower
    fn write(&mut self, index: usize, value: f64) {
        let root = self.entries[index].primary.unwrap_or(index);
        self.entries[root].accessor.set(value);
        for i in self.entries[root].followers.clone() {
            self.entries[i].accessor.set(value);
        }
    }

    /// Read the current value
    pub fn get(&self, label: &str) -> Result<f64, AddressableError> {
        Ok(self.entry(label)?.accessor.get())
    }

    /// Write a value, rejecting anything outside the addressable's bounds
    pub fn set(&mut self, label: &str, value: f64) -> Result<(), AddressableError> {
        let index = self.position(label)?;
        let bounds = self.entries[index].options.bounds;
        if !bounds.contains(value) {
            return Err(AddressableError::OutOfBounds {
                label: label.to_string(),
                value,
                lower: bounds.lower_or_inf(),
                upper: bounds.upper_or_inf(),
            });
        }
        self.write(index, value);
        Ok(())
    }

    /// Write a value without the bounds check
    ///
    /// Reserved for profiling, which sweeps one addressable across a grid
    /// that may extend past its estimation bounds.
    pub fn set_unbounded(&mut self, label: &str, value: f64) -> Result<(), AddressableError> {
        let index = self.position(label)?;
        self.write(index, value);
        Ok(())
    }

    /// Enable for estimation; enabling twice is a no-op
    ///
    /// A linked follower cannot be enabled.
    pub fn enable(&mut self, label: &str) -> Result<(), AddressableError> {
        let index = self.position(label)?;
        if let Some(primary) = self.entries[index].primary {
            return Err(AddressableError::InvalidLink {
                label: label.to_string(),
                reason: format!("it follows '{}'", self.entries[primary].label),
            });
        }
        self.entries[index].options.enabled = true;
        Ok(())
    }

    /// Disable for estimation; disabling twice is a no-op
    pub fn disable(&mut self, label: &str) -> Result<(), AddressableError> {
        self.entry_mut(label)?.options.enabled = false;
        Ok(())
    }

    pub fn is_enabled(&self, label: &str) -> Result<bool, AddressableError> {
        Ok(self.entry(label)?.options.enabled)
    }

    pub fn bounds(&self, label: &str) -> Result<Bounds, AddressableError> {
        Ok(self.entry(label)?.options.bounds)
    }

    pub fn phase(&self, label: &str) -> Result<u32, AddressableError> {
        Ok(self.entry(label)?.options.phase)
    }

    pub fn is_mcmc_fixed(&self, label: &str) -> Result<bool, AddressableError> {
        Ok(self.entry(label)?.options.mcmc_fixed)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every label, in registration order
    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.label.clone()).collect()
    }

    fn enabled_entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.options.enabled)
    }

    /// Labels currently enabled for estimation, in registration order
    pub fn enabled(&self) -> Vec<String> {
        self.enabled_entries().map(|e| e.label.clone()).collect()
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled_entries().count()
    }

    /// Current values of the enabled addressables, aligned to `enabled()`
    pub fn enabled_values(&self) -> Vec<f64> {
        self.enabled_entries().map(|e| e.accessor.get()).collect()
    }

    /// Bounds of the enabled addressables, aligned to `enabled()`
    pub fn enabled_bounds(&self) -> Vec<Bounds> {
        self.enabled_entries().map(|e| e.options.bounds).collect()
    }

    /// Write a candidate vector aligned to `enabled()`
    ///
    /// Every value is checked before any is written, so a rejected vector
    /// leaves the model untouched.
    pub fn set_enabled_values(&mut self, values: &[f64]) -> Result<(), AddressableError> {
        let expected = self.enabled_count();
        if values.len() != expected {
            return Err(AddressableError::VectorLengthMismatch {
                expected,
                actual: values.len(),
            });
        }

        for (entry, &value) in self.enabled_entries().zip(values) {
            let bounds = entry.options.bounds;
            if !bounds.contains(value) {
                return Err(AddressableError::OutOfBounds {
                    label: entry.label.clone(),
                    value,
                    lower: bounds.lower_or_inf(),
                    upper: bounds.upper_or_inf(),
                });
            }
        }

        let targets: Vec<usize> = (0..self.entries.len())
            .filter(|&i| self.entries[i].options.enabled)
            .collect();
        for (index, &value) in targets.into_iter().zip(values) {
            self.write(index, value);
        }
        Ok(())
    }

    /// Sum of prior scores over the enabled addressables
    pub fn prior_score(&self) -> f64 {
        self.enabled_entries()
            .map(|e| e.options.prior.score(e.accessor.get()))
            .sum()
    }

    /// Highest estimation phase among `labels`, at least 1
    ///
    /// Unknown labels are ignored.
    pub fn max_phase(&self, labels: &[String]) -> u32 {
        labels
            .iter()
            .filter_map(|label| self.entry(label).ok())
            .map(|e| e.options.phase)
            .max()
            .unwrap_or(1)
    }

    /// Enable exactly the addressables whose phase is at most `phase`
    ///
    /// Only addressables in `candidates` are touched; everything else keeps
    /// its current flag. Returns how many are enabled afterwards.
    pub fn enable_phase(&mut self, phase: u32, candidates: &[String]) -> usize {
        for entry in self.entries.iter_mut() {
            if entry.primary.is_none() && candidates.contains(&entry.label) {
                entry.options.enabled = entry.options.phase <= phase;
            }
        }
        self.enabled_count()
    }

    /// Snapshot of every value, in registration order
    pub fn values(&self) -> Vec<(String, f64)> {
        self.entries
            .iter()
            .map(|e| (e.label.clone(), e.accessor.get()))
            .collect()
    }

    /// Write back a snapshot taken with [`values`](Self::values)
    ///
    /// Bypasses the bounds check since the snapshot came from the model.
    pub fn restore(&mut self, snapshot: &[(String, f64)]) -> Result<(), AddressableError> {
        for (label, value) in snapshot {
            self.set_unbounded(label, *value)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for AddressableRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressableRegistry")
            .field("labels", &self.labels())
            .field("enabled", &self.enabled())
            .finish()
    }
}
