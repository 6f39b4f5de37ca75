//! Global run configuration
//!
//! `ModelConfig` holds the global run parameters supplied by the
//! configuration loader before the lifecycle starts: year range, age range,
//! time steps, initialisation phases, partition type and length bins.
//!
//! # Critical Invariants
//!
//! 1. `final_year >= start_year`
//! 2. `max_age >= min_age`
//! 3. `projection_final_year >= final_year` when set
//! 4. Time step and initialisation phase labels are unique and non-empty
//! 5. Length-based partitions carry strictly increasing length bins

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;

/// Invalid or missing user supplied value
#[derive(Debug, Clone, Error, PartialEq)]
#[error("invalid value for '{field}': {reason}")]
pub struct ConfigError {
    pub field: String,
    pub reason: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// How the partition is structured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionType {
    #[default]
    Age,
    Length,
    Hybrid,
}

/// Base units for weights reported by the partition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnits {
    Grams,
    #[default]
    Kilograms,
    Tonnes,
}

fn default_true() -> bool {
    true
}

fn default_seed() -> u64 {
    123
}

/// Complete global run configuration
///
/// # Example
///
/// ```rust
/// use stock_model_core_rs::ModelConfig;
///
/// let config: ModelConfig = serde_json::from_str(r#"{
///     "start_year": 1990,
///     "final_year": 2010,
///     "projection_final_year": 2015,
///     "min_age": 1,
///     "max_age": 20,
///     "time_steps": ["summer", "winter"]
/// }"#).unwrap();
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.age_spread(), 20);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// First year of the historical period
    pub start_year: u32,

    /// Last year of the historical period
    pub final_year: u32,

    /// Last year executed in projection mode (defaults to `final_year`)
    #[serde(default)]
    pub projection_final_year: Option<u32>,

    pub min_age: u32,

    pub max_age: u32,

    /// Whether `max_age` is a plus-group
    #[serde(default = "default_true")]
    pub age_plus: bool,

    /// Ordered time step labels executed each year
    pub time_steps: Vec<String>,

    /// Ordered initialisation phase labels executed before the first year
    #[serde(default)]
    pub initialisation_phases: Vec<String>,

    #[serde(default)]
    pub partition_type: PartitionType,

    /// Lower edges of the length bins (length and hybrid partitions)
    #[serde(default)]
    pub length_bins: Vec<u32>,

    /// Whether the last length bin is a plus-group
    #[serde(default = "default_true")]
    pub length_plus: bool,

    /// Upper edge of the length plus-group, if bounded
    #[serde(default)]
    pub length_plus_group: Option<u32>,

    #[serde(default)]
    pub base_weight_units: WeightUnits,

    /// Seed for deterministic random number generation
    #[serde(default = "default_seed")]
    pub rng_seed: u64,
}

impl ModelConfig {
    /// Minimal configuration over a year range with a single time step
    pub fn new(start_year: u32, final_year: u32, min_age: u32, max_age: u32) -> Self {
        Self {
            start_year,
            final_year,
            projection_final_year: None,
            min_age,
            max_age,
            age_plus: true,
            time_steps: vec!["step_one".to_string()],
            initialisation_phases: Vec::new(),
            partition_type: PartitionType::Age,
            length_bins: Vec::new(),
            length_plus: true,
            length_plus_group: None,
            base_weight_units: WeightUnits::Kilograms,
            rng_seed: default_seed(),
        }
    }

    /// Validate user supplied values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.final_year < self.start_year {
            return Err(ConfigError::new(
                "final_year",
                format!(
                    "final_year ({}) cannot be less than start_year ({})",
                    self.final_year, self.start_year
                ),
            ));
        }

        if let Some(projection) = self.projection_final_year {
            if projection < self.final_year {
                return Err(ConfigError::new(
                    "projection_final_year",
                    format!(
                        "projection_final_year ({}) cannot be less than final_year ({})",
                        projection, self.final_year
                    ),
                ));
            }
        }

        if self.max_age < self.min_age {
            return Err(ConfigError::new(
                "max_age",
                format!(
                    "max_age ({}) cannot be less than min_age ({})",
                    self.max_age, self.min_age
                ),
            ));
        }

        if self.time_steps.is_empty() {
            return Err(ConfigError::new(
                "time_steps",
                "at least one time step must be defined",
            ));
        }
        check_labels("time_steps", &self.time_steps)?;
        check_labels("initialisation_phases", &self.initialisation_phases)?;

        if self.partition_type != PartitionType::Age {
            if self.length_bins.is_empty() {
                return Err(ConfigError::new(
                    "length_bins",
                    format!("{:?} partitions require length bins", self.partition_type),
                ));
            }
            if self.length_bins.windows(2).any(|w| w[0] >= w[1]) {
                return Err(ConfigError::new(
                    "length_bins",
                    "length bins must be strictly increasing",
                ));
            }
        }

        if let (Some(plus_group), Some(last)) = (self.length_plus_group, self.length_bins.last()) {
            if self.length_plus && plus_group <= *last {
                return Err(ConfigError::new(
                    "length_plus_group",
                    format!(
                        "length_plus_group ({}) must be greater than the last length bin ({})",
                        plus_group, last
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Last projection year, falling back to `final_year`
    pub fn projection_final_year(&self) -> u32 {
        self.projection_final_year.unwrap_or(self.final_year)
    }

    /// Number of age classes, 0 when the ages are inverted
    pub fn age_spread(&self) -> u32 {
        (self.max_age + 1).saturating_sub(self.min_age)
    }

    /// Historical years, `start_year..=final_year`
    pub fn years(&self) -> Vec<u32> {
        (self.start_year..=self.final_year).collect()
    }

    /// Position of a time step label within the year
    pub fn time_step_index(&self, label: &str) -> Option<usize> {
        self.time_steps.iter().position(|step| step == label)
    }

    /// SHA-256 fingerprint of this configuration
    ///
    /// Keys are sorted before hashing so the fingerprint does not depend on
    /// field order.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        compute_config_hash(self)
    }
}

fn check_labels(field: &str, labels: &[String]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for label in labels {
        if label.trim().is_empty() {
            return Err(ConfigError::new(field, "labels cannot be empty"));
        }
        if !seen.insert(label.as_str()) {
            return Err(ConfigError::new(
                field,
                format!("duplicate label '{}'", label),
            ));
        }
    }
    Ok(())
}

/// Compute a deterministic SHA-256 hash of any serialisable configuration
///
/// Uses canonical JSON with recursively sorted object keys.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, serde_json::Error> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let canonical = canonicalize(serde_json::to_value(config)?);
    let json = serde_json::to_string(&canonical)?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
