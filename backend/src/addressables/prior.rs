//! Priors attached to estimated addressables
//!
//! A prior scores how plausible an estimated value is. The scores of all
//! enabled addressables are added to the objective function score.

use serde::{Deserialize, Serialize};

/// Prior distribution for an estimated value
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Prior {
    /// Flat prior, contributes nothing
    #[default]
    Uniform,

    /// Normal prior parameterised by mean and standard deviation
    NormalByStdev { mu: f64, sigma: f64 },

    /// Lognormal prior parameterised by mean and coefficient of variation
    Lognormal { mu: f64, cv: f64 },

    /// Beta prior with mean `mu` and standard deviation `sigma`, rescaled
    /// onto the open interval `(a, b)`
    Beta { mu: f64, sigma: f64, a: f64, b: f64 },
}

impl Prior {
    /// Check the prior's own parameters
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Prior::Uniform => Ok(()),
            Prior::NormalByStdev { mu, .. } if !mu.is_finite() => {
                Err(format!("mu ({}) must be finite", mu))
            }
            Prior::NormalByStdev { sigma, .. } => positive("sigma", sigma),
            Prior::Lognormal { mu, cv } => {
                positive("mu", mu)?;
                positive("cv", cv)
            }
            Prior::Beta { mu, sigma, a, b } => {
                if !(a.is_finite() && b.is_finite() && a < b) {
                    return Err(format!("a ({}) must be less than b ({})", a, b));
                }
                if !(mu > a && mu < b) {
                    return Err(format!("mu ({}) must lie strictly between a and b", mu));
                }
                positive("sigma", sigma)?;
                if sigma * sigma >= (mu - a) * (b - mu) {
                    return Err(format!(
                        "sigma ({}) is too large for a beta distribution with mu ({}) on ({}, {})",
                        sigma, mu, a, b
                    ));
                }
                Ok(())
            }
        }
    }

    /// Negative log prior density, up to a constant
    ///
    /// # Example
    /// ```
    /// use stock_model_core_rs::Prior;
    ///
    /// let prior = Prior::NormalByStdev { mu: 1.0, sigma: 2.0 };
    /// assert_eq!(prior.score(1.0), 0.0);
    /// assert_eq!(prior.score(5.0), 2.0);
    /// assert_eq!(Prior::Uniform.score(42.0), 0.0);
    /// ```
    pub fn score(&self, value: f64) -> f64 {
        match *self {
            Prior::Uniform => 0.0,
            Prior::NormalByStdev { mu, sigma } => {
                let z = (value - mu) / sigma;
                0.5 * z * z
            }
            Prior::Lognormal { mu, cv } => {
                if value <= 0.0 {
                    return f64::INFINITY;
                }
                let sigma = (1.0 + cv * cv).ln().sqrt();
                let z = (value / mu).ln() / sigma + 0.5 * sigma;
                value.ln() + sigma.ln() + 0.5 * z * z
            }
            Prior::Beta { mu, sigma, a, b } => {
                if value <= a || value >= b {
                    return f64::INFINITY;
                }
                let range = b - a;
                let m = (mu - a) / range;
                let n = m * (1.0 - m) / (sigma / range).powi(2) - 1.0;
                let (alpha, beta) = (m * n, (1.0 - m) * n);
                let v = (value - a) / range;
                (1.0 - alpha) * v.ln() + (1.0 - beta) * (1.0 - v).ln()
            }
        }
    }
}

// NaN fails the comparison and is rejected with the rest
fn positive(name: &str, value: f64) -> Result<(), String> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(format!("{} ({}) must be a positive number", name, value))
    }
}
