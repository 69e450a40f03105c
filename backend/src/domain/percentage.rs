//! Rollout percentage value type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned by [`RolloutPercentage::new`].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum PercentageValidationError {
    #[error("rollout percentage must be a finite number")]
    NotFinite,
    #[error("rollout percentage {0} is outside 0..=100")]
    OutOfRange(f64),
}

/// Share of the user population enrolled into a new segment.
///
/// # Examples
/// ```
/// use segments::domain::RolloutPercentage;
///
/// let percentage = RolloutPercentage::new(30.0).expect("in range");
/// assert_eq!(percentage.target_count(10), 3);
/// assert_eq!(percentage.target_count(3), 0);
/// assert!(RolloutPercentage::new(100.5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct RolloutPercentage(f64);

impl RolloutPercentage {
    /// Validate and wrap a percentage in `0..=100`.
    pub fn new(value: f64) -> Result<Self, PercentageValidationError> {
        if !value.is_finite() {
            return Err(PercentageValidationError::NotFinite);
        }
        if !(0.0..=100.0).contains(&value) {
            return Err(PercentageValidationError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Raw percentage value.
    pub fn get(self) -> f64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    pub fn is_full(self) -> bool {
        self.0 == 100.0
    }

    /// Number of users to enrol from a population of `population` users,
    /// rounded down.
    pub fn target_count(self, population: usize) -> usize {
        if self.is_full() {
            return population;
        }
        let target = (self.0 / 100.0 * population as f64).floor();
        // The product never exceeds `population`, so the cast cannot truncate.
        (target as usize).min(population)
    }
}

impl TryFrom<f64> for RolloutPercentage {
    type Error = PercentageValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RolloutPercentage> for f64 {
    fn from(value: RolloutPercentage) -> Self {
        value.0
    }
}

impl fmt::Display for RolloutPercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
