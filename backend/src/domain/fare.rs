//! Fare domain value types.
//!
//! Zones, normalized zone pairs, and fare amounts. The normalized pair is the
//! canonical key for every cache level and store lookup, so a journey's fare
//! is independent of travel direction.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identifier of an administrative fare zone.
///
/// Zones are small positive integers assigned by administrators. Positivity
/// is enforced at the API boundary; membership in the registered zone set is
/// checked against the zone-set cache.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct Zone(pub i32);

impl Zone {
    /// Raw zone number.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Zone {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// Canonical, direction-independent key for a pair of zones.
///
/// Construction sorts the endpoints ascending, so `(2, 1)` and `(1, 2)`
/// produce the same pair. This is the only way to build the type; the
/// `lower <= upper` invariant therefore holds everywhere.
///
/// # Examples
/// ```
/// use backend::domain::{Zone, ZonePair};
///
/// let outward = ZonePair::new(Zone(1), Zone(2));
/// let inward = ZonePair::new(Zone(2), Zone(1));
/// assert_eq!(outward, inward);
/// assert_eq!(outward.lower(), Zone(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZonePair {
    lower: Zone,
    upper: Zone,
}

impl ZonePair {
    /// Normalize two zones into their canonical ascending order.
    #[must_use]
    pub fn new(a: Zone, b: Zone) -> Self {
        if a <= b {
            Self { lower: a, upper: b }
        } else {
            Self { lower: b, upper: a }
        }
    }

    /// Smaller endpoint of the pair.
    #[must_use]
    pub const fn lower(self) -> Zone {
        self.lower
    }

    /// Larger endpoint of the pair.
    #[must_use]
    pub const fn upper(self) -> Zone {
        self.upper
    }

    /// Namespaced key used in the shared cache (`fare:{lower}:{upper}`).
    #[must_use]
    pub fn cache_key(self) -> String {
        format!("fare:{}:{}", self.lower, self.upper)
    }
}

impl fmt::Display for ZonePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lower, self.upper)
    }
}

/// Monetary fare amount.
///
/// Fares are non-negative finite numbers. [`Fare::ZERO`] doubles as the
/// "no rule found" sentinel returned by the resolution facade when the
/// missing-rule policy tolerates absent rules.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct Fare(f64);

/// Validation failures when constructing [`Fare`] or [`FareRule`] values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FareValidationError {
    /// Amount is NaN or infinite.
    #[error("fare amount must be a finite number")]
    NotFinite,
    /// Amount is negative.
    #[error("fare amount must not be negative")]
    Negative,
    /// Rule fares must be strictly positive.
    #[error("fare rules require a strictly positive amount")]
    NotPositive,
}

impl Fare {
    /// The zero fare, used as the missing-rule sentinel.
    pub const ZERO: Self = Self(0.0);

    /// Construct a fare, rejecting NaN, infinite, and negative amounts.
    pub fn new(amount: f64) -> Result<Self, FareValidationError> {
        if !amount.is_finite() {
            return Err(FareValidationError::NotFinite);
        }
        if amount < 0.0 {
            return Err(FareValidationError::Negative);
        }
        Ok(Self(amount))
    }

    /// Raw amount.
    #[must_use]
    pub const fn amount(self) -> f64 {
        self.0
    }

    /// Amount rounded to two decimal places.
    ///
    /// Applied once to batch totals, never per item, so itemized fares stay
    /// exactly as configured.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self((self.0 * 100.0).round() / 100.0)
    }

    /// Sum of this fare and another.
    #[must_use]
    pub fn plus(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl fmt::Display for Fare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// A priced route between two zones.
///
/// The rule store owns the authoritative copy; cache levels hold disposable,
/// re-derivable copies keyed by the normalized pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FareRule {
    /// Canonical zone pair the rule prices.
    pub pair: ZonePair,
    /// Fare charged for a journey between the two zones, either direction.
    pub fare: Fare,
}

impl FareRule {
    /// Build a rule from raw endpoints and a strictly positive amount.
    pub fn new(a: Zone, b: Zone, amount: f64) -> Result<Self, FareValidationError> {
        let fare = Fare::new(amount)?;
        if fare.amount() <= 0.0 {
            return Err(FareValidationError::NotPositive);
        }
        Ok(Self {
            pair: ZonePair::new(a, b),
            fare,
        })
    }
}
