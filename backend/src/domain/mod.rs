//! Domain model and services for zone-based fare resolution.
//!
//! The domain is transport and storage agnostic: adapters plug in through
//! the traits in [`ports`], and the services here never touch actix, Diesel,
//! or Redis types directly.

pub mod error;
pub mod fare;
pub mod fare_calculator;
pub mod fare_resolution;
pub mod fingerprint;
pub mod journey;
pub mod local_cache;
pub mod ports;
pub mod zone_set_cache;

#[cfg(test)]
pub(crate) mod test_clock;

pub use self::error::{Error, ErrorCode};
pub use self::fare::{Fare, FareRule, FareValidationError, Zone, ZonePair};
pub use self::fare_calculator::ZoneFareCalculator;
pub use self::fare_resolution::{FareResolutionService, MissingRulePolicy};
pub use self::fingerprint::RuleTableFingerprint;
pub use self::journey::{FareBreakdown, Journey, JourneyFare};
pub use self::local_cache::LocalFareCache;
pub use self::zone_set_cache::{ZoneSetCache, ZoneSetSnapshot};
