//! Journey and fare-breakdown result types.
//!
//! These are the immutable outputs of batch fare calculation. Item order and
//! ordinal ids are part of the contract: `journeys[i]` always corresponds to
//! the i-th journey of the request and carries `journey_id == i + 1`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::fare::{Fare, Zone, ZonePair};

/// A single origin/destination trip between two zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Journey {
    /// Zone the journey starts in.
    pub from_zone: Zone,
    /// Zone the journey ends in.
    pub to_zone: Zone,
}

impl Journey {
    /// Create a journey between two zones.
    #[must_use]
    pub const fn new(from_zone: Zone, to_zone: Zone) -> Self {
        Self { from_zone, to_zone }
    }

    /// Canonical pair for fare lookup; direction does not affect price.
    #[must_use]
    pub fn pair(self) -> ZonePair {
        ZonePair::new(self.from_zone, self.to_zone)
    }
}

/// A journey annotated with its resolved fare and 1-based position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct JourneyFare {
    /// Zone the journey starts in.
    pub from_zone: Zone,
    /// Zone the journey ends in.
    pub to_zone: Zone,
    /// Resolved fare for this journey.
    pub fare: Fare,
    /// Ordinal id matching the journey's position in the request (1-based).
    pub journey_id: usize,
}

/// Itemized fares plus batch summary for one calculation request.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FareBreakdown {
    /// Per-journey fares in request order.
    pub journeys: Vec<JourneyFare>,
    /// Sum of itemized fares, rounded once to two decimal places.
    pub total_fare: Fare,
    /// Number of journeys in the batch.
    pub journey_count: usize,
}
