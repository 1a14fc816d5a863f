//! Zone-table fare calculator.
//!
//! Implements the [`FareCalculator`] driving port on top of the resolution
//! facade: one facade call per journey, batch validation up front, ordinal
//! ids assigned from input position.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::error::Error;
use crate::domain::fare::Fare;
use crate::domain::fare_resolution::FareResolutionService;
use crate::domain::journey::{FareBreakdown, Journey, JourneyFare};
use crate::domain::ports::{FareCalculator, FareRuleStore};

/// Fare calculator backed by the zone-pair rule table.
pub struct ZoneFareCalculator<S> {
    facade: Arc<FareResolutionService<S>>,
}

impl<S> ZoneFareCalculator<S> {
    /// Create a calculator over the given resolution facade.
    pub const fn new(facade: Arc<FareResolutionService<S>>) -> Self {
        Self { facade }
    }
}

#[async_trait]
impl<S> FareCalculator for ZoneFareCalculator<S>
where
    S: FareRuleStore + 'static,
{
    async fn calculate_single(&self, journey: Journey) -> Result<Fare, Error> {
        self.facade
            .resolve_fare(journey.from_zone, journey.to_zone)
            .await
    }

    async fn calculate_all(&self, journeys: Vec<Journey>) -> Result<FareBreakdown, Error> {
        // Rejects oversized batches and unknown zones before any resolution.
        self.facade.validate_batch(&journeys).await?;

        let mut items = Vec::with_capacity(journeys.len());
        let mut total = Fare::ZERO;
        for (index, journey) in journeys.iter().enumerate() {
            let fare = self
                .facade
                .resolve_fare(journey.from_zone, journey.to_zone)
                .await?;
            total = total.plus(fare);
            items.push(JourneyFare {
                from_zone: journey.from_zone,
                to_zone: journey.to_zone,
                fare,
                journey_id: index + 1,
            });
        }

        let journey_count = items.len();
        Ok(FareBreakdown {
            journeys: items,
            // Rounded once on the total, never per item.
            total_fare: total.rounded(),
            journey_count,
        })
    }
}
