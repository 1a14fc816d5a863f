//! Driving port for fare calculation.
//!
//! The HTTP adapter depends only on this narrow capability set, so any fare
//! strategy (zone table today, something else tomorrow) can sit behind it.

use async_trait::async_trait;

use crate::domain::error::Error;
use crate::domain::fare::Fare;
use crate::domain::journey::{FareBreakdown, Journey};

/// Driving port computing fares for journeys.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FareCalculator: Send + Sync {
    /// Compute the fare for one journey.
    async fn calculate_single(&self, journey: Journey) -> Result<Fare, Error>;

    /// Compute itemized fares and the batch total for an ordered sequence of
    /// journeys.
    ///
    /// Validates the batch (size limit, zone membership) before resolving any
    /// fare. Output items preserve input order and carry 1-based ordinal ids.
    async fn calculate_all(&self, journeys: Vec<Journey>) -> Result<FareBreakdown, Error>;
}
