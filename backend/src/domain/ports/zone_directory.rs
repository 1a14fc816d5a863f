//! Driving port for zone membership and cache lifecycle queries.

use async_trait::async_trait;

use crate::domain::error::Error;
use crate::domain::fare::Zone;

/// Driving port answering zone-validation queries from the request layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ZoneDirectory: Send + Sync {
    /// Whether the zone is registered in the current zone set.
    ///
    /// Any integer is accepted; zero, negative, and unregistered positive
    /// values all answer `false`.
    async fn is_valid_zone(&self, zone: Zone) -> Result<bool, Error>;

    /// The registered zones in ascending order.
    async fn available_zones(&self) -> Result<Vec<Zone>, Error>;

    /// Drop every cache level so subsequent reads re-derive from the store.
    ///
    /// Called after any administrative mutation.
    async fn reload_rules(&self) -> Result<(), Error>;
}
