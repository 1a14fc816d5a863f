//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{FareCalculator, FareRuleAdmin, FareRuleStore, ZoneDirectory};
use crate::domain::{FareResolutionService, ZoneFareCalculator};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub calculator: Arc<dyn FareCalculator>,
    pub directory: Arc<dyn ZoneDirectory>,
    pub admin: Arc<dyn FareRuleAdmin>,
}

impl HttpState {
    /// Bundle explicit port implementations.
    pub fn new(
        calculator: Arc<dyn FareCalculator>,
        directory: Arc<dyn ZoneDirectory>,
        admin: Arc<dyn FareRuleAdmin>,
    ) -> Self {
        Self {
            calculator,
            directory,
            admin,
        }
    }

    /// Build the state from a single resolution facade, which backs all
    /// three ports.
    pub fn from_facade<S>(facade: Arc<FareResolutionService<S>>) -> Self
    where
        S: FareRuleStore + 'static,
    {
        Self {
            calculator: Arc::new(ZoneFareCalculator::new(Arc::clone(&facade))),
            directory: Arc::clone(&facade) as Arc<dyn ZoneDirectory>,
            admin: facade,
        }
    }
}
