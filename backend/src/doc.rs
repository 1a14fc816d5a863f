//! OpenAPI documentation configuration.
//!
//! Defines the [`ApiDoc`] struct which generates the OpenAPI specification
//! for the REST API: fare calculation, rule administration, zone
//! registration, and health probes. The generated document backs Swagger UI
//! in debug builds.

use utoipa::OpenApi;

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::fares::{
    CalculateFaresRequest, CalculateFaresResponse, JourneyDto, JourneyFareDto,
};
use crate::inbound::http::rules::{FareRuleDto, FareRulesResponse, UpsertFareRuleRequest};
use crate::inbound::http::zones::{AddZoneBody, AddZoneResponse};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Zone fare service API",
        description = "Zone-based transit fare calculation and rule administration."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::fares::calculate_fares,
        crate::inbound::http::rules::list_fare_rules,
        crate::inbound::http::rules::upsert_fare_rule,
        crate::inbound::http::zones::add_zone,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        JourneyDto,
        CalculateFaresRequest,
        JourneyFareDto,
        CalculateFaresResponse,
        FareRuleDto,
        FareRulesResponse,
        UpsertFareRuleRequest,
        AddZoneBody,
        AddZoneResponse,
    )),
    tags(
        (name = "fares", description = "Fare calculation for journeys"),
        (name = "fare-rules", description = "Fare rule inspection and maintenance"),
        (name = "zones", description = "Zone registration"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_endpoint() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/api/v1/calculate-fares",
            "/api/v1/fare-rules",
            "/api/v1/zones",
            "/health/ready",
            "/health/live",
        ] {
            assert!(paths.contains(&expected), "missing path: {expected}");
        }
    }

    #[test]
    fn document_serializes_to_json() {
        let json = ApiDoc::openapi().to_json().expect("serializable document");
        assert!(json.contains("CalculateFaresRequest"));
        assert!(json.contains("faresToExisting"));
    }
}
