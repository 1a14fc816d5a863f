//! Fare rule administration handlers.
//!
//! ```text
//! GET /api/v1/fare-rules
//! PUT /api/v1/fare-rules {"fromZone":1,"toZone":2,"fare":60.0}
//! ```

use actix_web::{get, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{Error, FareRule, Zone};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// A fare rule as exposed over the API, endpoints in normalized order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FareRuleDto {
    pub from_zone: i32,
    pub to_zone: i32,
    pub fare: f64,
}

impl From<FareRule> for FareRuleDto {
    fn from(rule: FareRule) -> Self {
        Self {
            from_zone: rule.pair.lower().value(),
            to_zone: rule.pair.upper().value(),
            fare: rule.fare.amount(),
        }
    }
}

/// Response body for `GET /api/v1/fare-rules`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FareRulesResponse {
    /// Every configured rule, sorted by normalized pair.
    pub rules: Vec<FareRuleDto>,
    /// Zones referenced by at least one rule, ascending.
    pub zones: Vec<i32>,
    pub zone_count: usize,
    pub min_zone: Option<i32>,
    pub max_zone: Option<i32>,
    /// Maximum journeys accepted per calculation batch.
    pub max_journeys_per_batch: usize,
}

/// Request body for `PUT /api/v1/fare-rules`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertFareRuleRequest {
    pub from_zone: i32,
    pub to_zone: i32,
    /// Strictly positive fare amount.
    pub fare: f64,
}

fn require_positive_zone(field: &str, value: i32) -> Result<Zone, Error> {
    if value < 1 {
        return Err(
            Error::invalid_request(format!("{field} must be a positive zone number"))
                .with_details(json!({ "field": field, "value": value })),
        );
    }
    Ok(Zone(value))
}

/// Inspect the current rule table and zone inventory.
#[utoipa::path(
    get,
    path = "/api/v1/fare-rules",
    responses(
        (status = 200, description = "Current rule table", body = FareRulesResponse),
        (status = 503, description = "Rule store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["fare-rules"],
    operation_id = "listFareRules"
)]
#[get("/fare-rules")]
pub async fn list_fare_rules(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<FareRulesResponse>> {
    let rules = state.admin.list_rules().await?;
    let zones = state.directory.available_zones().await?;
    let max_journeys_per_batch = state.admin.max_journeys().await?;

    Ok(web::Json(FareRulesResponse {
        rules: rules.into_iter().map(FareRuleDto::from).collect(),
        min_zone: zones.first().map(|zone| zone.value()),
        max_zone: zones.last().map(|zone| zone.value()),
        zone_count: zones.len(),
        zones: zones.iter().map(|zone| zone.value()).collect(),
        max_journeys_per_batch,
    }))
}

/// Insert or overwrite the fare rule for a zone pair.
///
/// The rule commits durably before any cache level is touched, so a
/// concurrent reader can never refill a cache with the superseded fare.
#[utoipa::path(
    put,
    path = "/api/v1/fare-rules",
    request_body = UpsertFareRuleRequest,
    responses(
        (status = 200, description = "The committed rule", body = FareRuleDto),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Rule store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["fare-rules"],
    operation_id = "upsertFareRule"
)]
#[put("/fare-rules")]
pub async fn upsert_fare_rule(
    state: web::Data<HttpState>,
    payload: web::Json<UpsertFareRuleRequest>,
) -> ApiResult<web::Json<FareRuleDto>> {
    let request = payload.into_inner();
    let from = require_positive_zone("fromZone", request.from_zone)?;
    let to = require_positive_zone("toZone", request.to_zone)?;

    let committed = state.admin.upsert_rule(from, to, request.fare).await?;
    Ok(web::Json(committed.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::fares::calculate_fares;
    use crate::inbound::http::test_utils::fixture_state;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use serde_json::Value;

    fn scope() -> actix_web::Scope {
        web::scope("/api/v1")
            .service(list_fare_rules)
            .service(upsert_fare_rule)
            .service(calculate_fares)
    }

    #[actix_web::test]
    async fn lists_the_seeded_rule_table() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(fixture_state()))
                .service(scope()),
        )
        .await;
        let request = actix_test::TestRequest::get()
            .uri("/api/v1/fare-rules")
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value["zones"], json!([1, 2, 3]));
        assert_eq!(value["zoneCount"], json!(3));
        assert_eq!(value["minZone"], json!(1));
        assert_eq!(value["maxZone"], json!(3));
        assert_eq!(value["maxJourneysPerBatch"], json!(20));
        assert_eq!(
            value["rules"].as_array().map(Vec::len),
            Some(6),
            "six seeded rules"
        );
        assert_eq!(value["rules"][0]["fromZone"], json!(1));
        assert_eq!(value["rules"][0]["toZone"], json!(1));
        assert_eq!(value["rules"][0]["fare"], json!(40.0));
    }

    #[actix_web::test]
    async fn updated_rule_is_served_by_the_next_calculation() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(fixture_state()))
                .service(scope()),
        )
        .await;

        // Prime the caches with the old fare.
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/calculate-fares")
            .set_json(json!({ "journeys": [{ "fromZone": 1, "toZone": 2 }] }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value["totalFare"], json!(55.0));

        let request = actix_test::TestRequest::put()
            .uri("/api/v1/fare-rules")
            .set_json(json!({ "fromZone": 2, "toZone": 1, "fare": 60.0 }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let value: Value = actix_test::read_body_json(response).await;
        // Endpoints come back normalized ascending.
        assert_eq!(value["fromZone"], json!(1));
        assert_eq!(value["toZone"], json!(2));

        let request = actix_test::TestRequest::post()
            .uri("/api/v1/calculate-fares")
            .set_json(json!({ "journeys": [{ "fromZone": 1, "toZone": 2 }] }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value["totalFare"], json!(60.0));
    }

    #[actix_web::test]
    async fn rejects_rules_for_unknown_zones() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(fixture_state()))
                .service(scope()),
        )
        .await;
        let request = actix_test::TestRequest::put()
            .uri("/api/v1/fare-rules")
            .set_json(json!({ "fromZone": 1, "toZone": 9, "fare": 80.0 }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn rejects_non_positive_fares() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(fixture_state()))
                .service(scope()),
        )
        .await;
        let request = actix_test::TestRequest::put()
            .uri("/api/v1/fare-rules")
            .set_json(json!({ "fromZone": 1, "toZone": 2, "fare": 0.0 }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
