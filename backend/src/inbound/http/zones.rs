//! Zone registration handlers.
//!
//! ```text
//! POST /api/v1/zones {"zone":4,"faresToExisting":{"1":75.0,"2":60.0,"3":50.0,"4":45.0}}
//! ```

use std::collections::BTreeMap;

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::ports::AddZoneRequest;
use crate::domain::{Error, Zone};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/v1/zones`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddZoneBody {
    /// The zone to register.
    #[schema(example = 4)]
    pub zone: i32,
    /// Fare from the new zone to each existing zone, keyed by zone number.
    /// Must include the new zone's own self-fare.
    pub fares_to_existing: BTreeMap<i32, f64>,
}

/// Response body for a committed zone registration.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddZoneResponse {
    pub zone: i32,
    /// Number of fare rules inserted alongside the zone.
    pub rules_added: usize,
    /// Zone count after the registration.
    pub total_zones: usize,
}

fn request_from_body(body: AddZoneBody) -> Result<AddZoneRequest, Error> {
    if body.zone < 1 {
        return Err(
            Error::invalid_request("zone must be a positive zone number")
                .with_details(json!({ "zone": body.zone })),
        );
    }
    let mut fares_to_existing = BTreeMap::new();
    for (other, amount) in body.fares_to_existing {
        if other < 1 {
            return Err(Error::invalid_request(format!(
                "fare target zone {other} is not a positive zone number"
            )));
        }
        fares_to_existing.insert(Zone(other), amount);
    }
    Ok(AddZoneRequest {
        zone: Zone(body.zone),
        fares_to_existing,
    })
}

/// Register a new zone together with fares to every existing zone.
///
/// The batch commits durably in one insert; caches are invalidated only
/// after the commit. Duplicate zones are rejected with 409.
#[utoipa::path(
    post,
    path = "/api/v1/zones",
    request_body = AddZoneBody,
    responses(
        (status = 201, description = "Zone registered", body = AddZoneResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Zone already exists", body = Error),
        (status = 503, description = "Rule store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["zones"],
    operation_id = "addZone"
)]
#[post("/zones")]
pub async fn add_zone(
    state: web::Data<HttpState>,
    payload: web::Json<AddZoneBody>,
) -> ApiResult<HttpResponse> {
    let request = request_from_body(payload.into_inner())?;
    let outcome = state.admin.add_zone(request).await?;
    Ok(HttpResponse::Created().json(AddZoneResponse {
        zone: outcome.zone.value(),
        rules_added: outcome.rules_added,
        total_zones: outcome.total_zones,
    }))
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
        web::scope("/api/v1").service(add_zone).service(calculate_fares)
    }

    #[actix_web::test]
    async fn registers_a_zone_and_prices_journeys_to_it() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(fixture_state()))
                .service(scope()),
        )
        .await;

        let request = actix_test::TestRequest::post()
            .uri("/api/v1/zones")
            .set_json(json!({
                "zone": 4,
                "faresToExisting": { "1": 75.0, "2": 60.0, "3": 50.0, "4": 45.0 }
            }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value["zone"], json!(4));
        assert_eq!(value["rulesAdded"], json!(4));
        assert_eq!(value["totalZones"], json!(4));

        let request = actix_test::TestRequest::post()
            .uri("/api/v1/calculate-fares")
            .set_json(json!({ "journeys": [{ "fromZone": 4, "toZone": 1 }] }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value["totalFare"], json!(75.0));
    }

    #[actix_web::test]
    async fn rejects_a_duplicate_zone() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(fixture_state()))
                .service(scope()),
        )
        .await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/zones")
            .set_json(json!({
                "zone": 2,
                "faresToExisting": { "1": 55.0, "2": 35.0, "3": 45.0 }
            }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn rejects_a_registration_without_the_self_fare() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(fixture_state()))
                .service(scope()),
        )
        .await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/zones")
            .set_json(json!({
                "zone": 4,
                "faresToExisting": { "1": 75.0, "2": 60.0, "3": 50.0 }
            }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn rejects_non_positive_zone_numbers() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(fixture_state()))
                .service(scope()),
        )
        .await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/zones")
            .set_json(json!({ "zone": 0, "faresToExisting": { "0": 10.0 } }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
