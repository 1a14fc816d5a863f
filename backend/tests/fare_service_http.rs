//! End-to-end HTTP tests over the in-memory fixture store.
//!
//! These exercise the full inbound stack (trace middleware, handlers, error
//! mapping) against the seeded fixture rule table, without PostgreSQL or
//! Redis.

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, Error, test, web};
use mockable::{Clock, DefaultClock};
use serde_json::{Value, json};

use backend::Trace;
use backend::domain::ports::{FixtureFareRuleStore, NoopSharedFareCache};
use backend::domain::{FareResolutionService, LocalFareCache, MissingRulePolicy, ZoneSetCache};
use backend::inbound::http::fares::calculate_fares;
use backend::inbound::http::health::{HealthState, live, ready};
use backend::inbound::http::rules::{list_fare_rules, upsert_fare_rule};
use backend::inbound::http::state::HttpState;
use backend::inbound::http::zones::add_zone;

fn fixture_http_state() -> HttpState {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let facade = Arc::new(FareResolutionService::new(
        Arc::new(FixtureFareRuleStore::seeded()),
        LocalFareCache::new(chrono::Duration::seconds(3600), 1024, Arc::clone(&clock)),
        Arc::new(NoopSharedFareCache),
        ZoneSetCache::new(chrono::Duration::seconds(300), clock),
        MissingRulePolicy::ZeroFare,
    ));
    HttpState::from_facade(facade)
}

async fn spawn_app(
    health_state: web::Data<HealthState>,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = Error>
{
    test::init_service(
        App::new()
            .app_data(web::Data::new(fixture_http_state()))
            .app_data(health_state)
            .wrap(Trace)
            .service(
                web::scope("/api/v1")
                    .service(calculate_fares)
                    .service(list_fare_rules)
                    .service(upsert_fare_rule)
                    .service(add_zone),
            )
            .service(ready)
            .service(live),
    )
    .await
}

#[actix_web::test]
async fn prices_a_mixed_batch_with_a_rounded_total() {
    let app = spawn_app(web::Data::new(HealthState::new())).await;

    let request = test::TestRequest::post()
        .uri("/api/v1/calculate-fares")
        .set_json(json!({
            "journeys": [
                { "fromZone": 1, "toZone": 2 },
                { "fromZone": 2, "toZone": 3 },
                { "fromZone": 3, "toZone": 3 },
                { "fromZone": 1, "toZone": 1 },
            ]
        }))
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("trace-id"),
        "every response carries a trace id"
    );

    let value: Value = test::read_body_json(response).await;
    assert_eq!(value["totalFare"], json!(170.0));
    assert_eq!(value["journeyCount"], json!(4));
    let ids: Vec<u64> = value["journeys"]
        .as_array()
        .expect("journeys array")
        .iter()
        .map(|item| item["journeyId"].as_u64().expect("journey id"))
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
}

#[actix_web::test]
async fn rule_updates_are_visible_to_subsequent_calculations() {
    let app = spawn_app(web::Data::new(HealthState::new())).await;

    let request = test::TestRequest::put()
        .uri("/api/v1/fare-rules")
        .set_json(json!({ "fromZone": 1, "toZone": 3, "fare": 70.0 }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let request = test::TestRequest::post()
        .uri("/api/v1/calculate-fares")
        .set_json(json!({ "journeys": [{ "fromZone": 3, "toZone": 1 }] }))
        .to_request();
    let response = test::call_service(&app, request).await;
    let value: Value = test::read_body_json(response).await;
    assert_eq!(value["totalFare"], json!(70.0));
}

#[actix_web::test]
async fn zone_registration_extends_the_network() {
    let app = spawn_app(web::Data::new(HealthState::new())).await;

    let request = test::TestRequest::post()
        .uri("/api/v1/zones")
        .set_json(json!({
            "zone": 4,
            "faresToExisting": { "1": 75.0, "2": 60.0, "3": 50.0, "4": 45.0 }
        }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let request = test::TestRequest::get()
        .uri("/api/v1/fare-rules")
        .to_request();
    let response = test::call_service(&app, request).await;
    let value: Value = test::read_body_json(response).await;
    assert_eq!(value["zones"], json!([1, 2, 3, 4]));
    assert_eq!(value["maxZone"], json!(4));
    assert_eq!(value["rules"].as_array().map(Vec::len), Some(10));

    let request = test::TestRequest::post()
        .uri("/api/v1/calculate-fares")
        .set_json(json!({ "journeys": [{ "fromZone": 4, "toZone": 2 }] }))
        .to_request();
    let response = test::call_service(&app, request).await;
    let value: Value = test::read_body_json(response).await;
    assert_eq!(value["totalFare"], json!(60.0));
}

#[actix_web::test]
async fn errors_use_the_common_envelope_with_a_trace_id() {
    let app = spawn_app(web::Data::new(HealthState::new())).await;

    let request = test::TestRequest::post()
        .uri("/api/v1/calculate-fares")
        .set_json(json!({ "journeys": [{ "fromZone": 1, "toZone": 9 }] }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let value: Value = test::read_body_json(response).await;
    assert_eq!(value["code"], json!("invalid_request"));
    assert!(
        value["message"]
            .as_str()
            .is_some_and(|message| message.contains("zone 9")),
        "message names the offending zone"
    );
    assert!(
        value["traceId"].as_str().is_some(),
        "error payload carries the request trace id"
    );
}

#[actix_web::test]
async fn health_probes_reflect_readiness() {
    let health_state = web::Data::new(HealthState::new());
    let app = spawn_app(health_state.clone()).await;

    let request = test::TestRequest::get().uri("/health/live").to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let request = test::TestRequest::get().uri("/health/ready").to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    health_state.mark_ready();
    let request = test::TestRequest::get().uri("/health/ready").to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
}
