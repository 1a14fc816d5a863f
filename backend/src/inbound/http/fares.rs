//! Fare calculation API handlers.
//!
//! ```text
//! POST /api/v1/calculate-fares {"journeys":[{"fromZone":1,"toZone":2}]}
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::journey::{FareBreakdown, Journey};
use crate::domain::{Error, Zone};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// A single journey in a calculation request.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JourneyDto {
    /// Zone the journey starts in.
    #[schema(example = 1)]
    pub from_zone: i32,
    /// Zone the journey ends in.
    #[schema(example = 2)]
    pub to_zone: i32,
}

/// Request body for `POST /api/v1/calculate-fares`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculateFaresRequest {
    /// Journeys to price, in travel order.
    pub journeys: Vec<JourneyDto>,
}

/// One priced journey in the response, in request order.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JourneyFareDto {
    /// 1-based position of the journey in the request.
    pub journey_id: usize,
    pub from_zone: i32,
    pub to_zone: i32,
    /// Resolved fare for this journey.
    pub fare: f64,
}

/// Response body for `POST /api/v1/calculate-fares`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculateFaresResponse {
    pub journeys: Vec<JourneyFareDto>,
    /// Sum of all fares, rounded to two decimal places.
    pub total_fare: f64,
    pub journey_count: usize,
}

impl From<FareBreakdown> for CalculateFaresResponse {
    fn from(breakdown: FareBreakdown) -> Self {
        Self {
            journeys: breakdown
                .journeys
                .into_iter()
                .map(|item| JourneyFareDto {
                    journey_id: item.journey_id,
                    from_zone: item.from_zone.value(),
                    to_zone: item.to_zone.value(),
                    fare: item.fare.amount(),
                })
                .collect(),
            total_fare: breakdown.total_fare.amount(),
            journey_count: breakdown.journey_count,
        }
    }
}

/// Reject non-positive zone numbers before the domain sees them.
fn journeys_from_request(request: CalculateFaresRequest) -> Result<Vec<Journey>, Error> {
    request
        .journeys
        .into_iter()
        .enumerate()
        .map(|(index, dto)| {
            for (field, value) in [("fromZone", dto.from_zone), ("toZone", dto.to_zone)] {
                if value < 1 {
                    return Err(Error::invalid_request(format!(
                        "{field} must be a positive zone number"
                    ))
                    .with_details(json!({
                        "journeyIndex": index,
                        "field": field,
                        "value": value,
                    })));
                }
            }
            Ok(Journey::new(Zone(dto.from_zone), Zone(dto.to_zone)))
        })
        .collect()
}

/// Calculate fares for a batch of journeys.
///
/// Itemized fares come back in request order with 1-based ids; the total is
/// rounded to two decimal places. Oversized batches and unregistered zones
/// are rejected before any fare is resolved.
#[utoipa::path(
    post,
    path = "/api/v1/calculate-fares",
    request_body = CalculateFaresRequest,
    responses(
        (status = 200, description = "Itemized fares and batch total", body = CalculateFaresResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Rule store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["fares"],
    operation_id = "calculateFares"
)]
#[post("/calculate-fares")]
pub async fn calculate_fares(
    state: web::Data<HttpState>,
    payload: web::Json<CalculateFaresRequest>,
) -> ApiResult<web::Json<CalculateFaresResponse>> {
    let journeys = journeys_from_request(payload.into_inner())?;
    let breakdown = state.calculator.calculate_all(journeys).await?;
    Ok(web::Json(breakdown.into()))
}
