//! Match HTTP handlers.
//!
//! ```text
//! GET  /api/v1/matches/{matchId}
//! POST /api/v1/matches/{matchId}/request
//! POST /api/v1/matches/{matchId}/accept
//! POST /api/v1/matches/{matchId}/cancel
//! POST /api/v1/matches/{matchId}/reviews
//! ```
//!
//! Every action names the acting product in the body; the domain checks it
//! belongs to the match.

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{GetMatchResponse, MatchActionRequest, MatchActionResponse};
use crate::domain::{Error, MatchId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, MatchEnvelopeSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{missing_field_error, parse_id};

/// Request payload naming the acting product.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchActionBody {
    pub product_id: Option<String>,
}

fn parse_action(match_id: &str, body: MatchActionBody) -> Result<MatchActionRequest, Error> {
    let product_id = body.product_id.ok_or_else(|| missing_field_error("productId"))?;
    Ok(MatchActionRequest {
        match_id: parse_id(match_id, "matchId")?,
        product_id: parse_id(&product_id, "productId")?,
    })
}

/// Fetch a match with its request and review flags.
#[utoipa::path(
    get,
    path = "/api/v1/matches/{matchId}",
    params(("matchId" = String, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Match", body = MatchEnvelopeSchema),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 404, description = "Match not found", body = ErrorSchema)
    ),
    tags = ["matches"],
    operation_id = "getMatch"
)]
#[get("/matches/{match_id}")]
pub async fn get_match(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<GetMatchResponse>> {
    let match_id: MatchId = parse_id(&path.into_inner(), "matchId")?;
    let response = state.swaps_query.get_match(match_id).await?;
    Ok(web::Json(response))
}

/// Ask the counterpart to swap.
#[utoipa::path(
    post,
    path = "/api/v1/matches/{matchId}/request",
    params(("matchId" = String, Path, description = "Match identifier")),
    request_body = MatchActionBody,
    responses(
        (status = 200, description = "Request recorded", body = MatchEnvelopeSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Match or product not found", body = ErrorSchema),
        (status = 409, description = "Request refused", body = ErrorSchema)
    ),
    tags = ["matches"],
    operation_id = "sendMatchRequest"
)]
#[post("/matches/{match_id}/request")]
pub async fn send_match_request(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<MatchActionBody>,
) -> ApiResult<web::Json<MatchActionResponse>> {
    let request = parse_action(&path.into_inner(), payload.into_inner())?;
    Ok(web::Json(state.swaps.send_match_request(request).await?))
}

/// Accept the counterpart's request; both products become swapped.
#[utoipa::path(
    post,
    path = "/api/v1/matches/{matchId}/accept",
    params(("matchId" = String, Path, description = "Match identifier")),
    request_body = MatchActionBody,
    responses(
        (status = 200, description = "Swap confirmed", body = MatchEnvelopeSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Match or product not found", body = ErrorSchema),
        (status = 409, description = "Accept refused", body = ErrorSchema)
    ),
    tags = ["matches"],
    operation_id = "acceptMatchRequest"
)]
#[post("/matches/{match_id}/accept")]
pub async fn accept_match_request(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<MatchActionBody>,
) -> ApiResult<web::Json<MatchActionResponse>> {
    let request = parse_action(&path.into_inner(), payload.into_inner())?;
    Ok(web::Json(state.swaps.accept_match_request(request).await?))
}

/// Withdraw the acting product's outstanding request.
#[utoipa::path(
    post,
    path = "/api/v1/matches/{matchId}/cancel",
    params(("matchId" = String, Path, description = "Match identifier")),
    request_body = MatchActionBody,
    responses(
        (status = 200, description = "Request withdrawn", body = MatchEnvelopeSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Match or product not found", body = ErrorSchema),
        (status = 409, description = "Nothing to cancel", body = ErrorSchema)
    ),
    tags = ["matches"],
    operation_id = "cancelMatchRequest"
)]
#[post("/matches/{match_id}/cancel")]
pub async fn cancel_match_request(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<MatchActionBody>,
) -> ApiResult<web::Json<MatchActionResponse>> {
    let request = parse_action(&path.into_inner(), payload.into_inner())?;
    Ok(web::Json(state.swaps.cancel_match_request(request).await?))
}

/// Review the counterpart of a confirmed swap.
#[utoipa::path(
    post,
    path = "/api/v1/matches/{matchId}/reviews",
    params(("matchId" = String, Path, description = "Match identifier")),
    request_body = MatchActionBody,
    responses(
        (status = 200, description = "Review recorded", body = MatchEnvelopeSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Match or product not found", body = ErrorSchema),
        (status = 409, description = "Review refused", body = ErrorSchema)
    ),
    tags = ["matches"],
    operation_id = "reviewMatch"
)]
#[post("/matches/{match_id}/reviews")]
pub async fn review_match(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<MatchActionBody>,
) -> ApiResult<web::Json<MatchActionResponse>> {
    let request = parse_action(&path.into_inner(), payload.into_inner())?;
    Ok(web::Json(state.swaps.review_match(request).await?))
}

#[cfg(test)]
#[path = "matches_tests.rs"]
mod tests;
