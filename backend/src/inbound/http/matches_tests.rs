//! Tests for match HTTP handlers.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use chrono::Utc;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{
    FixtureSwapCommand, FixtureSwapQuery, MatchPayload, MockSwapCommand, SwapCommand,
};
use crate::domain::{ConflictReason, Match, MatchSide, ProductId};

const MATCH_ID: &str = "00000000-0000-0000-0000-000000000301";
const PRODUCT_ID: &str = "00000000-0000-0000-0000-000000000101";

fn test_app(
    swaps: Arc<dyn SwapCommand>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(HttpState::new(swaps, Arc::new(FixtureSwapQuery))))
        .service(
            web::scope("/api/v1")
                .service(get_match)
                .service(send_match_request)
                .service(accept_match_request)
                .service(cancel_match_request)
                .service(review_match),
        )
}

fn requested_match(product_id: ProductId) -> MatchActionResponse {
    let mut swap_match =
        Match::propose(product_id, ProductId::random(), Utc::now()).expect("distinct products");
    swap_match
        .request(MatchSide::One)
        .expect("pending match accepts request");
    MatchActionResponse {
        swap_match: MatchPayload::from(&swap_match),
    }
}

async fn post_action(swaps: MockSwapCommand, action: &str, body: Value) -> (StatusCode, Value) {
    let app = actix_test::init_service(test_app(Arc::new(swaps))).await;
    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/matches/{MATCH_ID}/{action}"))
        .set_json(body)
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    let status = response.status();
    let body: Value = actix_test::read_body_json(response).await;
    (status, body)
}

#[actix_web::test]
async fn request_returns_match_under_match_key() {
    let mut swaps = MockSwapCommand::new();
    swaps
        .expect_send_match_request()
        .withf(|request| {
            request.match_id.to_string() == MATCH_ID && request.product_id.to_string() == PRODUCT_ID
        })
        .times(1)
        .return_once(|request| Ok(requested_match(request.product_id)));

    let (status, body) = post_action(swaps, "request", json!({ "productId": PRODUCT_ID })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["match"]["productOneIsRequested"], true);
    assert_eq!(body["match"]["state"], "requested");
}

#[rstest]
#[case::accept("accept", ConflictReason::AlreadyAccepted)]
#[case::accept_blocked("accept", ConflictReason::CancelPendingRequestFirst)]
#[case::cancel("cancel", ConflictReason::NoRequestToCancel)]
#[case::review("reviews", ConflictReason::MatchNotConfirmed)]
#[actix_web::test]
async fn refused_actions_surface_reason(#[case] action: &str, #[case] reason: ConflictReason) {
    let mut swaps = MockSwapCommand::new();
    swaps
        .expect_accept_match_request()
        .returning(move |_| Err(reason.into()));
    swaps
        .expect_cancel_match_request()
        .returning(move |_| Err(reason.into()));
    swaps
        .expect_review_match()
        .returning(move |_| Err(reason.into()));

    let (status, body) = post_action(swaps, action, json!({ "productId": PRODUCT_ID })).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], reason.message());
    assert_eq!(body["details"]["code"], reason.code());
}

#[rstest]
#[case::missing_product(json!({}), "productId")]
#[case::malformed_product(json!({ "productId": "abc" }), "productId")]
#[actix_web::test]
async fn malformed_bodies_are_rejected(#[case] body: Value, #[case] field: &str) {
    let mut swaps = MockSwapCommand::new();
    swaps.expect_send_match_request().never();

    let (status, body) = post_action(swaps, "request", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], field);
}

#[actix_web::test]
async fn unknown_match_is_not_found() {
    let app = actix_test::init_service(test_app(Arc::new(FixtureSwapCommand))).await;
    let request = actix_test::TestRequest::get()
        .uri(&format!("/api/v1/matches/{MATCH_ID}"))
        .to_request();

    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
