//! Tests for product HTTP handlers.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use chrono::Utc;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::domain::ConflictReason;
use crate::domain::ports::{
    DeletionOutcome, FixtureSwapCommand, FixtureSwapQuery, LikePayload, MockSwapCommand,
    SwapCommand, SwapQuery,
};
use crate::domain::Like;

const PRODUCT_ID: &str = "00000000-0000-0000-0000-000000000101";
const USER_ID: &str = "00000000-0000-0000-0000-000000000201";

fn test_app(
    swaps: Arc<dyn SwapCommand>,
    swaps_query: Arc<dyn SwapQuery>,
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
        .app_data(web::Data::new(HttpState::new(swaps, swaps_query)))
        .service(
            web::scope("/api/v1")
                .service(list_product)
                .service(get_product)
                .service(delete_product)
                .service(list_product_matches)
                .service(like_product)
                .service(unlike_product),
        )
}

fn fixture_app() -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    test_app(Arc::new(FixtureSwapCommand), Arc::new(FixtureSwapQuery))
}

#[actix_web::test]
async fn list_product_returns_created_listing() {
    let app = actix_test::init_service(fixture_app()).await;
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/products")
        .set_json(json!({
            "creatorId": USER_ID,
            "title": "Denim jacket",
            "category": "outerwear",
            "minPrice": 40,
            "maxPrice": 50
        }))
        .to_request();

    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["product"]["title"], "Denim jacket");
    assert_eq!(body["product"]["creator"], USER_ID);
    assert_eq!(body["product"]["matches"], json!([]));
}

#[rstest]
#[case::missing_title(
    json!({"creatorId": USER_ID, "category": "tops", "minPrice": 1, "maxPrice": 2}),
    "title"
)]
#[case::missing_creator(
    json!({"title": "Tee", "category": "tops", "minPrice": 1, "maxPrice": 2}),
    "creatorId"
)]
#[case::bad_creator(
    json!({"creatorId": "nope", "title": "Tee", "category": "tops", "minPrice": 1, "maxPrice": 2}),
    "creatorId"
)]
#[actix_web::test]
async fn list_product_reports_offending_field(#[case] payload: Value, #[case] field: &str) {
    let app = actix_test::init_service(fixture_app()).await;
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/products")
        .set_json(payload)
        .to_request();

    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["details"]["field"], field);
}

#[actix_web::test]
async fn list_product_rejects_inverted_price_range() {
    let app = actix_test::init_service(fixture_app()).await;
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/products")
        .set_json(json!({
            "creatorId": USER_ID,
            "title": "Denim jacket",
            "category": "outerwear",
            "minPrice": 60,
            "maxPrice": 50
        }))
        .to_request();

    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn like_product_forwards_path_and_body_ids() {
    let mut swaps = MockSwapCommand::new();
    swaps
        .expect_like_product()
        .withf(|request| {
            request.product_id.to_string() == PRODUCT_ID && request.user_id.to_string() == USER_ID
        })
        .times(1)
        .return_once(|request| {
            let like = Like::new(request.product_id, request.user_id, Utc::now());
            Ok(LikeProductResponse {
                like: LikePayload::from(&like),
                matches: Vec::new(),
            })
        });
    let app = actix_test::init_service(test_app(Arc::new(swaps), Arc::new(FixtureSwapQuery))).await;
    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/products/{PRODUCT_ID}/likes"))
        .set_json(json!({ "userId": USER_ID }))
        .to_request();

    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["like"]["productId"], PRODUCT_ID);
}

#[actix_web::test]
async fn duplicate_like_is_a_conflict_with_reason_code() {
    let mut swaps = MockSwapCommand::new();
    swaps
        .expect_like_product()
        .return_once(|_| Err(ConflictReason::AlreadyLiked.into()));
    let app = actix_test::init_service(test_app(Arc::new(swaps), Arc::new(FixtureSwapQuery))).await;
    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/products/{PRODUCT_ID}/likes"))
        .set_json(json!({ "userId": USER_ID }))
        .to_request();

    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["details"]["code"], "already_liked");
}

#[actix_web::test]
async fn like_without_user_is_rejected_before_the_port() {
    let mut swaps = MockSwapCommand::new();
    swaps.expect_like_product().never();
    let app = actix_test::init_service(test_app(Arc::new(swaps), Arc::new(FixtureSwapQuery))).await;
    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/products/{PRODUCT_ID}/likes"))
        .set_json(json!({}))
        .to_request();

    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unlike_reads_both_path_segments() {
    let app = actix_test::init_service(fixture_app()).await;
    let request = actix_test::TestRequest::delete()
        .uri(&format!("/api/v1/products/{PRODUCT_ID}/likes/{USER_ID}"))
        .to_request();

    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["productId"], PRODUCT_ID);
    assert_eq!(body["userId"], USER_ID);
    assert_eq!(body["removedMatchIds"], json!([]));
}

#[rstest]
#[case::malformed("not-a-uuid", StatusCode::BAD_REQUEST)]
#[case::unknown(PRODUCT_ID, StatusCode::NOT_FOUND)]
#[actix_web::test]
async fn get_product_maps_lookup_failures(#[case] id: &str, #[case] status: StatusCode) {
    let app = actix_test::init_service(fixture_app()).await;
    let request = actix_test::TestRequest::get()
        .uri(&format!("/api/v1/products/{id}"))
        .to_request();

    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), status);
}

#[actix_web::test]
async fn delete_reports_outcome_in_snake_case() {
    let mut swaps = MockSwapCommand::new();
    swaps.expect_delete_product().return_once(|request| {
        Ok(DeleteProductResponse {
            product_id: request.product_id,
            outcome: DeletionOutcome::SoftDeleted,
            removed_match_ids: Vec::new(),
            removed_like_count: 2,
            removed_notification_count: 0,
        })
    });
    let app = actix_test::init_service(test_app(Arc::new(swaps), Arc::new(FixtureSwapQuery))).await;
    let request = actix_test::TestRequest::delete()
        .uri(&format!("/api/v1/products/{PRODUCT_ID}"))
        .to_request();

    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["outcome"], "soft_deleted");
    assert_eq!(body["removedLikeCount"], 2);
}
