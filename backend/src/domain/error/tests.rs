//! Tests for the domain error payload.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[rstest]
fn conflict_constructor_sets_code() {
    let err = Error::conflict("nope");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn try_with_trace_id_rejects_empty_values() {
    let result = Error::not_found("missing").try_with_trace_id("  ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyTraceId)));
}

#[rstest]
fn trace_id_is_absent_out_of_scope() {
    assert!(Error::internal("boom").trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope(expected_trace_id: String) {
    let trace_id: TraceId = expected_trace_id.parse().expect("valid uuid fixture");
    let error = TraceId::scope(trace_id, async move { Error::internal("boom") }).await;
    assert_eq!(error.trace_id(), Some(expected_trace_id.as_str()));
}

#[rstest]
#[case(ConflictReason::AlreadyAccepted, "already_accepted", "Already accepted a match request")]
#[case(
    ConflictReason::RequestAlreadyPending,
    "request_already_pending",
    "A match request is already pending"
)]
#[case(ConflictReason::AlreadyLiked, "already_liked", "Product already liked")]
fn conflict_reasons_map_to_stable_payloads(
    #[case] reason: ConflictReason,
    #[case] code: &str,
    #[case] message: &str,
) {
    let error = Error::from(reason);
    assert_eq!(error.code(), ErrorCode::Conflict);
    assert_eq!(error.message(), message);
    assert_eq!(error.detail_code(), Some(code));
}

#[rstest]
fn serialises_camel_case_payload(expected_trace_id: String) {
    let error = Error::conflict("taken")
        .with_trace_id(expected_trace_id.clone())
        .with_details(json!({ "code": "already_liked" }));

    let value = serde_json::to_value(&error).expect("serialise error");
    assert_eq!(
        value,
        json!({
            "code": "conflict",
            "message": "taken",
            "traceId": expected_trace_id,
            "details": { "code": "already_liked" },
        })
    );
}

#[rstest]
fn deserialisation_rejects_blank_messages() {
    let result: Result<Error, _> =
        serde_json::from_value(json!({ "code": "not_found", "message": " " }));
    assert!(result.is_err());
}
