//! Reqwest-backed Expo push adapter.
//!
//! Owns transport details only: JSON request shape, timeout and HTTP status
//! mapping, and decoding of the Expo push ticket.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{PushMessage, PushNotifier, PushNotifierError};

/// Public Expo push endpoint.
pub const DEFAULT_EXPO_ENDPOINT: &str = "https://exp.host/--/api/v2/push/send";

#[derive(Debug, Serialize)]
struct ExpoPushRequest<'a> {
    to: &'a str,
    title: &'a str,
    body: &'a str,
    sound: &'static str,
}

#[derive(Debug, Deserialize)]
struct ExpoPushResponse {
    data: Option<ExpoTicket>,
}

#[derive(Debug, Deserialize)]
struct ExpoTicket {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

/// Push notifier that posts one message per call to an Expo endpoint.
pub struct ExpoHttpNotifier {
    client: Client,
    endpoint: Url,
}

impl ExpoHttpNotifier {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl PushNotifier for ExpoHttpNotifier {
    async fn send(&self, message: &PushMessage) -> Result<(), PushNotifierError> {
        let payload = ExpoPushRequest {
            to: message.token.as_str(),
            title: message.title.as_str(),
            body: message.body.as_str(),
            sound: "default",
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        check_ticket(body.as_ref())
    }
}

/// Expo answers 200 even when it refuses a token; the ticket says so.
fn check_ticket(body: &[u8]) -> Result<(), PushNotifierError> {
    let decoded: ExpoPushResponse = serde_json::from_slice(body).map_err(|error| {
        PushNotifierError::transport(format!("invalid Expo response: {error}"))
    })?;
    match decoded.data {
        Some(ticket) if ticket.status != "ok" => Err(PushNotifierError::rejected(
            StatusCode::OK.as_u16(),
            ticket
                .message
                .unwrap_or_else(|| format!("ticket status {}", ticket.status)),
        )),
        _ => Ok(()),
    }
}

fn map_transport_error(error: reqwest::Error) -> PushNotifierError {
    if error.is_timeout() {
        PushNotifierError::timeout(error.to_string())
    } else {
        PushNotifierError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> PushNotifierError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            PushNotifierError::timeout(message)
        }
        _ if status.is_client_error() => PushNotifierError::rejected(status.as_u16(), message),
        _ => PushNotifierError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network Expo mapping helpers.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::request_timeout(StatusCode::REQUEST_TIMEOUT, "Timeout")]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, "Timeout")]
    #[case::bad_request(StatusCode::BAD_REQUEST, "Rejected")]
    #[case::rate_limited(StatusCode::TOO_MANY_REQUESTS, "Rejected")]
    #[case::server_error(StatusCode::BAD_GATEWAY, "Transport")]
    fn maps_http_statuses_to_push_errors(#[case] status: StatusCode, #[case] expected: &str) {
        let error = map_status_error(status, b"{\"errors\":[{\"code\":\"VALIDATION_ERROR\"}]}");
        match expected {
            "Timeout" => assert!(matches!(error, PushNotifierError::Timeout { .. })),
            "Rejected" => assert!(matches!(
                error,
                PushNotifierError::Rejected { status: s, .. } if s == status.as_u16()
            )),
            "Transport" => assert!(matches!(error, PushNotifierError::Transport { .. })),
            _ => panic!("unsupported test expectation: {expected}"),
        }
    }

    #[rstest]
    fn ok_ticket_is_delivered() {
        let body = br#"{"data":{"status":"ok","id":"XXXX-XXXX"}}"#;
        assert!(check_ticket(body).is_ok());
    }

    #[rstest]
    fn error_ticket_is_rejected_with_expo_message() {
        let body = br#"{"data":{"status":"error","message":"\"ExponentPushToken[x]\" is not a registered push notification recipient","details":{"error":"DeviceNotRegistered"}}}"#;

        let error = check_ticket(body).expect_err("ticket refused");
        assert!(matches!(error, PushNotifierError::Rejected { status: 200, .. }));
        assert!(error.to_string().contains("not a registered"));
    }

    #[rstest]
    fn garbage_body_is_transport_error() {
        let error = check_ticket(b"<html>").expect_err("not JSON");
        assert!(matches!(error, PushNotifierError::Transport { .. }));
    }

    #[rstest]
    fn long_bodies_are_truncated_in_previews() {
        let body = "x".repeat(400);
        let preview = body_preview(body.as_bytes());
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 163);
    }

    #[rstest]
    fn request_uses_expo_field_names() {
        let payload = ExpoPushRequest {
            to: "ExponentPushToken[abc]",
            title: "New like",
            body: "Someone liked Raincoat",
            sound: "default",
        };
        let json = serde_json::to_value(&payload).expect("serialises");
        assert_eq!(json["to"], "ExponentPushToken[abc]");
        assert_eq!(json["sound"], "default");
    }
}
