//! Path and body parsing helpers for inbound HTTP adapters.

use std::str::FromStr;

use serde_json::json;

use crate::domain::Error;

/// Parse a UUID-backed identifier, naming `field` in the error details.
pub(crate) fn parse_id<T: FromStr>(value: &str, field: &'static str) -> Result<T, Error> {
    T::from_str(value.trim()).map_err(|_| {
        Error::invalid_request(format!("{field} must be a valid UUID")).with_details(json!({
            "field": field,
            "value": value,
            "code": "invalid_uuid",
        }))
    })
}

pub(crate) fn missing_field_error(field: &'static str) -> Error {
    Error::invalid_request(format!("missing required field: {field}")).with_details(json!({
        "field": field,
        "code": "missing_field",
    }))
}
