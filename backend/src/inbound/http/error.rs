//! Actix rendering of swap engine errors.
//!
//! Handlers return [`Error`] as is. Conflicts keep `details.code` so clients
//! can tell a duplicate like from an accepted match; internal failures reach
//! the client as a fixed message carrying only the trace id.

use std::borrow::Cow;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::{debug, error, warn};

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

pub use crate::domain::ApiResult;

const REDACTED_MESSAGE: &str = "Internal server error";

const fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Payload sent to the client for `err`.
fn client_body(err: &Error) -> Cow<'_, Error> {
    if err.code() != ErrorCode::InternalError {
        return Cow::Borrowed(err);
    }
    let body = Error::internal(REDACTED_MESSAGE);
    Cow::Owned(match err.trace_id() {
        Some(id) => body.with_trace_id(id),
        None => body,
    })
}

fn log_failure(err: &Error) {
    match err.code() {
        ErrorCode::InternalError => {
            error!(message = err.message(), trace_id = ?err.trace_id(), "swap request failed");
        }
        ErrorCode::ServiceUnavailable => {
            warn!(message = err.message(), trace_id = ?err.trace_id(), "store unavailable");
        }
        ErrorCode::Conflict => {
            debug!(reason = ?err.detail_code(), trace_id = ?err.trace_id(), "swap refused");
        }
        ErrorCode::InvalidRequest | ErrorCode::NotFound => {}
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        log_failure(self);
        let mut response = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            response.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        response.json(client_body(self).as_ref())
    }
}

/// Extractor and payload failures raised by Actix become opaque internal errors.
impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix failure outside the swap service");
        Self::internal(REDACTED_MESSAGE)
    }
}
