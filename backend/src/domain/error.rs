//! Transport-agnostic error payload returned by every caller-facing operation.
//!
//! Inbound adapters map [`ErrorCode`] to a protocol status; the domain never
//! knows about HTTP. Conflicts carry a stable machine code under
//! `details.code` so clients can branch without parsing messages.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::TraceId;

/// Stable machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// A referenced product, match, or user does not exist.
    NotFound,
    /// The request would violate a marketplace invariant.
    Conflict,
    /// A backing service (store) is temporarily unreachable.
    ServiceUnavailable,
    /// An unexpected failure inside the backend.
    InternalError,
}

/// Validation failures raised by the fallible constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    /// Messages must contain visible characters.
    #[error("error message must not be empty")]
    EmptyMessage,
    /// Trace identifiers must contain visible characters.
    #[error("trace identifier must not be empty")]
    EmptyTraceId,
}

/// Error payload surfaced to callers.
///
/// ## Invariants
/// - `message` is non-empty once trimmed.
/// - `trace_id`, when present, is non-empty.
///
/// # Examples
/// ```
/// use swap_backend::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("product missing");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert_eq!(err.message(), "product missing");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    code: ErrorCode,
    message: String,
    trace_id: Option<String>,
    details: Option<Value>,
}

impl Error {
    /// Create a new error, panicking if the message is blank.
    ///
    /// Only call this with literal or formatted messages that are known to be
    /// non-empty; use [`Error::try_new`] for caller-supplied text.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        match Self::try_new(code, message) {
            Ok(value) => value,
            Err(err) => panic!("error messages must satisfy validation: {err}"),
        }
    }

    /// Fallible constructor capturing the ambient trace identifier.
    pub fn try_new(
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            code,
            message,
            trace_id: TraceId::current().map(|id| id.to_string()),
            details: None,
        })
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Correlation identifier, if one was in scope.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Supplementary structured details.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach a trace identifier, panicking when blank.
    pub fn with_trace_id(self, trace_id: impl Into<String>) -> Self {
        match self.try_with_trace_id(trace_id) {
            Ok(value) => value,
            Err(err) => panic!("trace identifiers must satisfy validation: {err}"),
        }
    }

    /// Attach a trace identifier.
    pub fn try_with_trace_id(
        mut self,
        trace_id: impl Into<String>,
    ) -> Result<Self, ErrorValidationError> {
        let trace_id = trace_id.into();
        if trace_id.trim().is_empty() {
            return Err(ErrorValidationError::EmptyTraceId);
        }
        self.trace_id = Some(trace_id);
        Ok(self)
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Machine code stored under `details.code`, if any.
    pub fn detail_code(&self) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|details| details.get("code"))
            .and_then(Value::as_str)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

/// Reasons a marketplace mutation is refused.
///
/// Each reason has a stable code and message shared by every adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// The user already likes this product.
    AlreadyLiked,
    /// Unlike was requested for a product the user does not like.
    NotLiked,
    /// Users cannot like their own listings.
    OwnProduct,
    /// The product is already part of a confirmed swap.
    ProductSwapped,
    /// One of the acting product's matches is already confirmed.
    AlreadyAccepted,
    /// The opposing product has already requested this match.
    OpposingRequestPending,
    /// The acting product already has an outstanding request.
    RequestAlreadyPending,
    /// Accept attempted while a request is outstanding on another match.
    CancelPendingRequestFirst,
    /// The opposing side has not requested this match.
    NoRequestToAccept,
    /// The acting side has no request to withdraw.
    NoRequestToCancel,
    /// Reviews are only accepted on confirmed matches.
    MatchNotConfirmed,
    /// The acting side already reviewed this swap.
    AlreadyReviewed,
    /// State changed between read and commit.
    ConcurrentModification,
}

impl ConflictReason {
    /// Machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AlreadyLiked => "already_liked",
            Self::NotLiked => "not_liked",
            Self::OwnProduct => "own_product",
            Self::ProductSwapped => "product_swapped",
            Self::AlreadyAccepted => "already_accepted",
            Self::OpposingRequestPending => "opposing_request_pending",
            Self::RequestAlreadyPending => "request_already_pending",
            Self::CancelPendingRequestFirst => "cancel_pending_request_first",
            Self::NoRequestToAccept => "no_request_to_accept",
            Self::NoRequestToCancel => "no_request_to_cancel",
            Self::MatchNotConfirmed => "match_not_confirmed",
            Self::AlreadyReviewed => "already_reviewed",
            Self::ConcurrentModification => "concurrent_modification",
        }
    }

    /// Human-readable message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::AlreadyLiked => "Product already liked",
            Self::NotLiked => "Product has not been liked",
            Self::OwnProduct => "Cannot like your own product",
            Self::ProductSwapped => "Product has already been swapped",
            Self::AlreadyAccepted => "Already accepted a match request",
            Self::OpposingRequestPending => "The other product has already requested this match",
            Self::RequestAlreadyPending => "A match request is already pending",
            Self::CancelPendingRequestFirst => {
                "Cancel your pending match request before accepting another"
            }
            Self::NoRequestToAccept => "There is no match request to accept",
            Self::NoRequestToCancel => "There is no pending match request to cancel",
            Self::MatchNotConfirmed => "Match has not been confirmed",
            Self::AlreadyReviewed => "Swap already reviewed",
            Self::ConcurrentModification => "The listing changed concurrently; retry the request",
        }
    }
}

impl From<ConflictReason> for Error {
    fn from(reason: ConflictReason) -> Self {
        Error::conflict(reason.message()).with_details(json!({ "code": reason.code() }))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            message: value.message,
            trace_id: value.trace_id,
            details: value.details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            message,
            trace_id,
            details,
        } = value;
        let mut error = Error::try_new(code, message)?;
        error.trace_id = None;
        if let Some(id) = trace_id {
            error = error.try_with_trace_id(id)?;
        }
        error.details = details;
        Ok(error)
    }
}

#[cfg(test)]
mod tests;
