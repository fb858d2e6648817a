//! Domain primitives, aggregates and services.
//!
//! Purpose: define the marketplace entities (products, likes, matches,
//! notifications), the rules that pair products into matches and drive them
//! to a confirmed swap, and the service that commits every multi-document
//! change as one atomic unit.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - ConflictReason: stable machine codes for refused operations.
//! - Product, Like, Match, Notification: validated documents.
//! - UnitOfWork: guards plus writes committed all-or-nothing.
//! - SwapService: implements the `SwapCommand` and `SwapQuery` ports.

pub mod error;
pub mod ids;
pub mod like;
pub mod match_detector;
pub mod notification;
pub mod notification_emitter;
pub mod ports;
pub mod product;
pub mod product_locks;
pub mod push_dispatch;
pub mod swap_match;
pub mod swap_service;
pub mod trace_id;
pub mod unit_of_work;

pub use self::error::{ConflictReason, Error, ErrorCode, ErrorValidationError};
pub use self::ids::{MatchId, NotificationId, ProductId, UserId};
pub use self::like::Like;
pub use self::notification::{Notification, NotificationKind, UnknownNotificationKind};
pub use self::product::{
    MatchLink, PriceRange, Product, ProductDraft, ProductValidationError, TITLE_MAX,
};
pub use self::product_locks::{ProductLockGuard, ProductLocks};
pub use self::swap_match::{
    Match, MatchDraft, MatchSide, MatchState, MatchTransitionError, MatchValidationError,
};
pub use self::swap_service::SwapService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::unit_of_work::{Guard, UnitOfWork, Write};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use swap_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::not_found("no such product"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
