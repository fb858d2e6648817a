//! OpenAPI schema definitions for domain types.
//!
//! Domain types stay framework-agnostic by not deriving `ToSchema`; these
//! wrappers mirror their JSON shape for documentation only.

#![expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// The product or match does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The action would break a marketplace rule; see `details.code`.
    #[schema(rename = "conflict")]
    Conflict,
    /// The store is unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
pub struct ErrorSchema {
    #[schema(example = "conflict")]
    code: ErrorCodeSchema,
    #[schema(example = "Already accepted a match request")]
    message: String,
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Conflicts carry `{"code": "<reason>"}`; validation errors name the field.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::MatchLink`].
#[derive(ToSchema)]
#[schema(as = crate::domain::MatchLink, rename_all = "camelCase")]
pub struct MatchLinkSchema {
    #[schema(value_type = String, format = Uuid)]
    match_id: String,
    /// The counterpart product.
    #[schema(value_type = String, format = Uuid)]
    product_id: String,
}

/// OpenAPI schema for [`crate::domain::ports::ProductPayload`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::ProductPayload, rename_all = "camelCase")]
pub struct ProductSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(value_type = String, format = Uuid)]
    creator: String,
    #[schema(example = "Denim jacket")]
    title: String,
    #[schema(example = "outerwear")]
    category: String,
    #[schema(example = 40)]
    min_price: u32,
    #[schema(example = 50)]
    max_price: u32,
    is_swapped: bool,
    is_deleted: bool,
    matches: Vec<MatchLinkSchema>,
    #[schema(value_type = String, format = DateTime)]
    created_at: String,
}

/// OpenAPI schema for [`crate::domain::ports::MatchPayload`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::MatchPayload, rename_all = "camelCase")]
pub struct MatchSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(value_type = String, format = Uuid)]
    product_one_id: String,
    #[schema(value_type = String, format = Uuid)]
    product_two_id: String,
    is_confirmed: bool,
    product_one_is_requested: bool,
    product_two_is_requested: bool,
    product_one_is_reviewed: bool,
    product_two_is_reviewed: bool,
    #[schema(example = "requested")]
    state: String,
    revision: u32,
    #[schema(value_type = String, format = DateTime)]
    created_at: String,
}

/// OpenAPI schema for [`crate::domain::ports::LikePayload`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::LikePayload, rename_all = "camelCase")]
pub struct LikeSchema {
    #[schema(value_type = String, format = Uuid)]
    product_id: String,
    #[schema(value_type = String, format = Uuid)]
    user_id: String,
    #[schema(value_type = String, format = DateTime)]
    created_at: String,
}

/// Body wrapping a single product.
#[derive(ToSchema)]
pub struct ProductEnvelopeSchema {
    product: ProductSchema,
}

/// Body wrapping a single match.
#[derive(ToSchema)]
pub struct MatchEnvelopeSchema {
    #[schema(rename = "match")]
    swap_match: MatchSchema,
}

/// Body returned by a like.
#[derive(ToSchema)]
pub struct LikeProductSchema {
    like: LikeSchema,
    /// Matches proposed by this like.
    matches: Vec<MatchSchema>,
}

/// Body returned by an unlike.
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct UnlikeProductSchema {
    #[schema(value_type = String, format = Uuid)]
    product_id: String,
    #[schema(value_type = String, format = Uuid)]
    user_id: String,
    #[schema(value_type = Vec<String>)]
    removed_match_ids: Vec<String>,
}

/// Body returned by a product deletion.
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct DeleteProductSchema {
    #[schema(value_type = String, format = Uuid)]
    product_id: String,
    #[schema(example = "purged")]
    outcome: String,
    #[schema(value_type = Vec<String>)]
    removed_match_ids: Vec<String>,
    removed_like_count: usize,
    removed_notification_count: usize,
}

/// Body listing a product's matches.
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct ProductMatchesSchema {
    #[schema(value_type = String, format = Uuid)]
    product_id: String,
    matches: Vec<MatchSchema>,
}
