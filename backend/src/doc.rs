//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every marketplace endpoint plus the schema wrappers
//! from [`crate::inbound::http::schemas`], keeping domain types free of
//! utoipa derives. Swagger UI serves it in debug builds.

use utoipa::OpenApi;

use crate::inbound::http::schemas::{
    DeleteProductSchema, ErrorCodeSchema, ErrorSchema, LikeProductSchema, LikeSchema,
    MatchEnvelopeSchema, MatchLinkSchema, MatchSchema, ProductEnvelopeSchema,
    ProductMatchesSchema, ProductSchema, UnlikeProductSchema,
};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Swap marketplace API",
        description = "Listings, likes, matches and the request/accept swap workflow."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::products::list_product,
        crate::inbound::http::products::get_product,
        crate::inbound::http::products::delete_product,
        crate::inbound::http::products::list_product_matches,
        crate::inbound::http::products::like_product,
        crate::inbound::http::products::unlike_product,
        crate::inbound::http::matches::get_match,
        crate::inbound::http::matches::send_match_request,
        crate::inbound::http::matches::accept_match_request,
        crate::inbound::http::matches::cancel_match_request,
        crate::inbound::http::matches::review_match,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        MatchLinkSchema,
        ProductSchema,
        MatchSchema,
        LikeSchema,
        ProductEnvelopeSchema,
        MatchEnvelopeSchema,
        LikeProductSchema,
        UnlikeProductSchema,
        DeleteProductSchema,
        ProductMatchesSchema,
    )),
    tags(
        (name = "products", description = "Listings and likes"),
        (name = "matches", description = "Match requests, swaps and reviews"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
