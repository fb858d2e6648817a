//! Product HTTP handlers.
//!
//! ```text
//! POST   /api/v1/products
//! GET    /api/v1/products/{productId}
//! DELETE /api/v1/products/{productId}
//! GET    /api/v1/products/{productId}/matches
//! POST   /api/v1/products/{productId}/likes
//! DELETE /api/v1/products/{productId}/likes/{userId}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{
    DeleteProductRequest, DeleteProductResponse, GetProductResponse, LikeProductResponse,
    ListProductMatchesResponse, ListProductRequest, ProductLikeRequest, UnlikeProductResponse,
};
use crate::domain::{Error, ProductId, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    DeleteProductSchema, ErrorSchema, LikeProductSchema, ProductEnvelopeSchema,
    ProductMatchesSchema, UnlikeProductSchema,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{missing_field_error, parse_id};

/// Request payload for listing a product.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListProductBody {
    pub creator_id: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<u32>,
    pub max_price: Option<u32>,
}

/// Request payload for liking a product.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeBody {
    pub user_id: Option<String>,
}

fn parse_list_product(body: ListProductBody) -> Result<ListProductRequest, Error> {
    let creator_id = body.creator_id.ok_or_else(|| missing_field_error("creatorId"))?;
    Ok(ListProductRequest {
        creator: parse_id(&creator_id, "creatorId")?,
        title: body.title.ok_or_else(|| missing_field_error("title"))?,
        category: body.category.ok_or_else(|| missing_field_error("category"))?,
        min_price: body.min_price.ok_or_else(|| missing_field_error("minPrice"))?,
        max_price: body.max_price.ok_or_else(|| missing_field_error("maxPrice"))?,
    })
}

fn parse_like(product_id: &str, body: LikeBody) -> Result<ProductLikeRequest, Error> {
    let user_id = body.user_id.ok_or_else(|| missing_field_error("userId"))?;
    Ok(ProductLikeRequest {
        product_id: parse_id(product_id, "productId")?,
        user_id: parse_id(&user_id, "userId")?,
    })
}

/// List a product for swapping.
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = ListProductBody,
    responses(
        (status = 201, description = "Product listed", body = ProductEnvelopeSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "listProduct"
)]
#[post("/products")]
pub async fn list_product(
    state: web::Data<HttpState>,
    payload: web::Json<ListProductBody>,
) -> ApiResult<HttpResponse> {
    let request = parse_list_product(payload.into_inner())?;
    let response = state.swaps.list_product(request).await?;
    Ok(HttpResponse::Created().json(response))
}

/// Fetch a product and its match links.
#[utoipa::path(
    get,
    path = "/api/v1/products/{productId}",
    params(("productId" = String, Path, description = "Product identifier")),
    responses(
        (status = 200, description = "Product", body = ProductEnvelopeSchema),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 404, description = "Product not found", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "getProduct"
)]
#[get("/products/{product_id}")]
pub async fn get_product(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<GetProductResponse>> {
    let product_id: ProductId = parse_id(&path.into_inner(), "productId")?;
    let response = state.swaps_query.get_product(product_id).await?;
    Ok(web::Json(response))
}

/// Delete a product: soft delete when swapped, purge otherwise.
#[utoipa::path(
    delete,
    path = "/api/v1/products/{productId}",
    params(("productId" = String, Path, description = "Product identifier")),
    responses(
        (status = 200, description = "Deletion outcome", body = DeleteProductSchema),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 404, description = "Product not found", body = ErrorSchema),
        (status = 409, description = "Concurrent modification", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "deleteProduct"
)]
#[delete("/products/{product_id}")]
pub async fn delete_product(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<DeleteProductResponse>> {
    let product_id = parse_id(&path.into_inner(), "productId")?;
    let response = state
        .swaps
        .delete_product(DeleteProductRequest { product_id })
        .await?;
    Ok(web::Json(response))
}

/// List the matches a product takes part in.
#[utoipa::path(
    get,
    path = "/api/v1/products/{productId}/matches",
    params(("productId" = String, Path, description = "Product identifier")),
    responses(
        (status = 200, description = "Matches of the product", body = ProductMatchesSchema),
        (status = 404, description = "Product not found", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "listProductMatches"
)]
#[get("/products/{product_id}/matches")]
pub async fn list_product_matches(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<ListProductMatchesResponse>> {
    let product_id = parse_id(&path.into_inner(), "productId")?;
    let response = state.swaps_query.list_product_matches(product_id).await?;
    Ok(web::Json(response))
}

/// Like a product; reciprocal likes with overlapping prices become matches.
#[utoipa::path(
    post,
    path = "/api/v1/products/{productId}/likes",
    params(("productId" = String, Path, description = "Product identifier")),
    request_body = LikeBody,
    responses(
        (status = 201, description = "Like recorded", body = LikeProductSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Product not found", body = ErrorSchema),
        (status = 409, description = "Already liked or not likeable", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "likeProduct"
)]
#[post("/products/{product_id}/likes")]
pub async fn like_product(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<LikeBody>,
) -> ApiResult<HttpResponse> {
    let request = parse_like(&path.into_inner(), payload.into_inner())?;
    let response: LikeProductResponse = state.swaps.like_product(request).await?;
    Ok(HttpResponse::Created().json(response))
}

/// Remove a like and the unconfirmed matches it sustained.
#[utoipa::path(
    delete,
    path = "/api/v1/products/{productId}/likes/{userId}",
    params(
        ("productId" = String, Path, description = "Product identifier"),
        ("userId" = String, Path, description = "User who placed the like")
    ),
    responses(
        (status = 200, description = "Like removed", body = UnlikeProductSchema),
        (status = 404, description = "Product not found", body = ErrorSchema),
        (status = 409, description = "Not liked", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "unlikeProduct"
)]
#[delete("/products/{product_id}/likes/{user_id}")]
pub async fn unlike_product(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<UnlikeProductResponse>> {
    let (product_id, user_id) = path.into_inner();
    let request = ProductLikeRequest {
        product_id: parse_id(&product_id, "productId")?,
        user_id: parse_id::<UserId>(&user_id, "userId")?,
    };
    let response = state.swaps.unlike_product(request).await?;
    Ok(web::Json(response))
}

#[cfg(test)]
#[path = "products_tests.rs"]
mod tests;
