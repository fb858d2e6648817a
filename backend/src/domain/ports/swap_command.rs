//! Driving port for marketplace swap mutations.
//!
//! Inbound adapters call this port to list products, like and unlike them,
//! drive match requests to a confirmed swap, review counterparts, and delete
//! products. Responses are payloads built from validated entities.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Error, Like, Match, MatchId, MatchLink, MatchSide, PriceRange, Product, ProductDraft,
    ProductId, UserId,
};

/// Serializable product projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub id: ProductId,
    pub creator: UserId,
    pub title: String,
    pub category: String,
    pub min_price: u32,
    pub max_price: u32,
    pub is_swapped: bool,
    pub is_deleted: bool,
    pub matches: Vec<MatchLink>,
    pub created_at: DateTime<Utc>,
}

impl From<&Product> for ProductPayload {
    fn from(value: &Product) -> Self {
        Self {
            id: value.id(),
            creator: value.creator(),
            title: value.title().to_owned(),
            category: value.category().to_owned(),
            min_price: value.price().min(),
            max_price: value.price().max(),
            is_swapped: value.is_swapped(),
            is_deleted: value.is_deleted(),
            matches: value.match_links().to_vec(),
            created_at: value.created_at(),
        }
    }
}

/// Serializable match projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPayload {
    pub id: MatchId,
    pub product_one_id: ProductId,
    pub product_two_id: ProductId,
    pub is_confirmed: bool,
    pub product_one_is_requested: bool,
    pub product_two_is_requested: bool,
    pub product_one_is_reviewed: bool,
    pub product_two_is_reviewed: bool,
    /// `pending`, `requested` or `confirmed`.
    pub state: String,
    pub revision: u32,
    pub created_at: DateTime<Utc>,
}

impl From<&Match> for MatchPayload {
    fn from(value: &Match) -> Self {
        Self {
            id: value.id(),
            product_one_id: value.product_one_id(),
            product_two_id: value.product_two_id(),
            is_confirmed: value.is_confirmed(),
            product_one_is_requested: value.is_requested_by(MatchSide::One),
            product_two_is_requested: value.is_requested_by(MatchSide::Two),
            product_one_is_reviewed: value.is_reviewed_by(MatchSide::One),
            product_two_is_reviewed: value.is_reviewed_by(MatchSide::Two),
            state: value.state().as_str().to_owned(),
            revision: value.revision(),
            created_at: value.created_at(),
        }
    }
}

/// Serializable like projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikePayload {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl From<&Like> for LikePayload {
    fn from(value: &Like) -> Self {
        Self {
            product_id: value.product_id,
            user_id: value.user_id,
            created_at: value.created_at,
        }
    }
}

/// Request to list a new product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductRequest {
    pub creator: UserId,
    pub title: String,
    pub category: String,
    pub min_price: u32,
    pub max_price: u32,
}

/// Response from listing a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductResponse {
    pub product: ProductPayload,
}

/// Request naming a product and the user acting on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLikeRequest {
    pub product_id: ProductId,
    pub user_id: UserId,
}

/// Response from liking a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeProductResponse {
    pub like: LikePayload,
    /// Matches proposed by this like.
    pub matches: Vec<MatchPayload>,
}

/// Response from unliking a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlikeProductResponse {
    pub product_id: ProductId,
    pub user_id: UserId,
    /// Unconfirmed matches removed with the like.
    pub removed_match_ids: Vec<MatchId>,
}

/// Request naming a match and the product acting on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchActionRequest {
    pub match_id: MatchId,
    pub product_id: ProductId,
}

/// Response from a match request, accept, cancel or review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchActionResponse {
    #[serde(rename = "match")]
    pub swap_match: MatchPayload,
}

/// Request to delete a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteProductRequest {
    pub product_id: ProductId,
}

/// How a product deletion was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionOutcome {
    /// Swapped product flagged deleted; swap history kept.
    SoftDeleted,
    /// Unswapped product removed with all dependents.
    Purged,
}

/// Response from deleting a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteProductResponse {
    pub product_id: ProductId,
    pub outcome: DeletionOutcome,
    pub removed_match_ids: Vec<MatchId>,
    pub removed_like_count: usize,
    pub removed_notification_count: usize,
}

/// Driving port for swap write operations.
///
/// # Examples
///
/// ```rust,no_run
/// # use swap_backend::domain::UserId;
/// # use swap_backend::domain::ports::{FixtureSwapCommand, ListProductRequest, SwapCommand};
/// # async fn example() -> Result<(), swap_backend::domain::Error> {
/// let command = FixtureSwapCommand;
/// let response = command
///     .list_product(ListProductRequest {
///         creator: UserId::random(),
///         title: "Wool scarf".to_owned(),
///         category: "accessories".to_owned(),
///         min_price: 10,
///         max_price: 20,
///     })
///     .await?;
/// assert!(!response.product.is_swapped);
/// # Ok(())
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwapCommand: Send + Sync {
    /// List a product with a validated price range.
    async fn list_product(&self, request: ListProductRequest)
    -> Result<ListProductResponse, Error>;

    /// Record a like and propose matches for reciprocal likes.
    async fn like_product(&self, request: ProductLikeRequest)
    -> Result<LikeProductResponse, Error>;

    /// Remove a like and the unconfirmed matches it sustained.
    async fn unlike_product(
        &self,
        request: ProductLikeRequest,
    ) -> Result<UnlikeProductResponse, Error>;

    /// Ask the counterpart to swap.
    async fn send_match_request(
        &self,
        request: MatchActionRequest,
    ) -> Result<MatchActionResponse, Error>;

    /// Confirm the counterpart's request; both products become swapped.
    async fn accept_match_request(
        &self,
        request: MatchActionRequest,
    ) -> Result<MatchActionResponse, Error>;

    /// Withdraw an outstanding request.
    async fn cancel_match_request(
        &self,
        request: MatchActionRequest,
    ) -> Result<MatchActionResponse, Error>;

    /// Review the counterpart of a confirmed swap.
    async fn review_match(&self, request: MatchActionRequest)
    -> Result<MatchActionResponse, Error>;

    /// Soft-delete a swapped product or purge an unswapped one.
    async fn delete_product(
        &self,
        request: DeleteProductRequest,
    ) -> Result<DeleteProductResponse, Error>;
}

/// Fixture command implementation for tests that do not need persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSwapCommand;

#[async_trait]
impl SwapCommand for FixtureSwapCommand {
    async fn list_product(
        &self,
        request: ListProductRequest,
    ) -> Result<ListProductResponse, Error> {
        let product = build_listing(request, Utc::now())?;
        Ok(ListProductResponse {
            product: ProductPayload::from(&product),
        })
    }

    async fn like_product(
        &self,
        request: ProductLikeRequest,
    ) -> Result<LikeProductResponse, Error> {
        let like = Like::new(request.product_id, request.user_id, Utc::now());
        Ok(LikeProductResponse {
            like: LikePayload::from(&like),
            matches: Vec::new(),
        })
    }

    async fn unlike_product(
        &self,
        request: ProductLikeRequest,
    ) -> Result<UnlikeProductResponse, Error> {
        Ok(UnlikeProductResponse {
            product_id: request.product_id,
            user_id: request.user_id,
            removed_match_ids: Vec::new(),
        })
    }

    async fn send_match_request(
        &self,
        request: MatchActionRequest,
    ) -> Result<MatchActionResponse, Error> {
        Err(missing_match(request.match_id))
    }

    async fn accept_match_request(
        &self,
        request: MatchActionRequest,
    ) -> Result<MatchActionResponse, Error> {
        Err(missing_match(request.match_id))
    }

    async fn cancel_match_request(
        &self,
        request: MatchActionRequest,
    ) -> Result<MatchActionResponse, Error> {
        Err(missing_match(request.match_id))
    }

    async fn review_match(
        &self,
        request: MatchActionRequest,
    ) -> Result<MatchActionResponse, Error> {
        Err(missing_match(request.match_id))
    }

    async fn delete_product(
        &self,
        request: DeleteProductRequest,
    ) -> Result<DeleteProductResponse, Error> {
        Ok(DeleteProductResponse {
            product_id: request.product_id,
            outcome: DeletionOutcome::Purged,
            removed_match_ids: Vec::new(),
            removed_like_count: 0,
            removed_notification_count: 0,
        })
    }
}

/// Validate a listing request into a fresh product.
pub(crate) fn build_listing(
    request: ListProductRequest,
    created_at: DateTime<Utc>,
) -> Result<Product, Error> {
    let invalid = |err| Error::invalid_request(format!("invalid product: {err}"));
    let price = PriceRange::new(request.min_price, request.max_price).map_err(invalid)?;
    Product::new(ProductDraft::listing(
        request.creator,
        request.title,
        request.category,
        price,
        created_at,
    ))
    .map_err(invalid)
}

fn missing_match(match_id: MatchId) -> Error {
    Error::not_found(format!("match {match_id} not found"))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::domain::ErrorCode;

    #[fixture]
    fn listing() -> ListProductRequest {
        ListProductRequest {
            creator: UserId::random(),
            title: "Leather boots".to_owned(),
            category: "shoes".to_owned(),
            min_price: 40,
            max_price: 50,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_lists_valid_product(listing: ListProductRequest) {
        let response = FixtureSwapCommand
            .list_product(listing)
            .await
            .expect("valid listing");
        assert_eq!(response.product.min_price, 40);
        assert!(response.product.matches.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn inverted_price_range_is_invalid(mut listing: ListProductRequest) {
        listing.min_price = 60;
        let err = FixtureSwapCommand
            .list_product(listing)
            .await
            .expect_err("inverted range rejected");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_match_actions_report_not_found() {
        let err = FixtureSwapCommand
            .send_match_request(MatchActionRequest {
                match_id: MatchId::random(),
                product_id: ProductId::random(),
            })
            .await
            .expect_err("fixture has no matches");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    fn match_payload_serialises_flags_in_camel_case() {
        let swap_match = Match::propose(ProductId::random(), ProductId::random(), Utc::now())
            .expect("distinct products");
        let value = serde_json::to_value(MatchActionResponse {
            swap_match: MatchPayload::from(&swap_match),
        })
        .expect("serialise payload");

        assert_eq!(value["match"]["productOneIsRequested"], json!(false));
        assert_eq!(value["match"]["state"], json!("pending"));
        assert_eq!(value["match"]["revision"], json!(1));
    }

    #[rstest]
    fn deletion_outcome_uses_snake_case() {
        let value = serde_json::to_value(DeletionOutcome::SoftDeleted).expect("serialise");
        assert_eq!(value, json!("soft_deleted"));
    }
}
