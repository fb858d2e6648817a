//! Driving port for marketplace reads.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Error, MatchId, ProductId};

use super::swap_command::{MatchPayload, ProductPayload};

/// Response for a single product lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetProductResponse {
    pub product: ProductPayload,
}

/// Response for a single match lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMatchResponse {
    #[serde(rename = "match")]
    pub swap_match: MatchPayload,
}

/// Response listing a product's matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductMatchesResponse {
    pub product_id: ProductId,
    pub matches: Vec<MatchPayload>,
}

/// Driving port for swap read operations.
///
/// # Examples
///
/// ```rust,no_run
/// # use swap_backend::domain::ProductId;
/// # use swap_backend::domain::ports::{FixtureSwapQuery, SwapQuery};
/// # async fn example() {
/// let missing = FixtureSwapQuery.get_product(ProductId::random()).await;
/// assert!(missing.is_err());
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwapQuery: Send + Sync {
    /// Fetch a product that has not been deleted.
    async fn get_product(&self, product_id: ProductId) -> Result<GetProductResponse, Error>;

    async fn get_match(&self, match_id: MatchId) -> Result<GetMatchResponse, Error>;

    /// Matches of a product, oldest first.
    async fn list_product_matches(
        &self,
        product_id: ProductId,
    ) -> Result<ListProductMatchesResponse, Error>;
}

/// Fixture query implementation with no stored documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSwapQuery;

#[async_trait]
impl SwapQuery for FixtureSwapQuery {
    async fn get_product(&self, product_id: ProductId) -> Result<GetProductResponse, Error> {
        Err(Error::not_found(format!("product {product_id} not found")))
    }

    async fn get_match(&self, match_id: MatchId) -> Result<GetMatchResponse, Error> {
        Err(Error::not_found(format!("match {match_id} not found")))
    }

    async fn list_product_matches(
        &self,
        product_id: ProductId,
    ) -> Result<ListProductMatchesResponse, Error> {
        Err(Error::not_found(format!("product {product_id} not found")))
    }
}
