//! Driven port for marketplace document persistence.
//!
//! Reads return validated domain entities. Every mutation goes through
//! [`MarketplaceStore::commit`], which applies a [`UnitOfWork`] atomically
//! after re-validating its guards.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Like, Match, MatchId, Notification, Product, ProductId, UnitOfWork, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by marketplace store adapters.
    pub enum StoreError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "marketplace store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "marketplace store query failed: {message}",
        /// A unit guard no longer held at commit time; nothing was written.
        GuardRejected { message: String } =>
            "marketplace store rejected unit: {message}",
    }
}

/// Push token registered by a user's device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceToken {
    pub user_id: UserId,
    pub token: String,
}

/// Port for reading marketplace documents and committing units of work.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketplaceStore: Send + Sync {
    /// Find a product by id, including soft-deleted ones.
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Products listed by `user`, oldest first.
    async fn list_products_by_creator(&self, user: UserId) -> Result<Vec<Product>, StoreError>;

    async fn find_match(&self, id: MatchId) -> Result<Option<Match>, StoreError>;

    /// Matches with `product` on either side, oldest first.
    async fn list_matches_for_product(&self, product: ProductId)
    -> Result<Vec<Match>, StoreError>;

    async fn find_like(
        &self,
        product: ProductId,
        user: UserId,
    ) -> Result<Option<Like>, StoreError>;

    /// Likes placed by `user`.
    async fn list_likes_by_user(&self, user: UserId) -> Result<Vec<Like>, StoreError>;

    /// Likes placed on `product`.
    async fn list_likes_for_product(&self, product: ProductId) -> Result<Vec<Like>, StoreError>;

    /// Notifications naming `product` as product or matched product.
    async fn list_notifications_for_product(
        &self,
        product: ProductId,
    ) -> Result<Vec<Notification>, StoreError>;

    async fn find_device_token(&self, user: UserId) -> Result<Option<DeviceToken>, StoreError>;

    /// Apply every write in `unit` or none of them.
    ///
    /// Returns [`StoreError::GuardRejected`] when any guard fails.
    async fn commit(&self, unit: &UnitOfWork) -> Result<(), StoreError>;
}

/// Fixture implementation for tests that do not exercise persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureMarketplaceStore;

#[async_trait]
impl MarketplaceStore for FixtureMarketplaceStore {
    async fn find_product(&self, _id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(None)
    }

    async fn list_products_by_creator(&self, _user: UserId) -> Result<Vec<Product>, StoreError> {
        Ok(Vec::new())
    }

    async fn find_match(&self, _id: MatchId) -> Result<Option<Match>, StoreError> {
        Ok(None)
    }

    async fn list_matches_for_product(
        &self,
        _product: ProductId,
    ) -> Result<Vec<Match>, StoreError> {
        Ok(Vec::new())
    }

    async fn find_like(
        &self,
        _product: ProductId,
        _user: UserId,
    ) -> Result<Option<Like>, StoreError> {
        Ok(None)
    }

    async fn list_likes_by_user(&self, _user: UserId) -> Result<Vec<Like>, StoreError> {
        Ok(Vec::new())
    }

    async fn list_likes_for_product(&self, _product: ProductId) -> Result<Vec<Like>, StoreError> {
        Ok(Vec::new())
    }

    async fn list_notifications_for_product(
        &self,
        _product: ProductId,
    ) -> Result<Vec<Notification>, StoreError> {
        Ok(Vec::new())
    }

    async fn find_device_token(&self, _user: UserId) -> Result<Option<DeviceToken>, StoreError> {
        Ok(None)
    }

    async fn commit(&self, _unit: &UnitOfWork) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn fixture_reads_are_empty() {
        let store = FixtureMarketplaceStore;
        assert!(
            store
                .find_product(ProductId::random())
                .await
                .expect("fixture lookup succeeds")
                .is_none()
        );
        assert!(
            store
                .list_likes_by_user(UserId::random())
                .await
                .expect("fixture list succeeds")
                .is_empty()
        );
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_commit_succeeds() {
        let store = FixtureMarketplaceStore;
        store
            .commit(&UnitOfWork::new("noop"))
            .await
            .expect("fixture commit succeeds");
    }

    #[rstest]
    #[case(StoreError::connection("refused"), "connection failed: refused")]
    #[case(StoreError::query("bad column"), "query failed: bad column")]
    #[case(StoreError::guard_rejected("stale match"), "rejected unit: stale match")]
    fn errors_format_message(#[case] err: StoreError, #[case] expected: &str) {
        assert!(err.to_string().contains(expected));
    }
}
