//! PostgreSQL-backed marketplace store.
//!
//! Reads translate rows into validated domain entities. `commit` runs a unit
//! of work inside one database transaction: guards lock the rows they inspect
//! (`FOR UPDATE`) before any write is applied, and unique-index violations or
//! serialisation failures from a concurrent writer reject the whole unit.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{DeviceToken, MarketplaceStore, StoreError};
use crate::domain::{Like, Match, MatchId, Notification, Product, ProductId, UnitOfWork, UserId};

use super::models::{DeviceTokenRow, LikeRow, MatchLinkRow, MatchRow, NotificationRow, ProductRow};
use super::pool::{DbPool, PoolError};
use super::schema::{device_tokens, likes, matches, notifications, product_match_links, products};

mod mapping;
mod unit;

use mapping::{
    device_token_from_row, like_from_row, match_from_row, notification_from_row,
    product_from_rows,
};
use unit::{CommitError, apply_unit};

/// Diesel-backed implementation of [`MarketplaceStore`].
#[derive(Clone)]
pub struct DieselMarketplaceStore {
    pool: DbPool,
}

impl DieselMarketplaceStore {
    /// Create a store over the given connection pool.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use swap_backend::outbound::persistence::{DbPool, DieselMarketplaceStore, PoolConfig};
    ///
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let pool = DbPool::new(PoolConfig::new("postgres://localhost/swap")).await?;
    /// let store = DieselMarketplaceStore::new(pool);
    /// # let _ = store;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to store errors.
fn map_pool_error(error: PoolError) -> StoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            StoreError::connection(message)
        }
    }
}

/// Map Diesel errors to store errors.
fn map_diesel_error(error: diesel::result::Error) -> StoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    let error_message = error.to_string();
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                error = %error_message,
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            error = %error_message,
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => StoreError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            StoreError::connection(info.message().to_owned())
        }
        DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::SerializationFailure,
            info,
        ) => StoreError::guard_rejected(info.message().to_owned()),
        DieselError::DatabaseError(_, info) => StoreError::query(info.message().to_owned()),
        _ => StoreError::query(error_message),
    }
}

fn map_commit_error(error: CommitError) -> StoreError {
    match error {
        CommitError::Diesel(err) => map_diesel_error(err),
        CommitError::Guard(message) => StoreError::guard_rejected(message),
        CommitError::Store(err) => err,
    }
}

/// Load match links for `rows` in insertion order and assemble products.
async fn assemble_products(
    conn: &mut AsyncPgConnection,
    rows: Vec<ProductRow>,
) -> Result<Vec<Product>, StoreError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let link_rows: Vec<MatchLinkRow> = product_match_links::table
        .filter(product_match_links::product_id.eq_any(&ids))
        .order(product_match_links::seq.asc())
        .select(MatchLinkRow::as_select())
        .load(conn)
        .await
        .map_err(map_diesel_error)?;

    let mut links_by_product: HashMap<Uuid, Vec<MatchLinkRow>> = HashMap::new();
    for link in link_rows {
        links_by_product.entry(link.product_id).or_default().push(link);
    }
    rows.into_iter()
        .map(|row| {
            let links = links_by_product.remove(&row.id).unwrap_or_default();
            product_from_rows(row, links)
        })
        .collect()
}

#[async_trait]
impl MarketplaceStore for DieselMarketplaceStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ProductRow> = products::table
            .filter(products::id.eq(id.as_uuid()))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut found = assemble_products(&mut conn, vec![row]).await?;
        Ok(found.pop())
    }

    async fn list_products_by_creator(&self, user: UserId) -> Result<Vec<Product>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ProductRow> = products::table
            .filter(products::creator_id.eq(user.as_uuid()))
            .order((products::created_at.asc(), products::id.asc()))
            .select(ProductRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        assemble_products(&mut conn, rows).await
    }

    async fn find_match(&self, id: MatchId) -> Result<Option<Match>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<MatchRow> = matches::table
            .filter(matches::id.eq(id.as_uuid()))
            .select(MatchRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(match_from_row).transpose()
    }

    async fn list_matches_for_product(
        &self,
        product: ProductId,
    ) -> Result<Vec<Match>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<MatchRow> = matches::table
            .filter(
                matches::product_one_id
                    .eq(product.as_uuid())
                    .or(matches::product_two_id.eq(product.as_uuid())),
            )
            .order((matches::created_at.asc(), matches::id.asc()))
            .select(MatchRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(match_from_row).collect()
    }

    async fn find_like(
        &self,
        product: ProductId,
        user: UserId,
    ) -> Result<Option<Like>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<LikeRow> = likes::table
            .filter(likes::product_id.eq(product.as_uuid()))
            .filter(likes::user_id.eq(user.as_uuid()))
            .select(LikeRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(like_from_row))
    }

    async fn list_likes_by_user(&self, user: UserId) -> Result<Vec<Like>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<LikeRow> = likes::table
            .filter(likes::user_id.eq(user.as_uuid()))
            .order(likes::created_at.asc())
            .select(LikeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(like_from_row).collect())
    }

    async fn list_likes_for_product(&self, product: ProductId) -> Result<Vec<Like>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<LikeRow> = likes::table
            .filter(likes::product_id.eq(product.as_uuid()))
            .order(likes::created_at.asc())
            .select(LikeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(like_from_row).collect())
    }

    async fn list_notifications_for_product(
        &self,
        product: ProductId,
    ) -> Result<Vec<Notification>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<NotificationRow> = notifications::table
            .filter(
                notifications::product_id
                    .eq(product.as_uuid())
                    .or(notifications::matched_product_id.eq(product.as_uuid())),
            )
            .order(notifications::created_at.asc())
            .select(NotificationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(notification_from_row).collect()
    }

    async fn find_device_token(&self, user: UserId) -> Result<Option<DeviceToken>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<DeviceTokenRow> = device_tokens::table
            .filter(device_tokens::user_id.eq(user.as_uuid()))
            .select(DeviceTokenRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(device_token_from_row))
    }

    async fn commit(&self, unit: &UnitOfWork) -> Result<(), StoreError> {
        if unit.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move { apply_unit(conn, unit).await }.scope_boxed()
        })
        .await
        .map_err(map_commit_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for marketplace store error mapping.
    use super::*;
    use diesel::result::{DatabaseErrorKind, DatabaseErrorInformation, Error as DieselError};
    use rstest::rstest;

    #[derive(Debug)]
    struct StubInfo(&'static str);

    impl DatabaseErrorInformation for StubInfo {
        fn message(&self) -> &str {
            self.0
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            None
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn database_error(kind: DatabaseErrorKind, message: &'static str) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(StubInfo(message)))
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let store_err = map_pool_error(PoolError::checkout("connection refused"));

        assert!(matches!(store_err, StoreError::Connection { .. }));
        assert!(
            store_err.to_string().contains("connection refused"),
            "preserve useful diagnostics"
        );
    }

    #[rstest]
    fn not_found_maps_to_query_error() {
        let store_err = map_diesel_error(DieselError::NotFound);

        assert!(matches!(store_err, StoreError::Query { .. }));
        assert!(store_err.to_string().contains("record not found"));
    }

    #[rstest]
    #[case::pair_taken(DatabaseErrorKind::UniqueViolation)]
    #[case::serialisation(DatabaseErrorKind::SerializationFailure)]
    fn concurrent_writer_rejects_unit(#[case] kind: DatabaseErrorKind) {
        let store_err = map_diesel_error(database_error(kind, "duplicate key value"));

        assert!(matches!(store_err, StoreError::GuardRejected { .. }));
    }

    #[rstest]
    fn closed_connection_maps_to_connection_error() {
        let store_err = map_diesel_error(database_error(
            DatabaseErrorKind::ClosedConnection,
            "server closed the connection",
        ));

        assert!(matches!(store_err, StoreError::Connection { .. }));
    }

    #[rstest]
    fn failed_guard_maps_to_guard_rejected() {
        let store_err = map_commit_error(CommitError::Guard("match revision moved".to_owned()));

        assert!(matches!(store_err, StoreError::GuardRejected { .. }));
        assert!(store_err.to_string().contains("match revision moved"));
    }
}
