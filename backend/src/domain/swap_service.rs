//! Swap service implementing the swap command and query driving ports.
//!
//! Every mutation follows the same shape: read enough to learn which
//! products are involved, lock those products, re-read under the locks and
//! check preconditions, then commit one [`UnitOfWork`] whose guards let the
//! store refuse the unit if another process changed the documents meanwhile.
//! Pushes for the committed notifications are dispatched afterwards.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::notification_emitter::plan_pushes;
use crate::domain::ports::{
    DeleteProductRequest, DeleteProductResponse, GetMatchResponse, GetProductResponse,
    LikeProductResponse, ListProductMatchesResponse, ListProductRequest, ListProductResponse,
    MarketplaceStore, MatchActionRequest, MatchActionResponse, MatchPayload, ProductLikeRequest,
    ProductPayload, PushNotifier, StoreError, SwapCommand, SwapQuery, UnlikeProductResponse,
    build_listing,
};
use crate::domain::push_dispatch::PushDispatcher;
use crate::domain::{
    ConflictReason, Error, Match, MatchId, Product, ProductId, ProductLocks, UnitOfWork, Write,
};

mod deletion;
mod likes;
mod requests;

/// Marketplace swap service.
pub struct SwapService<S, P> {
    store: Arc<S>,
    pushes: PushDispatcher<S, P>,
    locks: Arc<ProductLocks>,
    clock: Arc<dyn Clock>,
}

impl<S, P> Clone for SwapService<S, P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            pushes: self.pushes.clone(),
            locks: Arc::clone(&self.locks),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S, P> SwapService<S, P>
where
    S: MarketplaceStore + 'static,
    P: PushNotifier + 'static,
{
    /// Create a service over `store`, delivering pushes through `notifier`.
    ///
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use mockable::DefaultClock;
    /// # use swap_backend::domain::SwapService;
    /// # use swap_backend::domain::ports::{FixtureMarketplaceStore, NoOpPushNotifier};
    /// let service = SwapService::new(
    ///     Arc::new(FixtureMarketplaceStore),
    ///     Arc::new(NoOpPushNotifier),
    ///     Arc::new(DefaultClock),
    /// );
    /// # let _ = service;
    /// ```
    pub fn new(store: Arc<S>, notifier: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self {
            pushes: PushDispatcher::new(Arc::clone(&store), notifier),
            store,
            locks: Arc::new(ProductLocks::new()),
            clock,
        }
    }

    /// Load a product that exists and has not been deleted.
    async fn load_product(&self, id: ProductId) -> Result<Product, Error> {
        match self.store.find_product(id).await.map_err(map_store_error)? {
            Some(product) if !product.is_deleted() => Ok(product),
            _ => Err(Error::not_found(format!("product {id} not found"))),
        }
    }

    async fn load_match(&self, id: MatchId) -> Result<Match, Error> {
        self.store
            .find_match(id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found(format!("match {id} not found")))
    }

    /// Commit `unit` and dispatch pushes for the notifications it persisted.
    async fn commit(&self, unit: UnitOfWork) -> Result<(), Error> {
        self.store.commit(&unit).await.map_err(|err| {
            debug!(unit = unit.label(), error = %err, "unit of work rejected");
            map_store_error(err)
        })?;
        info!(
            unit = unit.label(),
            writes = unit.writes().len(),
            "unit of work committed"
        );

        let notifications: Vec<_> = unit.notifications().cloned().collect();
        // Detached: delivery never blocks or fails the operation.
        let _delivery = self.pushes.dispatch(plan_pushes(&notifications));
        Ok(())
    }
}

pub(crate) fn map_store_error(error: StoreError) -> Error {
    match error {
        StoreError::Connection { message } => {
            Error::service_unavailable(format!("marketplace store unavailable: {message}"))
        }
        StoreError::Query { message } => {
            Error::internal(format!("marketplace store error: {message}"))
        }
        StoreError::GuardRejected { .. } => ConflictReason::ConcurrentModification.into(),
    }
}

fn not_in_match(product_id: ProductId, match_id: MatchId) -> Error {
    Error::invalid_request(format!(
        "product {product_id} is not part of match {match_id}"
    ))
}

#[async_trait]
impl<S, P> SwapCommand for SwapService<S, P>
where
    S: MarketplaceStore + 'static,
    P: PushNotifier + 'static,
{
    async fn list_product(
        &self,
        request: ListProductRequest,
    ) -> Result<ListProductResponse, Error> {
        let product = build_listing(request, self.clock.utc())?;
        let mut unit = UnitOfWork::new("list_product");
        unit.write(Write::InsertProduct(product.clone()));
        self.commit(unit).await?;
        Ok(ListProductResponse {
            product: ProductPayload::from(&product),
        })
    }

    async fn like_product(
        &self,
        request: ProductLikeRequest,
    ) -> Result<LikeProductResponse, Error> {
        self.like(request).await
    }

    async fn unlike_product(
        &self,
        request: ProductLikeRequest,
    ) -> Result<UnlikeProductResponse, Error> {
        self.unlike(request).await
    }

    async fn send_match_request(
        &self,
        request: MatchActionRequest,
    ) -> Result<MatchActionResponse, Error> {
        self.send_request(request).await
    }

    async fn accept_match_request(
        &self,
        request: MatchActionRequest,
    ) -> Result<MatchActionResponse, Error> {
        self.accept_request(request).await
    }

    async fn cancel_match_request(
        &self,
        request: MatchActionRequest,
    ) -> Result<MatchActionResponse, Error> {
        self.cancel_request(request).await
    }

    async fn review_match(
        &self,
        request: MatchActionRequest,
    ) -> Result<MatchActionResponse, Error> {
        self.review(request).await
    }

    async fn delete_product(
        &self,
        request: DeleteProductRequest,
    ) -> Result<DeleteProductResponse, Error> {
        self.delete(request).await
    }
}

#[async_trait]
impl<S, P> SwapQuery for SwapService<S, P>
where
    S: MarketplaceStore + 'static,
    P: PushNotifier + 'static,
{
    async fn get_product(&self, product_id: ProductId) -> Result<GetProductResponse, Error> {
        let product = self.load_product(product_id).await?;
        Ok(GetProductResponse {
            product: ProductPayload::from(&product),
        })
    }

    async fn get_match(&self, match_id: MatchId) -> Result<GetMatchResponse, Error> {
        let swap_match = self.load_match(match_id).await?;
        Ok(GetMatchResponse {
            swap_match: MatchPayload::from(&swap_match),
        })
    }

    async fn list_product_matches(
        &self,
        product_id: ProductId,
    ) -> Result<ListProductMatchesResponse, Error> {
        self.load_product(product_id).await?;
        let matches = self
            .store
            .list_matches_for_product(product_id)
            .await
            .map_err(map_store_error)?;
        Ok(ListProductMatchesResponse {
            product_id,
            matches: matches.iter().map(MatchPayload::from).collect(),
        })
    }
}
