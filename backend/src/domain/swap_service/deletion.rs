//! Product deletion: soft delete for swapped products, purge otherwise.
//!
//! A purge enumerates every dependent document under the locks first, then
//! removes them and the product in one unit so no pointer is left dangling.

use std::collections::BTreeSet;

use tracing::debug;

use super::{SwapService, map_store_error};
use crate::domain::ports::{
    DeleteProductRequest, DeleteProductResponse, DeletionOutcome, MarketplaceStore, PushNotifier,
};
use crate::domain::{ConflictReason, Error, Guard, MatchId, UnitOfWork, UserId, Write};

impl<S, P> SwapService<S, P>
where
    S: MarketplaceStore + 'static,
    P: PushNotifier + 'static,
{
    pub(super) async fn delete(
        &self,
        request: DeleteProductRequest,
    ) -> Result<DeleteProductResponse, Error> {
        let product_id = request.product_id;
        self.load_product(product_id).await?;
        let counterparts: Vec<_> = self
            .store
            .list_matches_for_product(product_id)
            .await
            .map_err(map_store_error)?
            .iter()
            .filter_map(|m| m.opposite_product(product_id))
            .collect();
        let locks = self
            .locks
            .acquire(counterparts.into_iter().chain([product_id]))
            .await;

        let product = self.load_product(product_id).await?;
        let likes = self
            .store
            .list_likes_for_product(product_id)
            .await
            .map_err(map_store_error)?;

        if product.is_swapped() {
            let mut unit = UnitOfWork::new("soft_delete_product");
            unit.guard(Guard::ProductSwapped(product_id))
                .write(Write::MarkDeleted(product_id));
            for like in &likes {
                unit.write(Write::DeleteLike {
                    product_id,
                    user_id: like.user_id,
                });
            }
            self.commit(unit).await?;
            debug!(%product_id, likes = likes.len(), "product soft-deleted");
            return Ok(DeleteProductResponse {
                product_id,
                outcome: DeletionOutcome::SoftDeleted,
                removed_match_ids: Vec::new(),
                removed_like_count: likes.len(),
                removed_notification_count: 0,
            });
        }

        let matches = self
            .store
            .list_matches_for_product(product_id)
            .await
            .map_err(map_store_error)?;
        // A match created between the two reads names an unlocked product.
        if matches
            .iter()
            .filter_map(|m| m.opposite_product(product_id))
            .any(|other| !locks.covers(other))
        {
            return Err(ConflictReason::ConcurrentModification.into());
        }
        let notifications = self
            .store
            .list_notifications_for_product(product_id)
            .await
            .map_err(map_store_error)?;

        let match_ids: BTreeSet<MatchId> = matches.iter().map(|m| m.id()).collect();
        let liker_ids: BTreeSet<UserId> = likes.iter().map(|like| like.user_id).collect();
        let mut unit = UnitOfWork::new("purge_product");
        unit.guard(Guard::ProductAvailable(product_id))
            .guard(Guard::DependentsUnchanged {
                product_id,
                match_ids: match_ids.clone(),
                liker_ids,
            });
        for doomed in &matches {
            if let Some(other) = doomed.opposite_product(product_id) {
                unit.write(Write::DetachMatchLinks {
                    product_id: other,
                    match_ids: vec![doomed.id()],
                });
            }
            unit.write(Write::DeleteMatch(doomed.id()));
        }
        for notification in &notifications {
            unit.write(Write::DeleteNotification(notification.id));
        }
        for like in &likes {
            unit.write(Write::DeleteLike {
                product_id,
                user_id: like.user_id,
            });
        }
        unit.write(Write::DeleteProduct(product_id));

        self.commit(unit).await?;
        drop(locks);
        debug!(
            %product_id,
            matches = matches.len(),
            likes = likes.len(),
            notifications = notifications.len(),
            "product purged"
        );

        Ok(DeleteProductResponse {
            product_id,
            outcome: DeletionOutcome::Purged,
            removed_match_ids: match_ids.into_iter().collect(),
            removed_like_count: likes.len(),
            removed_notification_count: notifications.len(),
        })
    }
}
