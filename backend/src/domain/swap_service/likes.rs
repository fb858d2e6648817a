//! Like and unlike units, including match detection and unlike cascades.

use std::collections::BTreeSet;

use tracing::debug;

use super::{SwapService, map_store_error};
use crate::domain::match_detector::{LikeContext, detect_matches};
use crate::domain::notification_emitter::SwapEvent;
use crate::domain::ports::{
    LikePayload, LikeProductResponse, MarketplaceStore, MatchPayload, ProductLikeRequest,
    PushNotifier, UnlikeProductResponse,
};
use crate::domain::{
    ConflictReason, Error, Guard, Like, MatchId, MatchLink, Product, ProductId, UnitOfWork,
    UserId, Write,
};

impl<S, P> SwapService<S, P>
where
    S: MarketplaceStore + 'static,
    P: PushNotifier + 'static,
{
    pub(super) async fn like(
        &self,
        request: ProductLikeRequest,
    ) -> Result<LikeProductResponse, Error> {
        let ProductLikeRequest {
            product_id,
            user_id,
        } = request;
        self.load_product(product_id).await?;
        let owned_ids = self.product_ids_of(user_id).await?;
        let locks = self
            .locks
            .acquire(owned_ids.iter().copied().chain([product_id]))
            .await;

        let liked = self.load_product(product_id).await?;
        if liked.creator() == user_id {
            return Err(ConflictReason::OwnProduct.into());
        }
        if liked.is_swapped() {
            return Err(ConflictReason::ProductSwapped.into());
        }
        if self
            .store
            .find_like(product_id, user_id)
            .await
            .map_err(map_store_error)?
            .is_some()
        {
            return Err(ConflictReason::AlreadyLiked.into());
        }

        let liker_products: Vec<_> = self
            .store
            .list_products_by_creator(user_id)
            .await
            .map_err(map_store_error)?
            .into_iter()
            .filter(|product| locks.covers(product.id()))
            .collect();
        let reciprocal_likes = self
            .store
            .list_likes_by_user(liked.creator())
            .await
            .map_err(map_store_error)?;
        let existing_matches = self
            .store
            .list_matches_for_product(product_id)
            .await
            .map_err(map_store_error)?;

        let now = self.clock.utc();
        let ctx = LikeContext {
            liked: &liked,
            liker: user_id,
            liker_products: &liker_products,
            reciprocal_likes: &reciprocal_likes,
            existing_matches: &existing_matches,
        };
        let proposals = detect_matches(&ctx, now);
        debug!(
            %product_id,
            %user_id,
            proposals = proposals.len(),
            "match detection finished"
        );

        let like = Like::new(product_id, user_id, now);
        let mut unit = UnitOfWork::new("like_product");
        unit.guard(Guard::ProductAvailable(product_id))
            .guard(Guard::LikeAbsent {
                product_id,
                user_id,
            })
            .write(Write::InsertLike(like));
        let mut notifications = SwapEvent::Liked {
            product: &liked,
            liker: user_id,
        }
        .notifications(now);

        for proposal in &proposals {
            let counterpart_id = proposal.product_two_id();
            let Some(counterpart) = liker_products.iter().find(|p| p.id() == counterpart_id)
            else {
                continue;
            };
            unit.guard(Guard::ProductAvailable(counterpart_id))
                .guard(Guard::LikePresent {
                    product_id: counterpart_id,
                    user_id: liked.creator(),
                })
                .guard(Guard::PairUnmatched {
                    first: product_id,
                    second: counterpart_id,
                })
                .write(Write::InsertMatch(proposal.clone()))
                .write(Write::AttachMatchLink {
                    product_id,
                    link: MatchLink {
                        match_id: proposal.id(),
                        product_id: counterpart_id,
                    },
                })
                .write(Write::AttachMatchLink {
                    product_id: counterpart_id,
                    link: MatchLink {
                        match_id: proposal.id(),
                        product_id,
                    },
                });
            notifications.extend(
                SwapEvent::Matched {
                    liked: &liked,
                    counterpart,
                }
                .notifications(now),
            );
        }
        for notification in notifications {
            unit.write(Write::InsertNotification(notification));
        }

        self.commit(unit).await?;
        drop(locks);

        Ok(LikeProductResponse {
            like: LikePayload::from(&like),
            matches: proposals.iter().map(MatchPayload::from).collect(),
        })
    }

    pub(super) async fn unlike(
        &self,
        request: ProductLikeRequest,
    ) -> Result<UnlikeProductResponse, Error> {
        let ProductLikeRequest {
            product_id,
            user_id,
        } = request;
        self.load_product(product_id).await?;
        let owned_ids = self.product_ids_of(user_id).await?;
        let locks = self
            .locks
            .acquire(owned_ids.iter().copied().chain([product_id]))
            .await;

        let product = self.load_product(product_id).await?;
        if product.is_swapped() {
            return Err(ConflictReason::ProductSwapped.into());
        }
        if self
            .store
            .find_like(product_id, user_id)
            .await
            .map_err(map_store_error)?
            .is_none()
        {
            return Err(ConflictReason::NotLiked.into());
        }

        let owned: BTreeSet<ProductId> = self
            .product_ids_of(user_id)
            .await?
            .into_iter()
            .filter(|id| locks.covers(*id))
            .collect();
        let doomed: Vec<_> = self
            .store
            .list_matches_for_product(product_id)
            .await
            .map_err(map_store_error)?
            .into_iter()
            .filter(|candidate| !candidate.is_confirmed())
            .filter(|candidate| {
                candidate
                    .opposite_product(product_id)
                    .is_some_and(|other| owned.contains(&other))
            })
            .collect();
        debug!(
            %product_id,
            %user_id,
            matches = doomed.len(),
            "unlike cascades to matches"
        );

        let removed_match_ids: Vec<MatchId> = doomed.iter().map(|m| m.id()).collect();
        let mut unit = UnitOfWork::new("unlike_product");
        unit.guard(Guard::LikePresent {
            product_id,
            user_id,
        });
        for doomed_match in &doomed {
            unit.guard(Guard::MatchRevision {
                match_id: doomed_match.id(),
                revision: doomed_match.revision(),
            });
            if let Some(other) = doomed_match.opposite_product(product_id) {
                unit.write(Write::DetachMatchLinks {
                    product_id: other,
                    match_ids: vec![doomed_match.id()],
                });
            }
            unit.write(Write::DeleteMatch(doomed_match.id()));
        }
        if !removed_match_ids.is_empty() {
            unit.write(Write::DetachMatchLinks {
                product_id,
                match_ids: removed_match_ids.clone(),
            });
        }
        unit.write(Write::DeleteLike {
            product_id,
            user_id,
        });

        self.commit(unit).await?;
        drop(locks);

        Ok(UnlikeProductResponse {
            product_id,
            user_id,
            removed_match_ids,
        })
    }

    async fn product_ids_of(&self, user: UserId) -> Result<Vec<ProductId>, Error> {
        Ok(self
            .store
            .list_products_by_creator(user)
            .await
            .map_err(map_store_error)?
            .iter()
            .map(Product::id)
            .collect())
    }
}
