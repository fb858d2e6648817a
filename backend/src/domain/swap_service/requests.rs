//! Match request workflow: request, accept, cancel and review.
//!
//! Preconditions are evaluated against every match of the acting product,
//! re-read under the locks of both products in the match.

use tracing::debug;

use super::{SwapService, map_store_error, not_in_match};
use crate::domain::notification_emitter::SwapEvent;
use crate::domain::ports::{
    MarketplaceStore, MatchActionRequest, MatchActionResponse, MatchPayload, PushNotifier,
};
use crate::domain::product_locks::ProductLockGuard;
use crate::domain::{
    ConflictReason, Error, Guard, Match, MatchSide, Notification, Product, ProductId, UnitOfWork,
    Write,
};

/// Documents of one match action, read under the product locks.
struct MatchScope {
    swap_match: Match,
    side: MatchSide,
    acting: Product,
    counterpart: Product,
    /// Every match of the acting product, including `swap_match`.
    siblings: Vec<Match>,
    _locks: ProductLockGuard,
}

impl MatchScope {
    fn any_confirmed(&self) -> bool {
        self.siblings.iter().any(Match::is_confirmed)
    }

    /// Whether the acting product has a request outstanding on another match.
    fn requested_elsewhere(&self) -> bool {
        let acting = self.acting.id();
        self.siblings
            .iter()
            .filter(|sibling| sibling.id() != self.swap_match.id())
            .any(|sibling| requested_by(sibling, acting))
    }

    fn requested_anywhere(&self) -> bool {
        let acting = self.acting.id();
        self.siblings
            .iter()
            .any(|sibling| requested_by(sibling, acting))
    }

    /// Guards pinning every sibling at the revision read under the locks.
    fn revision_guards(&self, unit: &mut UnitOfWork) {
        for sibling in &self.siblings {
            unit.guard(Guard::MatchRevision {
                match_id: sibling.id(),
                revision: sibling.revision(),
            });
        }
        unit.guard(Guard::MatchRevision {
            match_id: self.swap_match.id(),
            revision: self.swap_match.revision(),
        });
    }
}

fn requested_by(candidate: &Match, product: ProductId) -> bool {
    candidate
        .side_of(product)
        .is_some_and(|side| !candidate.is_confirmed() && candidate.is_requested_by(side))
}

fn push_notifications(unit: &mut UnitOfWork, notifications: Vec<Notification>) {
    for notification in notifications {
        unit.write(Write::InsertNotification(notification));
    }
}

impl<S, P> SwapService<S, P>
where
    S: MarketplaceStore + 'static,
    P: PushNotifier + 'static,
{
    async fn enter_match(
        &self,
        request: MatchActionRequest,
        allow_deleted: bool,
    ) -> Result<MatchScope, Error> {
        let MatchActionRequest {
            match_id,
            product_id,
        } = request;
        let unlocked = self.load_match(match_id).await?;
        let opposite = unlocked
            .opposite_product(product_id)
            .ok_or_else(|| not_in_match(product_id, match_id))?;
        let locks = self.locks.acquire([product_id, opposite]).await;

        let swap_match = self.load_match(match_id).await?;
        let side = swap_match
            .side_of(product_id)
            .ok_or_else(|| not_in_match(product_id, match_id))?;
        let (acting, counterpart) = if allow_deleted {
            (
                self.load_any_product(product_id).await?,
                self.load_any_product(opposite).await?,
            )
        } else {
            (
                self.load_product(product_id).await?,
                self.load_product(opposite).await?,
            )
        };
        let siblings = self
            .store
            .list_matches_for_product(product_id)
            .await
            .map_err(map_store_error)?;

        Ok(MatchScope {
            swap_match,
            side,
            acting,
            counterpart,
            siblings,
            _locks: locks,
        })
    }

    async fn load_any_product(&self, id: ProductId) -> Result<Product, Error> {
        self.store
            .find_product(id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found(format!("product {id} not found")))
    }

    pub(super) async fn send_request(
        &self,
        request: MatchActionRequest,
    ) -> Result<MatchActionResponse, Error> {
        let mut scope = self.enter_match(request, false).await?;
        if scope.any_confirmed() || scope.acting.is_swapped() {
            return Err(ConflictReason::AlreadyAccepted.into());
        }
        if scope.swap_match.is_requested_by(scope.side.opposite()) {
            return Err(ConflictReason::OpposingRequestPending.into());
        }
        if scope.requested_anywhere() {
            return Err(ConflictReason::RequestAlreadyPending.into());
        }
        if scope.counterpart.is_swapped() {
            return Err(ConflictReason::ProductSwapped.into());
        }

        let mut unit = UnitOfWork::new("send_match_request");
        scope.revision_guards(&mut unit);
        scope
            .swap_match
            .request(scope.side)
            .map_err(ConflictReason::from)?;
        unit.guard(Guard::ProductAvailable(scope.acting.id()))
            .guard(Guard::ProductAvailable(scope.counterpart.id()))
            .write(Write::UpdateMatch(scope.swap_match.clone()));
        push_notifications(
            &mut unit,
            SwapEvent::Requested {
                requesting: &scope.acting,
                requested: &scope.counterpart,
            }
            .notifications(self.clock.utc()),
        );

        self.commit(unit).await?;
        debug!(match_id = %scope.swap_match.id(), "match requested");
        Ok(MatchActionResponse {
            swap_match: MatchPayload::from(&scope.swap_match),
        })
    }

    pub(super) async fn accept_request(
        &self,
        request: MatchActionRequest,
    ) -> Result<MatchActionResponse, Error> {
        let mut scope = self.enter_match(request, false).await?;
        if scope.any_confirmed() || scope.acting.is_swapped() {
            return Err(ConflictReason::AlreadyAccepted.into());
        }
        if scope.requested_elsewhere() {
            return Err(ConflictReason::CancelPendingRequestFirst.into());
        }
        if !scope.swap_match.is_requested_by(scope.side.opposite()) {
            return Err(ConflictReason::NoRequestToAccept.into());
        }
        if scope.counterpart.is_swapped() {
            return Err(ConflictReason::ProductSwapped.into());
        }

        let mut unit = UnitOfWork::new("accept_match_request");
        scope.revision_guards(&mut unit);
        scope
            .swap_match
            .confirm(scope.side)
            .map_err(ConflictReason::from)?;
        scope.acting.mark_swapped();
        scope.counterpart.mark_swapped();
        unit.guard(Guard::ProductAvailable(scope.acting.id()))
            .guard(Guard::ProductAvailable(scope.counterpart.id()))
            .write(Write::UpdateMatch(scope.swap_match.clone()))
            .write(Write::MarkSwapped(scope.acting.id()))
            .write(Write::MarkSwapped(scope.counterpart.id()));
        push_notifications(
            &mut unit,
            SwapEvent::Swapped {
                accepting: &scope.acting,
                requesting: &scope.counterpart,
            }
            .notifications(self.clock.utc()),
        );

        self.commit(unit).await?;
        debug!(match_id = %scope.swap_match.id(), "match confirmed; products swapped");
        Ok(MatchActionResponse {
            swap_match: MatchPayload::from(&scope.swap_match),
        })
    }

    pub(super) async fn cancel_request(
        &self,
        request: MatchActionRequest,
    ) -> Result<MatchActionResponse, Error> {
        // A soft-deleted counterpart must not pin the request open.
        let mut scope = self.enter_match(request, true).await?;
        let expected = scope.swap_match.revision();
        scope
            .swap_match
            .cancel(scope.side)
            .map_err(ConflictReason::from)?;

        let mut unit = UnitOfWork::new("cancel_match_request");
        unit.guard(Guard::MatchRevision {
            match_id: scope.swap_match.id(),
            revision: expected,
        })
        .write(Write::UpdateMatch(scope.swap_match.clone()));

        self.commit(unit).await?;
        debug!(match_id = %scope.swap_match.id(), "match request cancelled");
        Ok(MatchActionResponse {
            swap_match: MatchPayload::from(&scope.swap_match),
        })
    }

    pub(super) async fn review(
        &self,
        request: MatchActionRequest,
    ) -> Result<MatchActionResponse, Error> {
        let mut scope = self.enter_match(request, true).await?;
        let expected = scope.swap_match.revision();
        scope
            .swap_match
            .mark_reviewed(scope.side)
            .map_err(ConflictReason::from)?;

        let mut unit = UnitOfWork::new("review_match");
        unit.guard(Guard::MatchRevision {
            match_id: scope.swap_match.id(),
            revision: expected,
        })
        .write(Write::UpdateMatch(scope.swap_match.clone()));
        push_notifications(
            &mut unit,
            SwapEvent::Reviewed {
                reviewer: &scope.acting,
                reviewed: &scope.counterpart,
            }
            .notifications(self.clock.utc()),
        );

        self.commit(unit).await?;
        Ok(MatchActionResponse {
            swap_match: MatchPayload::from(&scope.swap_match),
        })
    }
}
