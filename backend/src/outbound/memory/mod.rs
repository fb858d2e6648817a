//! In-process marketplace store for development and tests.
//!
//! Documents live behind one `tokio::sync::RwLock`. Commits take the write
//! lock, evaluate every guard against the current documents, then apply the
//! writes in place. Each write first records the entry it touches; if a later
//! write fails the recorded entries are put back in reverse order before the
//! lock is released, so readers never observe a partial unit.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::ports::{DeviceToken, MarketplaceStore, StoreError};
use crate::domain::{
    Guard, Like, Match, MatchId, Notification, NotificationId, Product, ProductId, UnitOfWork,
    UserId, Write,
};

#[derive(Debug, Default)]
struct Documents {
    products: HashMap<ProductId, Product>,
    matches: HashMap<MatchId, Match>,
    likes: HashMap<(ProductId, UserId), Like>,
    notifications: HashMap<NotificationId, Notification>,
    device_tokens: HashMap<UserId, DeviceToken>,
}

/// Entry state recorded before a write touches it.
enum Prior {
    Product(ProductId, Option<Product>),
    Match(MatchId, Option<Match>),
    Like((ProductId, UserId), Option<Like>),
    Notification(NotificationId, Option<Notification>),
}

fn put_back<K: Eq + Hash, V>(map: &mut HashMap<K, V>, key: K, value: Option<V>) {
    match value {
        Some(value) => {
            map.insert(key, value);
        }
        None => {
            map.remove(&key);
        }
    }
}

impl Documents {
    fn prior_product(&self, id: ProductId) -> Prior {
        Prior::Product(id, self.products.get(&id).cloned())
    }

    fn prior_match(&self, id: MatchId) -> Prior {
        Prior::Match(id, self.matches.get(&id).cloned())
    }

    fn prior_like(&self, key: (ProductId, UserId)) -> Prior {
        Prior::Like(key, self.likes.get(&key).copied())
    }

    fn prior_notification(&self, id: NotificationId) -> Prior {
        Prior::Notification(id, self.notifications.get(&id).cloned())
    }

    fn capture(&self, write: &Write) -> Prior {
        match write {
            Write::InsertProduct(product) => self.prior_product(product.id()),
            Write::AttachMatchLink { product_id, .. }
            | Write::DetachMatchLinks { product_id, .. }
            | Write::MarkSwapped(product_id)
            | Write::MarkDeleted(product_id)
            | Write::DeleteProduct(product_id) => self.prior_product(*product_id),
            Write::InsertLike(like) => self.prior_like((like.product_id, like.user_id)),
            Write::DeleteLike {
                product_id,
                user_id,
            } => self.prior_like((*product_id, *user_id)),
            Write::InsertMatch(swap_match) | Write::UpdateMatch(swap_match) => {
                self.prior_match(swap_match.id())
            }
            Write::DeleteMatch(id) => self.prior_match(*id),
            Write::InsertNotification(notification) => self.prior_notification(notification.id),
            Write::DeleteNotification(id) => self.prior_notification(*id),
        }
    }

    fn restore(&mut self, prior: Prior) {
        match prior {
            Prior::Product(id, value) => put_back(&mut self.products, id, value),
            Prior::Match(id, value) => put_back(&mut self.matches, id, value),
            Prior::Like(key, value) => put_back(&mut self.likes, key, value),
            Prior::Notification(id, value) => put_back(&mut self.notifications, id, value),
        }
    }

    /// Apply every write of `unit`, undoing all of them if one fails.
    fn apply_all(&mut self, unit: &UnitOfWork) -> Result<(), StoreError> {
        let mut undo = Vec::with_capacity(unit.writes().len());
        for write in unit.writes() {
            undo.push(self.capture(write));
            if let Err(err) = self.apply(write) {
                for prior in undo.into_iter().rev() {
                    self.restore(prior);
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn matches_of(&self, product: ProductId) -> impl Iterator<Item = &Match> {
        self.matches
            .values()
            .filter(move |m| m.side_of(product).is_some())
    }

    fn holds(&self, guard: &Guard) -> bool {
        match guard {
            Guard::ProductAvailable(id) => self.products.get(id).is_some_and(Product::is_available),
            Guard::ProductSwapped(id) => self.products.get(id).is_some_and(Product::is_swapped),
            Guard::LikeAbsent {
                product_id,
                user_id,
            } => !self.likes.contains_key(&(*product_id, *user_id)),
            Guard::LikePresent {
                product_id,
                user_id,
            } => self.likes.contains_key(&(*product_id, *user_id)),
            Guard::PairUnmatched { first, second } => {
                !self.matches.values().any(|m| m.pairs(*first, *second))
            }
            Guard::MatchRevision { match_id, revision } => self
                .matches
                .get(match_id)
                .is_some_and(|m| m.revision() == *revision),
            Guard::DependentsUnchanged {
                product_id,
                match_ids,
                liker_ids,
            } => {
                let current_matches: BTreeSet<MatchId> =
                    self.matches_of(*product_id).map(Match::id).collect();
                let current_likers: BTreeSet<UserId> = self
                    .likes
                    .keys()
                    .filter(|(liked, _)| liked == product_id)
                    .map(|(_, user)| *user)
                    .collect();
                *match_ids == current_matches && *liker_ids == current_likers
            }
        }
    }

    fn product_mut(&mut self, id: ProductId) -> Result<&mut Product, StoreError> {
        self.products
            .get_mut(&id)
            .ok_or_else(|| StoreError::query(format!("product {id} does not exist")))
    }

    fn apply(&mut self, write: &Write) -> Result<(), StoreError> {
        match write {
            Write::InsertProduct(product) => {
                if self.products.contains_key(&product.id()) {
                    return Err(StoreError::query(format!(
                        "product {} already exists",
                        product.id()
                    )));
                }
                self.products.insert(product.id(), product.clone());
            }
            Write::InsertLike(like) => {
                let key = (like.product_id, like.user_id);
                if self.likes.insert(key, *like).is_some() {
                    return Err(StoreError::query("duplicate like"));
                }
            }
            Write::DeleteLike {
                product_id,
                user_id,
            } => {
                self.likes.remove(&(*product_id, *user_id));
            }
            Write::InsertMatch(swap_match) => {
                if self.matches.insert(swap_match.id(), swap_match.clone()).is_some() {
                    return Err(StoreError::query(format!(
                        "match {} already exists",
                        swap_match.id()
                    )));
                }
            }
            Write::UpdateMatch(swap_match) => {
                let stored = self.matches.get_mut(&swap_match.id()).ok_or_else(|| {
                    StoreError::query(format!("match {} does not exist", swap_match.id()))
                })?;
                *stored = swap_match.clone();
            }
            Write::DeleteMatch(id) => {
                self.matches.remove(id);
            }
            Write::AttachMatchLink { product_id, link } => {
                self.product_mut(*product_id)?.attach_match_link(*link);
            }
            Write::DetachMatchLinks {
                product_id,
                match_ids,
            } => {
                if let Some(product) = self.products.get_mut(product_id) {
                    product.detach_match_links(match_ids);
                }
            }
            Write::MarkSwapped(id) => self.product_mut(*id)?.mark_swapped(),
            Write::MarkDeleted(id) => self.product_mut(*id)?.mark_deleted(),
            Write::DeleteProduct(id) => {
                self.products.remove(id);
            }
            Write::InsertNotification(notification) => {
                self.notifications
                    .insert(notification.id, notification.clone());
            }
            Write::DeleteNotification(id) => {
                self.notifications.remove(id);
            }
        }
        Ok(())
    }
}

/// Marketplace store held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryMarketplaceStore {
    documents: RwLock<Documents>,
}

impl InMemoryMarketplaceStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the push token for a user.
    pub async fn register_device_token(&self, token: DeviceToken) {
        self.documents
            .write()
            .await
            .device_tokens
            .insert(token.user_id, token);
    }

    /// Notifications addressed to `user`, oldest first.
    pub async fn notifications_for(&self, user: UserId) -> Vec<Notification> {
        let documents = self.documents.read().await;
        let mut found: Vec<_> = documents
            .notifications
            .values()
            .filter(|n| n.target_user == user)
            .cloned()
            .collect();
        found.sort_by_key(|n| n.created_at);
        found
    }
}

#[async_trait]
impl MarketplaceStore for InMemoryMarketplaceStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.documents.read().await.products.get(&id).cloned())
    }

    async fn list_products_by_creator(&self, user: UserId) -> Result<Vec<Product>, StoreError> {
        let documents = self.documents.read().await;
        let mut found: Vec<_> = documents
            .products
            .values()
            .filter(|p| p.creator() == user)
            .cloned()
            .collect();
        found.sort_by_key(|p| (p.created_at(), p.id()));
        Ok(found)
    }

    async fn find_match(&self, id: MatchId) -> Result<Option<Match>, StoreError> {
        Ok(self.documents.read().await.matches.get(&id).cloned())
    }

    async fn list_matches_for_product(
        &self,
        product: ProductId,
    ) -> Result<Vec<Match>, StoreError> {
        let documents = self.documents.read().await;
        let mut found: Vec<_> = documents.matches_of(product).cloned().collect();
        found.sort_by_key(|m| (m.created_at(), m.id()));
        Ok(found)
    }

    async fn find_like(
        &self,
        product: ProductId,
        user: UserId,
    ) -> Result<Option<Like>, StoreError> {
        Ok(self
            .documents
            .read()
            .await
            .likes
            .get(&(product, user))
            .copied())
    }

    async fn list_likes_by_user(&self, user: UserId) -> Result<Vec<Like>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .likes
            .values()
            .filter(|like| like.user_id == user)
            .copied()
            .collect())
    }

    async fn list_likes_for_product(&self, product: ProductId) -> Result<Vec<Like>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .likes
            .values()
            .filter(|like| like.product_id == product)
            .copied()
            .collect())
    }

    async fn list_notifications_for_product(
        &self,
        product: ProductId,
    ) -> Result<Vec<Notification>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .notifications
            .values()
            .filter(|n| n.references(product))
            .cloned()
            .collect())
    }

    async fn find_device_token(&self, user: UserId) -> Result<Option<DeviceToken>, StoreError> {
        Ok(self
            .documents
            .read()
            .await
            .device_tokens
            .get(&user)
            .cloned())
    }

    async fn commit(&self, unit: &UnitOfWork) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        if let Some(failed) = unit.guards().iter().find(|guard| !documents.holds(guard)) {
            debug!(unit = unit.label(), guard = %failed, "guard rejected unit");
            return Err(StoreError::guard_rejected(failed.to_string()));
        }

        documents.apply_all(unit)
    }
}
