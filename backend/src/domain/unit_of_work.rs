//! Declarative atomic units for multi-document mutations.
//!
//! Services never write to the store piecemeal. They read, decide, and then
//! describe the whole change as a [`UnitOfWork`]: guards the store must
//! re-validate at commit time, followed by ordered writes. A store applies
//! every write or none, and rejects the unit outright when any guard fails.

use std::collections::BTreeSet;
use std::fmt;

use crate::domain::{
    Like, Match, MatchId, MatchLink, Notification, NotificationId, Product, ProductId, UserId,
};

/// Precondition re-checked by the store inside the atomic commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Product exists and is neither swapped nor deleted.
    ProductAvailable(ProductId),
    /// Product exists and is swapped.
    ProductSwapped(ProductId),
    /// No like exists for the pair.
    LikeAbsent {
        product_id: ProductId,
        user_id: UserId,
    },
    /// A like exists for the pair.
    LikePresent {
        product_id: ProductId,
        user_id: UserId,
    },
    /// No match joins the two products, in either order.
    PairUnmatched { first: ProductId, second: ProductId },
    /// The match exists and still carries `revision`.
    MatchRevision { match_id: MatchId, revision: u32 },
    /// The product's matches and likers are exactly the enumerated sets.
    DependentsUnchanged {
        product_id: ProductId,
        match_ids: BTreeSet<MatchId>,
        liker_ids: BTreeSet<UserId>,
    },
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProductAvailable(id) => write!(f, "product {id} is no longer available"),
            Self::ProductSwapped(id) => write!(f, "product {id} is not swapped"),
            Self::LikeAbsent {
                product_id,
                user_id,
            } => write!(f, "user {user_id} already likes product {product_id}"),
            Self::LikePresent {
                product_id,
                user_id,
            } => write!(f, "user {user_id} no longer likes product {product_id}"),
            Self::PairUnmatched { first, second } => {
                write!(f, "products {first} and {second} are already matched")
            }
            Self::MatchRevision { match_id, revision } => {
                write!(f, "match {match_id} changed since revision {revision}")
            }
            Self::DependentsUnchanged { product_id, .. } => {
                write!(f, "dependents of product {product_id} changed")
            }
        }
    }
}

/// Single document mutation inside a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    InsertProduct(Product),
    InsertLike(Like),
    DeleteLike {
        product_id: ProductId,
        user_id: UserId,
    },
    InsertMatch(Match),
    /// Replace the stored flags and revision of an existing match.
    UpdateMatch(Match),
    DeleteMatch(MatchId),
    AttachMatchLink {
        product_id: ProductId,
        link: MatchLink,
    },
    DetachMatchLinks {
        product_id: ProductId,
        match_ids: Vec<MatchId>,
    },
    MarkSwapped(ProductId),
    MarkDeleted(ProductId),
    DeleteProduct(ProductId),
    InsertNotification(Notification),
    DeleteNotification(NotificationId),
}

/// Guards plus ordered writes committed all-or-nothing.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use swap_backend::domain::{Guard, Like, ProductId, UnitOfWork, UserId, Write};
///
/// let product_id = ProductId::random();
/// let user_id = UserId::random();
/// let mut unit = UnitOfWork::new("like");
/// unit.guard(Guard::LikeAbsent { product_id, user_id });
/// unit.write(Write::InsertLike(Like::new(product_id, user_id, Utc::now())));
/// assert_eq!(unit.writes().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOfWork {
    label: &'static str,
    guards: Vec<Guard>,
    writes: Vec<Write>,
}

impl UnitOfWork {
    /// Start an empty unit. `label` names the operation in logs.
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            guards: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// Add a guard; identical guards are kept once.
    pub fn guard(&mut self, guard: Guard) -> &mut Self {
        if !self.guards.contains(&guard) {
            self.guards.push(guard);
        }
        self
    }

    /// Append a write.
    pub fn write(&mut self, write: Write) -> &mut Self {
        self.writes.push(write);
        self
    }

    /// Operation name used in logs.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Preconditions checked before any write.
    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    /// Writes in application order.
    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    /// Whether the unit carries no writes.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Notifications this unit will persist, in write order.
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.writes.iter().filter_map(|write| match write {
            Write::InsertNotification(notification) => Some(notification),
            _ => None,
        })
    }
}
