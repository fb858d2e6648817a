//! Product listings and their price ranges.
//!
//! A product is the unit users like, match, and swap. Once swapped, only the
//! soft-delete flag may change; the match links it carries are lookup-only
//! back-references to [`crate::domain::Match`] documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{MatchId, ProductId, UserId};

/// Maximum accepted title length in characters.
pub const TITLE_MAX: usize = 120;

/// Validation errors raised when constructing products.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductValidationError {
    #[error("product title must not be empty")]
    EmptyTitle,
    #[error("product title must be at most {max} characters")]
    TitleTooLong { max: usize },
    #[error("product category must not be empty")]
    EmptyCategory,
    #[error("price range minimum {min} exceeds maximum {max}")]
    InvertedPriceRange { min: u32, max: u32 },
    #[error("only swapped products can be soft-deleted")]
    DeletedWithoutSwap,
}

/// Inclusive asking-price range in whole currency units.
///
/// # Examples
/// ```
/// use swap_backend::domain::PriceRange;
///
/// let a = PriceRange::new(40, 50).expect("valid range");
/// let b = PriceRange::new(45, 55).expect("valid range");
/// let c = PriceRange::new(60, 70).expect("valid range");
/// assert!(a.overlaps(&b));
/// assert!(!a.overlaps(&c));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    min: u32,
    max: u32,
}

impl PriceRange {
    /// Build a range, rejecting `min > max`.
    pub fn new(min: u32, max: u32) -> Result<Self, ProductValidationError> {
        if min > max {
            return Err(ProductValidationError::InvertedPriceRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Lower bound.
    #[must_use]
    pub const fn min(&self) -> u32 {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Two ranges overlap when the later-starting range begins no later than
    /// the earlier-starting range ends. Touching bounds count as overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.max(other.min) <= self.max.min(other.max)
    }
}

/// Back-reference from a product to one of its matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchLink {
    /// The match document.
    pub match_id: MatchId,
    /// The product on the other side of the match.
    pub product_id: ProductId,
}

/// Input for [`Product::new`].
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub id: ProductId,
    pub creator: UserId,
    pub title: String,
    pub category: String,
    pub price: PriceRange,
    pub is_swapped: bool,
    pub is_deleted: bool,
    pub match_links: Vec<MatchLink>,
    pub created_at: DateTime<Utc>,
}

impl ProductDraft {
    /// Draft for a fresh listing with no links and default flags.
    pub fn listing(
        creator: UserId,
        title: impl Into<String>,
        category: impl Into<String>,
        price: PriceRange,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ProductId::random(),
            creator,
            title: title.into(),
            category: category.into(),
            price,
            is_swapped: false,
            is_deleted: false,
            match_links: Vec::new(),
            created_at,
        }
    }
}

/// A listed product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    creator: UserId,
    title: String,
    category: String,
    price: PriceRange,
    is_swapped: bool,
    is_deleted: bool,
    match_links: Vec<MatchLink>,
    created_at: DateTime<Utc>,
}

impl Product {
    /// Validate a draft.
    ///
    /// Unswapped products are purged rather than soft-deleted, so a draft
    /// flagged deleted but not swapped is rejected.
    pub fn new(draft: ProductDraft) -> Result<Self, ProductValidationError> {
        let ProductDraft {
            id,
            creator,
            title,
            category,
            price,
            is_swapped,
            is_deleted,
            match_links,
            created_at,
        } = draft;

        let title = title.trim().to_owned();
        if title.is_empty() {
            return Err(ProductValidationError::EmptyTitle);
        }
        if title.chars().count() > TITLE_MAX {
            return Err(ProductValidationError::TitleTooLong { max: TITLE_MAX });
        }
        let category = category.trim().to_owned();
        if category.is_empty() {
            return Err(ProductValidationError::EmptyCategory);
        }
        if is_deleted && !is_swapped {
            return Err(ProductValidationError::DeletedWithoutSwap);
        }

        Ok(Self {
            id,
            creator,
            title,
            category,
            price,
            is_swapped,
            is_deleted,
            match_links,
            created_at,
        })
    }

    /// Stable product identifier.
    pub fn id(&self) -> ProductId {
        self.id
    }

    /// User who listed the product.
    pub fn creator(&self) -> UserId {
        self.creator
    }

    /// Listing title.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Free-form clothing category.
    pub fn category(&self) -> &str {
        self.category.as_str()
    }

    /// Accepted price range, bounds inclusive.
    pub fn price(&self) -> PriceRange {
        self.price
    }

    /// Whether a confirmed match has swapped this product.
    pub fn is_swapped(&self) -> bool {
        self.is_swapped
    }

    /// Whether the owner deleted the product after it was swapped.
    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Links in the order the matches were created.
    pub fn match_links(&self) -> &[MatchLink] {
        &self.match_links
    }

    /// When the product was listed.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Listed, not swapped, not deleted.
    pub fn is_available(&self) -> bool {
        !self.is_swapped && !self.is_deleted
    }

    /// Append a link unless one for the same match already exists.
    pub fn attach_match_link(&mut self, link: MatchLink) {
        if !self.match_links.iter().any(|l| l.match_id == link.match_id) {
            self.match_links.push(link);
        }
    }

    /// Drop links pointing at any of `match_ids`, preserving order.
    pub fn detach_match_links(&mut self, match_ids: &[MatchId]) {
        self.match_links
            .retain(|link| !match_ids.contains(&link.match_id));
    }

    /// Flag the product as swapped.
    pub fn mark_swapped(&mut self) {
        self.is_swapped = true;
    }

    /// Soft-delete. Only meaningful for swapped products.
    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }
}
