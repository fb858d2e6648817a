//! Match entity and its request/confirm state machine.
//!
//! A match pairs two products whose owners liked each other's listings. The
//! entity guards its own transitions; rules that span several matches of one
//! product (single outstanding request, no request after a confirmed swap)
//! live in the request workflow, which reads every match of the acting
//! product before calling into this module.
//!
//! ```text
//! Pending --request(side)--> Requested(side) --confirm(other side)--> Confirmed
//!    ^                              |
//!    +---------cancel(side)---------+
//! ```

use chrono::{DateTime, Utc};

use crate::domain::{ConflictReason, MatchId, ProductId};

/// Which slot of the match a product occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchSide {
    /// `product_one_id`: the product whose like triggered the match.
    One,
    /// `product_two_id`: the reciprocally liked product.
    Two,
}

impl MatchSide {
    /// The other slot.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

/// Observable lifecycle state derived from the persisted flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    /// Unconfirmed with no outstanding request.
    Pending,
    /// Unconfirmed; the given side has requested the swap.
    Requested(MatchSide),
    /// Terminal: the swap was accepted.
    Confirmed,
}

impl MatchState {
    /// Lower-case label used in projections and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Requested(_) => "requested",
            Self::Confirmed => "confirmed",
        }
    }
}

/// Structural problems in persisted match data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchValidationError {
    #[error("a match must pair two distinct products")]
    SameProduct,
    #[error("an unconfirmed match cannot carry requests from both sides")]
    BothSidesRequested,
    #[error("a match can only be reviewed after confirmation")]
    ReviewedBeforeConfirmation,
    #[error("match revision must be positive")]
    ZeroRevision,
}

/// Refused transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MatchTransitionError {
    #[error("match is already confirmed")]
    Confirmed,
    #[error("this side already requested the match")]
    AlreadyRequested,
    #[error("the opposing side already requested the match")]
    OpposingRequested,
    #[error("the opposing side has not requested the match")]
    NothingToAccept,
    #[error("this side has no outstanding request")]
    NothingToCancel,
    #[error("match is not confirmed")]
    NotConfirmed,
    #[error("this side already reviewed the swap")]
    AlreadyReviewed,
}

impl From<MatchTransitionError> for ConflictReason {
    fn from(value: MatchTransitionError) -> Self {
        match value {
            MatchTransitionError::Confirmed => Self::AlreadyAccepted,
            MatchTransitionError::AlreadyRequested => Self::RequestAlreadyPending,
            MatchTransitionError::OpposingRequested => Self::OpposingRequestPending,
            MatchTransitionError::NothingToAccept => Self::NoRequestToAccept,
            MatchTransitionError::NothingToCancel => Self::NoRequestToCancel,
            MatchTransitionError::NotConfirmed => Self::MatchNotConfirmed,
            MatchTransitionError::AlreadyReviewed => Self::AlreadyReviewed,
        }
    }
}

/// Input for [`Match::new`], used by adapters rehydrating stored matches.
#[derive(Debug, Clone)]
pub struct MatchDraft {
    pub id: MatchId,
    pub product_one_id: ProductId,
    pub product_two_id: ProductId,
    pub is_confirmed: bool,
    pub product_one_is_requested: bool,
    pub product_two_is_requested: bool,
    pub product_one_is_reviewed: bool,
    pub product_two_is_reviewed: bool,
    pub revision: u32,
    pub created_at: DateTime<Utc>,
}

/// A proposed or confirmed pairing of two products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    id: MatchId,
    product_one_id: ProductId,
    product_two_id: ProductId,
    is_confirmed: bool,
    requested: [bool; 2],
    reviewed: [bool; 2],
    revision: u32,
    created_at: DateTime<Utc>,
}

const fn slot(side: MatchSide) -> usize {
    match side {
        MatchSide::One => 0,
        MatchSide::Two => 1,
    }
}

impl Match {
    /// Propose a new pending match at revision 1.
    pub fn propose(
        product_one_id: ProductId,
        product_two_id: ProductId,
        created_at: DateTime<Utc>,
    ) -> Result<Self, MatchValidationError> {
        Self::new(MatchDraft {
            id: MatchId::random(),
            product_one_id,
            product_two_id,
            is_confirmed: false,
            product_one_is_requested: false,
            product_two_is_requested: false,
            product_one_is_reviewed: false,
            product_two_is_reviewed: false,
            revision: 1,
            created_at,
        })
    }

    /// Validate persisted match data.
    pub fn new(draft: MatchDraft) -> Result<Self, MatchValidationError> {
        if draft.product_one_id == draft.product_two_id {
            return Err(MatchValidationError::SameProduct);
        }
        if !draft.is_confirmed && draft.product_one_is_requested && draft.product_two_is_requested
        {
            return Err(MatchValidationError::BothSidesRequested);
        }
        if !draft.is_confirmed && (draft.product_one_is_reviewed || draft.product_two_is_reviewed)
        {
            return Err(MatchValidationError::ReviewedBeforeConfirmation);
        }
        if draft.revision == 0 {
            return Err(MatchValidationError::ZeroRevision);
        }

        Ok(Self {
            id: draft.id,
            product_one_id: draft.product_one_id,
            product_two_id: draft.product_two_id,
            is_confirmed: draft.is_confirmed,
            requested: [
                draft.product_one_is_requested,
                draft.product_two_is_requested,
            ],
            reviewed: [draft.product_one_is_reviewed, draft.product_two_is_reviewed],
            revision: draft.revision,
            created_at: draft.created_at,
        })
    }

    /// Stable match identifier.
    pub fn id(&self) -> MatchId {
        self.id
    }

    /// Product whose like completed the pair.
    pub fn product_one_id(&self) -> ProductId {
        self.product_one_id
    }

    /// Product liked first.
    pub fn product_two_id(&self) -> ProductId {
        self.product_two_id
    }

    /// Whether the match ended in a swap.
    pub fn is_confirmed(&self) -> bool {
        self.is_confirmed
    }

    /// Counter bumped by every transition; stores compare it on commit.
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// When the match was proposed.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Product occupying `side`.
    pub fn product(&self, side: MatchSide) -> ProductId {
        match side {
            MatchSide::One => self.product_one_id,
            MatchSide::Two => self.product_two_id,
        }
    }

    /// Side occupied by `product_id`, if it is part of this match.
    pub fn side_of(&self, product_id: ProductId) -> Option<MatchSide> {
        if product_id == self.product_one_id {
            Some(MatchSide::One)
        } else if product_id == self.product_two_id {
            Some(MatchSide::Two)
        } else {
            None
        }
    }

    /// Product facing `product_id`, if it is part of this match.
    pub fn opposite_product(&self, product_id: ProductId) -> Option<ProductId> {
        self.side_of(product_id)
            .map(|side| self.product(side.opposite()))
    }

    /// Whether this match joins `a` and `b`, in either order.
    pub fn pairs(&self, a: ProductId, b: ProductId) -> bool {
        (self.product_one_id == a && self.product_two_id == b)
            || (self.product_one_id == b && self.product_two_id == a)
    }

    /// Whether `side` has a request outstanding.
    pub fn is_requested_by(&self, side: MatchSide) -> bool {
        self.requested[slot(side)]
    }

    /// Whether `side` has reviewed the swap.
    pub fn is_reviewed_by(&self, side: MatchSide) -> bool {
        self.reviewed[slot(side)]
    }

    /// An unconfirmed match with either request flag set.
    pub fn has_outstanding_request(&self) -> bool {
        !self.is_confirmed && self.requested.iter().any(|flag| *flag)
    }

    /// Lifecycle state derived from the flags.
    pub fn state(&self) -> MatchState {
        if self.is_confirmed {
            MatchState::Confirmed
        } else if self.requested[0] {
            MatchState::Requested(MatchSide::One)
        } else if self.requested[1] {
            MatchState::Requested(MatchSide::Two)
        } else {
            MatchState::Pending
        }
    }

    /// `side` asks to proceed with the swap.
    pub fn request(&mut self, side: MatchSide) -> Result<(), MatchTransitionError> {
        if self.is_confirmed {
            return Err(MatchTransitionError::Confirmed);
        }
        if self.is_requested_by(side.opposite()) {
            return Err(MatchTransitionError::OpposingRequested);
        }
        if self.is_requested_by(side) {
            return Err(MatchTransitionError::AlreadyRequested);
        }
        self.requested[slot(side)] = true;
        self.bump();
        Ok(())
    }

    /// `side` withdraws its outstanding request, returning to pending.
    pub fn cancel(&mut self, side: MatchSide) -> Result<(), MatchTransitionError> {
        if self.is_confirmed {
            return Err(MatchTransitionError::Confirmed);
        }
        if !self.is_requested_by(side) {
            return Err(MatchTransitionError::NothingToCancel);
        }
        self.requested[slot(side)] = false;
        self.bump();
        Ok(())
    }

    /// `accepting` confirms the opposing side's request. Request flags are
    /// left as they were; confirmation alone marks the terminal state.
    pub fn confirm(&mut self, accepting: MatchSide) -> Result<(), MatchTransitionError> {
        if self.is_confirmed {
            return Err(MatchTransitionError::Confirmed);
        }
        if !self.is_requested_by(accepting.opposite()) {
            return Err(MatchTransitionError::NothingToAccept);
        }
        self.is_confirmed = true;
        self.bump();
        Ok(())
    }

    /// Record that `side` reviewed its counterpart after the swap.
    pub fn mark_reviewed(&mut self, side: MatchSide) -> Result<(), MatchTransitionError> {
        if !self.is_confirmed {
            return Err(MatchTransitionError::NotConfirmed);
        }
        if self.is_reviewed_by(side) {
            return Err(MatchTransitionError::AlreadyReviewed);
        }
        self.reviewed[slot(side)] = true;
        self.bump();
        Ok(())
    }

    fn bump(&mut self) {
        self.revision = self.revision.saturating_add(1);
    }
}
