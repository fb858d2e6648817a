//! Notification records raised as side effects of marketplace events.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{NotificationId, ProductId, UserId};

/// Event category carried by a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Like,
    Request,
    Swap,
    Match,
    Review,
    /// Raised by the social layer; never emitted by the swap engine.
    Follow,
}

impl NotificationKind {
    /// Stored and serialised representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "LIKE",
            Self::Request => "REQUEST",
            Self::Swap => "SWAP",
            Self::Match => "MATCH",
            Self::Review => "REVIEW",
            Self::Follow => "FOLLOW",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown notification kind label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown notification kind: {0}")]
pub struct UnknownNotificationKind(pub String);

impl FromStr for NotificationKind {
    type Err = UnknownNotificationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIKE" => Ok(Self::Like),
            "REQUEST" => Ok(Self::Request),
            "SWAP" => Ok(Self::Swap),
            "MATCH" => Ok(Self::Match),
            "REVIEW" => Ok(Self::Review),
            "FOLLOW" => Ok(Self::Follow),
            other => Err(UnknownNotificationKind(other.to_owned())),
        }
    }
}

/// A notification addressed to `target_user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    /// The actor whose action raised the notification.
    pub creator: UserId,
    /// The recipient.
    pub target_user: UserId,
    pub product_id: Option<ProductId>,
    pub matched_product_id: Option<ProductId>,
    pub description: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Whether this record points at `product_id` in either product field.
    pub fn references(&self, product_id: ProductId) -> bool {
        self.product_id == Some(product_id) || self.matched_product_id == Some(product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(NotificationKind::Like)]
    #[case(NotificationKind::Swap)]
    #[case(NotificationKind::Follow)]
    fn kinds_parse_their_own_labels(#[case] kind: NotificationKind) {
        assert_eq!(kind.as_str().parse::<NotificationKind>(), Ok(kind));
    }

    #[rstest]
    fn kind_serialises_upper_case() {
        let value = serde_json::to_value(NotificationKind::Request).expect("serialise");
        assert_eq!(value, serde_json::json!("REQUEST"));
    }

    #[rstest]
    fn rejects_unknown_labels() {
        assert!("POKE".parse::<NotificationKind>().is_err());
    }
}
