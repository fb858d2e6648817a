//! A user's expressed interest in another user's product.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ProductId, UserId};

/// `user_id` likes `product_id`. Unique per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Like {
    /// Record that `user_id` likes `product_id`.
    pub fn new(product_id: ProductId, user_id: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            product_id,
            user_id,
            created_at,
        }
    }
}
