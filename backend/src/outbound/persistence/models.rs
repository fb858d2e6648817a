//! Internal Diesel row structs for marketplace tables.
//!
//! Rows never leave the persistence layer; conversions into domain entities
//! re-run entity validation so corrupt rows surface as query errors.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{device_tokens, likes, matches, notifications, product_match_links, products};

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProductRow {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub category: String,
    pub min_price: i32,
    pub max_price: i32,
    pub is_swapped: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = likes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LikeRow {
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = matches)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MatchRow {
    pub id: Uuid,
    pub product_one_id: Uuid,
    pub product_two_id: Uuid,
    pub is_confirmed: bool,
    pub product_one_is_requested: bool,
    pub product_two_is_requested: bool,
    pub product_one_is_reviewed: bool,
    pub product_two_is_reviewed: bool,
    pub revision: i32,
    pub created_at: DateTime<Utc>,
}

/// Mutable match columns written by the request workflow.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = matches)]
pub(crate) struct MatchFlagsUpdate {
    pub is_confirmed: bool,
    pub product_one_is_requested: bool,
    pub product_two_is_requested: bool,
    pub product_one_is_reviewed: bool,
    pub product_two_is_reviewed: bool,
    pub revision: i32,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = product_match_links)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MatchLinkRow {
    pub product_id: Uuid,
    pub match_id: Uuid,
    pub linked_product_id: Uuid,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = product_match_links)]
pub(crate) struct NewMatchLinkRow {
    pub product_id: Uuid,
    pub match_id: Uuid,
    pub linked_product_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub target_user_id: Uuid,
    pub product_id: Option<Uuid>,
    pub matched_product_id: Option<Uuid>,
    pub description: String,
    pub kind: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = device_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DeviceTokenRow {
    pub user_id: Uuid,
    pub token: String,
}
