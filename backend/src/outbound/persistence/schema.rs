//! Diesel table definitions for the marketplace schema.
//!
//! These must match `backend/migrations` exactly; regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Listed products. `is_deleted` implies `is_swapped`.
    products (id) {
        id -> Uuid,
        creator_id -> Uuid,
        title -> Varchar,
        category -> Text,
        min_price -> Int4,
        max_price -> Int4,
        is_swapped -> Bool,
        is_deleted -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per (product, user) like.
    likes (product_id, user_id) {
        product_id -> Uuid,
        user_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Matches between two products; unique per unordered pair.
    matches (id) {
        id -> Uuid,
        product_one_id -> Uuid,
        product_two_id -> Uuid,
        is_confirmed -> Bool,
        product_one_is_requested -> Bool,
        product_two_is_requested -> Bool,
        product_one_is_reviewed -> Bool,
        product_two_is_reviewed -> Bool,
        /// Optimistic concurrency counter.
        revision -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Ordered match pointers held by a product.
    product_match_links (product_id, match_id) {
        seq -> Int8,
        product_id -> Uuid,
        match_id -> Uuid,
        linked_product_id -> Uuid,
    }
}

diesel::table! {
    notifications (id) {
        id -> Uuid,
        creator_id -> Uuid,
        target_user_id -> Uuid,
        product_id -> Nullable<Uuid>,
        matched_product_id -> Nullable<Uuid>,
        description -> Text,
        /// Upper-case kind name, e.g. `MATCH`.
        kind -> Varchar,
        is_read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    device_tokens (user_id) {
        user_id -> Uuid,
        token -> Text,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(likes -> products (product_id));
diesel::joinable!(product_match_links -> products (product_id));

diesel::allow_tables_to_appear_in_same_query!(
    device_tokens,
    likes,
    matches,
    notifications,
    product_match_links,
    products,
);
