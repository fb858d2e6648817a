//! Conversions between marketplace rows and domain entities.

use crate::domain::ports::{DeviceToken, StoreError};
use crate::domain::{
    Like, Match, MatchDraft, MatchId, MatchLink, MatchSide, Notification, NotificationId,
    NotificationKind, PriceRange, Product, ProductDraft, ProductId, UserId,
};

use super::super::models::{
    DeviceTokenRow, LikeRow, MatchFlagsUpdate, MatchLinkRow, MatchRow, NewMatchLinkRow,
    NotificationRow, ProductRow,
};

fn price_to_column(value: u32) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::query("price exceeds column range"))
}

fn price_from_column(value: i32) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::query("negative price in products row"))
}

fn revision_to_column(value: u32) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::query("match revision overflow"))
}

pub(super) fn product_from_rows(
    row: ProductRow,
    links: Vec<MatchLinkRow>,
) -> Result<Product, StoreError> {
    let price = PriceRange::new(
        price_from_column(row.min_price)?,
        price_from_column(row.max_price)?,
    )
    .map_err(|err| StoreError::query(format!("invalid products row: {err}")))?;
    Product::new(ProductDraft {
        id: ProductId::from_uuid(row.id),
        creator: UserId::from_uuid(row.creator_id),
        title: row.title,
        category: row.category,
        price,
        is_swapped: row.is_swapped,
        is_deleted: row.is_deleted,
        match_links: links
            .into_iter()
            .map(|link| MatchLink {
                match_id: MatchId::from_uuid(link.match_id),
                product_id: ProductId::from_uuid(link.linked_product_id),
            })
            .collect(),
        created_at: row.created_at,
    })
    .map_err(|err| StoreError::query(format!("invalid products row: {err}")))
}

pub(super) fn product_row(product: &Product) -> Result<ProductRow, StoreError> {
    Ok(ProductRow {
        id: *product.id().as_uuid(),
        creator_id: *product.creator().as_uuid(),
        title: product.title().to_owned(),
        category: product.category().to_owned(),
        min_price: price_to_column(product.price().min())?,
        max_price: price_to_column(product.price().max())?,
        is_swapped: product.is_swapped(),
        is_deleted: product.is_deleted(),
        created_at: product.created_at(),
    })
}

pub(super) fn link_row(product_id: ProductId, link: MatchLink) -> NewMatchLinkRow {
    NewMatchLinkRow {
        product_id: *product_id.as_uuid(),
        match_id: *link.match_id.as_uuid(),
        linked_product_id: *link.product_id.as_uuid(),
    }
}

pub(super) fn match_from_row(row: MatchRow) -> Result<Match, StoreError> {
    let revision = u32::try_from(row.revision)
        .map_err(|_| StoreError::query("negative revision in matches row"))?;
    Match::new(MatchDraft {
        id: MatchId::from_uuid(row.id),
        product_one_id: ProductId::from_uuid(row.product_one_id),
        product_two_id: ProductId::from_uuid(row.product_two_id),
        is_confirmed: row.is_confirmed,
        product_one_is_requested: row.product_one_is_requested,
        product_two_is_requested: row.product_two_is_requested,
        product_one_is_reviewed: row.product_one_is_reviewed,
        product_two_is_reviewed: row.product_two_is_reviewed,
        revision,
        created_at: row.created_at,
    })
    .map_err(|err| StoreError::query(format!("invalid matches row: {err}")))
}

pub(super) fn match_row(swap_match: &Match) -> Result<MatchRow, StoreError> {
    let flags = match_flags(swap_match)?;
    Ok(MatchRow {
        id: *swap_match.id().as_uuid(),
        product_one_id: *swap_match.product_one_id().as_uuid(),
        product_two_id: *swap_match.product_two_id().as_uuid(),
        is_confirmed: flags.is_confirmed,
        product_one_is_requested: flags.product_one_is_requested,
        product_two_is_requested: flags.product_two_is_requested,
        product_one_is_reviewed: flags.product_one_is_reviewed,
        product_two_is_reviewed: flags.product_two_is_reviewed,
        revision: flags.revision,
        created_at: swap_match.created_at(),
    })
}

pub(super) fn match_flags(swap_match: &Match) -> Result<MatchFlagsUpdate, StoreError> {
    Ok(MatchFlagsUpdate {
        is_confirmed: swap_match.is_confirmed(),
        product_one_is_requested: swap_match.is_requested_by(MatchSide::One),
        product_two_is_requested: swap_match.is_requested_by(MatchSide::Two),
        product_one_is_reviewed: swap_match.is_reviewed_by(MatchSide::One),
        product_two_is_reviewed: swap_match.is_reviewed_by(MatchSide::Two),
        revision: revision_to_column(swap_match.revision())?,
    })
}

pub(super) fn like_from_row(row: LikeRow) -> Like {
    Like::new(
        ProductId::from_uuid(row.product_id),
        UserId::from_uuid(row.user_id),
        row.created_at,
    )
}

pub(super) fn like_row(like: &Like) -> LikeRow {
    LikeRow {
        product_id: *like.product_id.as_uuid(),
        user_id: *like.user_id.as_uuid(),
        created_at: like.created_at,
    }
}

pub(super) fn notification_from_row(row: NotificationRow) -> Result<Notification, StoreError> {
    let kind = row
        .kind
        .parse::<NotificationKind>()
        .map_err(|err| StoreError::query(format!("invalid notifications row: {err}")))?;
    Ok(Notification {
        id: NotificationId::from_uuid(row.id),
        creator: UserId::from_uuid(row.creator_id),
        target_user: UserId::from_uuid(row.target_user_id),
        product_id: row.product_id.map(ProductId::from_uuid),
        matched_product_id: row.matched_product_id.map(ProductId::from_uuid),
        description: row.description,
        kind,
        is_read: row.is_read,
        created_at: row.created_at,
    })
}

pub(super) fn notification_row(notification: &Notification) -> NotificationRow {
    NotificationRow {
        id: *notification.id.as_uuid(),
        creator_id: *notification.creator.as_uuid(),
        target_user_id: *notification.target_user.as_uuid(),
        product_id: notification.product_id.map(|id| *id.as_uuid()),
        matched_product_id: notification.matched_product_id.map(|id| *id.as_uuid()),
        description: notification.description.clone(),
        kind: notification.kind.as_str().to_owned(),
        is_read: notification.is_read,
        created_at: notification.created_at,
    }
}

pub(super) fn device_token_from_row(row: DeviceTokenRow) -> DeviceToken {
    DeviceToken {
        user_id: UserId::from_uuid(row.user_id),
        token: row.token,
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for row conversions.
    use chrono::Utc;
    use rstest::rstest;
    use uuid::Uuid;

    use super::*;

    fn product_row_fixture(min_price: i32, max_price: i32) -> ProductRow {
        ProductRow {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            title: "Raincoat".to_owned(),
            category: "outerwear".to_owned(),
            min_price,
            max_price,
            is_swapped: false,
            is_deleted: false,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn product_rows_keep_link_order() {
        let row = product_row_fixture(10, 20);
        let links: Vec<_> = (0..3)
            .map(|_| MatchLinkRow {
                product_id: row.id,
                match_id: Uuid::new_v4(),
                linked_product_id: Uuid::new_v4(),
            })
            .collect();
        let expected: Vec<_> = links.iter().map(|link| link.match_id).collect();

        let product = product_from_rows(row, links).expect("valid row");

        let actual: Vec<_> = product
            .match_links()
            .iter()
            .map(|link| *link.match_id.as_uuid())
            .collect();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::negative_price(-1, 20)]
    #[case::inverted_range(30, 20)]
    fn corrupt_product_rows_are_query_errors(#[case] min: i32, #[case] max: i32) {
        let err = product_from_rows(product_row_fixture(min, max), Vec::new())
            .expect_err("corrupt row rejected");
        assert!(matches!(err, StoreError::Query { .. }));
    }

    #[rstest]
    fn unknown_notification_kind_is_query_error() {
        let row = NotificationRow {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            target_user_id: Uuid::new_v4(),
            product_id: None,
            matched_product_id: None,
            description: "hello".to_owned(),
            kind: "POKE".to_owned(),
            is_read: false,
            created_at: Utc::now(),
        };
        let err = notification_from_row(row).expect_err("unknown kind");
        assert!(err.to_string().contains("POKE"));
    }

    #[rstest]
    fn match_rows_preserve_flags_and_revision() {
        let mut swap_match = Match::propose(ProductId::random(), ProductId::random(), Utc::now())
            .expect("distinct products");
        swap_match
            .request(MatchSide::Two)
            .expect("pending match accepts request");

        let row = match_row(&swap_match).expect("revision fits");
        assert!(row.product_two_is_requested);
        assert_eq!(row.revision, 2);
        assert_eq!(match_from_row(row).expect("valid row"), swap_match);
    }
}
