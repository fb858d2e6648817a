//! Transactional guard checks and write application.

use std::collections::{BTreeSet, HashMap};

use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::StoreError;
use crate::domain::{Guard, MatchId, UnitOfWork, UserId, Write};

use super::super::schema::{likes, matches, notifications, product_match_links, products};
use super::mapping::{
    like_row, link_row, match_flags, match_row, notification_row, product_row,
};

/// Failure inside the commit transaction; any variant rolls the unit back.
#[derive(Debug)]
pub(super) enum CommitError {
    Diesel(diesel::result::Error),
    Guard(String),
    Store(StoreError),
}

impl From<diesel::result::Error> for CommitError {
    fn from(value: diesel::result::Error) -> Self {
        Self::Diesel(value)
    }
}

impl From<StoreError> for CommitError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

#[derive(Debug, Clone, Copy)]
struct ProductFlags {
    is_swapped: bool,
    is_deleted: bool,
}

/// Lock every product row the guards inspect, in ascending id order.
async fn lock_guarded_products(
    conn: &mut AsyncPgConnection,
    guards: &[Guard],
) -> Result<HashMap<Uuid, ProductFlags>, CommitError> {
    let ids: BTreeSet<Uuid> = guards
        .iter()
        .filter_map(|guard| match guard {
            Guard::ProductAvailable(id) | Guard::ProductSwapped(id) => Some(*id.as_uuid()),
            Guard::DependentsUnchanged { product_id, .. } => Some(*product_id.as_uuid()),
            _ => None,
        })
        .collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, bool, bool)> = products::table
        .filter(products::id.eq_any(ids.iter().copied().collect::<Vec<_>>()))
        .order(products::id.asc())
        .select((products::id, products::is_swapped, products::is_deleted))
        .for_update()
        .load(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(id, is_swapped, is_deleted)| {
            (
                id,
                ProductFlags {
                    is_swapped,
                    is_deleted,
                },
            )
        })
        .collect())
}

async fn like_exists(
    conn: &mut AsyncPgConnection,
    product_id: Uuid,
    user_id: Uuid,
) -> Result<bool, CommitError> {
    let found = diesel::select(exists(
        likes::table
            .filter(likes::product_id.eq(product_id))
            .filter(likes::user_id.eq(user_id)),
    ))
    .get_result(conn)
    .await?;
    Ok(found)
}

async fn guard_holds(
    conn: &mut AsyncPgConnection,
    guard: &Guard,
    locked: &HashMap<Uuid, ProductFlags>,
) -> Result<bool, CommitError> {
    let holds = match guard {
        Guard::ProductAvailable(id) => locked
            .get(id.as_uuid())
            .is_some_and(|flags| !flags.is_swapped && !flags.is_deleted),
        Guard::ProductSwapped(id) => locked
            .get(id.as_uuid())
            .is_some_and(|flags| flags.is_swapped),
        Guard::LikeAbsent {
            product_id,
            user_id,
        } => !like_exists(conn, *product_id.as_uuid(), *user_id.as_uuid()).await?,
        Guard::LikePresent {
            product_id,
            user_id,
        } => like_exists(conn, *product_id.as_uuid(), *user_id.as_uuid()).await?,
        Guard::PairUnmatched { first, second } => {
            let (a, b) = (*first.as_uuid(), *second.as_uuid());
            let taken: bool = diesel::select(exists(matches::table.filter(
                (matches::product_one_id.eq(a).and(matches::product_two_id.eq(b)))
                    .or(matches::product_one_id.eq(b).and(matches::product_two_id.eq(a))),
            )))
            .get_result(conn)
            .await?;
            !taken
        }
        Guard::MatchRevision { match_id, revision } => {
            let stored: Option<i32> = matches::table
                .filter(matches::id.eq(match_id.as_uuid()))
                .select(matches::revision)
                .for_update()
                .first(conn)
                .await
                .optional()?;
            stored.and_then(|value| u32::try_from(value).ok()) == Some(*revision)
        }
        Guard::DependentsUnchanged {
            product_id,
            match_ids,
            liker_ids,
        } => {
            let id = *product_id.as_uuid();
            let current_matches: BTreeSet<MatchId> = matches::table
                .filter(matches::product_one_id.eq(id).or(matches::product_two_id.eq(id)))
                .select(matches::id)
                .load::<Uuid>(conn)
                .await?
                .into_iter()
                .map(MatchId::from_uuid)
                .collect();
            let current_likers: BTreeSet<UserId> = likes::table
                .filter(likes::product_id.eq(id))
                .select(likes::user_id)
                .load::<Uuid>(conn)
                .await?
                .into_iter()
                .map(UserId::from_uuid)
                .collect();
            current_matches == *match_ids && current_likers == *liker_ids
        }
    };
    Ok(holds)
}

fn expect_rows(affected: usize, what: &str) -> Result<(), CommitError> {
    if affected == 0 {
        return Err(CommitError::Store(StoreError::query(format!(
            "{what} does not exist"
        ))));
    }
    Ok(())
}

async fn apply_write(conn: &mut AsyncPgConnection, write: &Write) -> Result<(), CommitError> {
    match write {
        Write::InsertProduct(product) => {
            diesel::insert_into(products::table)
                .values(&product_row(product)?)
                .execute(conn)
                .await?;
            let links: Vec<_> = product
                .match_links()
                .iter()
                .map(|link| link_row(product.id(), *link))
                .collect();
            if !links.is_empty() {
                diesel::insert_into(product_match_links::table)
                    .values(&links)
                    .execute(conn)
                    .await?;
            }
        }
        Write::InsertLike(like) => {
            diesel::insert_into(likes::table)
                .values(&like_row(like))
                .execute(conn)
                .await?;
        }
        Write::DeleteLike {
            product_id,
            user_id,
        } => {
            diesel::delete(
                likes::table
                    .filter(likes::product_id.eq(product_id.as_uuid()))
                    .filter(likes::user_id.eq(user_id.as_uuid())),
            )
            .execute(conn)
            .await?;
        }
        Write::InsertMatch(swap_match) => {
            diesel::insert_into(matches::table)
                .values(&match_row(swap_match)?)
                .execute(conn)
                .await?;
        }
        Write::UpdateMatch(swap_match) => {
            let match_id = swap_match.id();
            let target = matches::table.filter(matches::id.eq(match_id.as_uuid()));
            let affected = diesel::update(target)
                .set(&match_flags(swap_match)?)
                .execute(conn)
                .await?;
            expect_rows(affected, "match")?;
        }
        Write::DeleteMatch(id) => {
            diesel::delete(matches::table.filter(matches::id.eq(id.as_uuid())))
                .execute(conn)
                .await?;
        }
        Write::AttachMatchLink { product_id, link } => {
            diesel::insert_into(product_match_links::table)
                .values(&link_row(*product_id, *link))
                .on_conflict((product_match_links::product_id, product_match_links::match_id))
                .do_nothing()
                .execute(conn)
                .await?;
        }
        Write::DetachMatchLinks {
            product_id,
            match_ids,
        } => {
            let ids: Vec<Uuid> = match_ids.iter().map(|id| *id.as_uuid()).collect();
            diesel::delete(
                product_match_links::table
                    .filter(product_match_links::product_id.eq(product_id.as_uuid()))
                    .filter(product_match_links::match_id.eq_any(ids)),
            )
            .execute(conn)
            .await?;
        }
        Write::MarkSwapped(id) => {
            let affected = diesel::update(products::table.filter(products::id.eq(id.as_uuid())))
                .set(products::is_swapped.eq(true))
                .execute(conn)
                .await?;
            expect_rows(affected, "product")?;
        }
        Write::MarkDeleted(id) => {
            let affected = diesel::update(products::table.filter(products::id.eq(id.as_uuid())))
                .set(products::is_deleted.eq(true))
                .execute(conn)
                .await?;
            expect_rows(affected, "product")?;
        }
        Write::DeleteProduct(id) => {
            diesel::delete(
                product_match_links::table.filter(product_match_links::product_id.eq(id.as_uuid())),
            )
            .execute(conn)
            .await?;
            diesel::delete(products::table.filter(products::id.eq(id.as_uuid())))
                .execute(conn)
                .await?;
        }
        Write::InsertNotification(notification) => {
            diesel::insert_into(notifications::table)
                .values(&notification_row(notification))
                .execute(conn)
                .await?;
        }
        Write::DeleteNotification(id) => {
            diesel::delete(notifications::table.filter(notifications::id.eq(id.as_uuid())))
                .execute(conn)
                .await?;
        }
    }
    Ok(())
}

/// Check every guard under row locks, then apply the writes in order.
pub(super) async fn apply_unit(
    conn: &mut AsyncPgConnection,
    unit: &UnitOfWork,
) -> Result<(), CommitError> {
    let locked = lock_guarded_products(conn, unit.guards()).await?;
    for guard in unit.guards() {
        if !guard_holds(conn, guard, &locked).await? {
            debug!(unit = unit.label(), %guard, "guard rejected unit");
            return Err(CommitError::Guard(format!("{guard} no longer holds")));
        }
    }
    for write in unit.writes() {
        apply_write(conn, write).await?;
    }
    Ok(())
}
