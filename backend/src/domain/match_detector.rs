//! Reciprocal-like match detection.
//!
//! When user `U` likes product `P`, every available product `Q` owned by `U`
//! that `P`'s creator has already liked becomes a match candidate, provided
//! the two price ranges overlap and the pair is not matched yet. Detection is
//! pure: callers load the inputs under the product locks and persist the
//! proposals inside the like unit.

use chrono::{DateTime, Utc};

use crate::domain::{Like, Match, Product, UserId};

/// Inputs gathered for one like event.
#[derive(Debug, Clone, Copy)]
pub struct LikeContext<'a> {
    /// The product that was just liked.
    pub liked: &'a Product,
    /// The user who liked it.
    pub liker: UserId,
    /// Products owned by `liker`.
    pub liker_products: &'a [Product],
    /// Likes placed by the liked product's creator.
    pub reciprocal_likes: &'a [Like],
    /// Matches already involving the liked product.
    pub existing_matches: &'a [Match],
}

/// Products of the liker that qualify for a new match with the liked product.
pub fn find_candidates<'a>(ctx: &LikeContext<'a>) -> Vec<&'a Product> {
    let liked = ctx.liked;
    ctx.liker_products
        .iter()
        .filter(|candidate| candidate.creator() == ctx.liker)
        .filter(|candidate| candidate.id() != liked.id())
        .filter(|candidate| candidate.is_available())
        .filter(|candidate| {
            ctx.reciprocal_likes.iter().any(|like| {
                like.user_id == liked.creator() && like.product_id == candidate.id()
            })
        })
        .filter(|candidate| liked.price().overlaps(&candidate.price()))
        .filter(|candidate| {
            !ctx
                .existing_matches
                .iter()
                .any(|existing| existing.pairs(liked.id(), candidate.id()))
        })
        .collect()
}

/// Propose one pending match per candidate, liked product on side one.
pub fn detect_matches(ctx: &LikeContext<'_>, now: DateTime<Utc>) -> Vec<Match> {
    find_candidates(ctx)
        .into_iter()
        .filter_map(|candidate| Match::propose(ctx.liked.id(), candidate.id(), now).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    use crate::domain::{PriceRange, ProductDraft};

    fn product(creator: UserId, min: u32, max: u32) -> Product {
        let price = PriceRange::new(min, max).expect("valid price range");
        Product::new(ProductDraft::listing(
            creator,
            "Denim jacket",
            "outerwear",
            price,
            Utc::now(),
        ))
        .expect("valid product")
    }

    struct Market {
        alice: UserId,
        bob: UserId,
    }

    #[fixture]
    fn market() -> Market {
        Market {
            alice: UserId::random(),
            bob: UserId::random(),
        }
    }

    #[rstest]
    #[case::overlapping(45, 55, true)]
    #[case::touching_bound(50, 60, true)]
    #[case::disjoint(60, 70, false)]
    fn price_overlap_decides_matching(
        market: Market,
        #[case] min: u32,
        #[case] max: u32,
        #[case] expected: bool,
    ) {
        let liked = product(market.alice, 40, 50);
        let own = product(market.bob, min, max);
        let reciprocal = [Like::new(own.id(), market.alice, Utc::now())];
        let liker_products = [own];
        let ctx = LikeContext {
            liked: &liked,
            liker: market.bob,
            liker_products: &liker_products,
            reciprocal_likes: &reciprocal,
            existing_matches: &[],
        };

        let matches = detect_matches(&ctx, Utc::now());

        assert_eq!(matches.len() == 1, expected);
        if let Some(created) = matches.first() {
            assert_eq!(created.product_one_id(), liked.id());
            assert_eq!(created.product_two_id(), liker_products[0].id());
            assert!(!created.is_confirmed());
        }
    }

    #[rstest]
    fn no_reciprocal_like_means_no_match(market: Market) {
        let liked = product(market.alice, 10, 20);
        let liker_products = [product(market.bob, 10, 20)];
        let ctx = LikeContext {
            liked: &liked,
            liker: market.bob,
            liker_products: &liker_products,
            reciprocal_likes: &[],
            existing_matches: &[],
        };

        assert!(find_candidates(&ctx).is_empty());
    }

    #[rstest]
    fn existing_pair_is_not_rematched(market: Market) {
        let liked = product(market.alice, 10, 20);
        let own = product(market.bob, 10, 20);
        let existing =
            Match::propose(own.id(), liked.id(), Utc::now()).expect("distinct products");
        let reciprocal = [Like::new(own.id(), market.alice, Utc::now())];
        let liker_products = [own];
        let existing_matches = [existing];
        let ctx = LikeContext {
            liked: &liked,
            liker: market.bob,
            liker_products: &liker_products,
            reciprocal_likes: &reciprocal,
            existing_matches: &existing_matches,
        };

        assert!(find_candidates(&ctx).is_empty());
    }

    #[rstest]
    fn swapped_products_are_skipped(market: Market) {
        let liked = product(market.alice, 10, 20);
        let mut own = product(market.bob, 10, 20);
        own.mark_swapped();
        let reciprocal = [Like::new(own.id(), market.alice, Utc::now())];
        let liker_products = [own];
        let ctx = LikeContext {
            liked: &liked,
            liker: market.bob,
            liker_products: &liker_products,
            reciprocal_likes: &reciprocal,
            existing_matches: &[],
        };

        assert!(find_candidates(&ctx).is_empty());
    }

    #[rstest]
    fn every_qualifying_product_gets_a_match(market: Market) {
        let liked = product(market.alice, 10, 20);
        let first = product(market.bob, 15, 25);
        let second = product(market.bob, 5, 10);
        let reciprocal = [
            Like::new(first.id(), market.alice, Utc::now()),
            Like::new(second.id(), market.alice, Utc::now()),
        ];
        let liker_products = [first, second];
        let ctx = LikeContext {
            liked: &liked,
            liker: market.bob,
            liker_products: &liker_products,
            reciprocal_likes: &reciprocal,
            existing_matches: &[],
        };

        let matches = detect_matches(&ctx, Utc::now());
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.product_one_id() == liked.id()));
    }
}
