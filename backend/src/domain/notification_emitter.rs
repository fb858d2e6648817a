//! Translation of swap events into notification records and push plans.
//!
//! Records are persisted inside the originating unit of work. Pushes are
//! planned from the committed records and delivered afterwards by
//! [`crate::domain::push_dispatch`]. A recipient who collects
//! [`SUMMARY_THRESHOLD`] or more records from one operation receives a single
//! summary push instead of one push per record.

use chrono::{DateTime, Utc};

use crate::domain::{Notification, NotificationId, NotificationKind, Product, UserId};

/// Records per recipient at which pushes collapse into one summary.
pub const SUMMARY_THRESHOLD: usize = 4;

/// Core event raising notifications.
#[derive(Debug, Clone, Copy)]
pub enum SwapEvent<'a> {
    /// `liker` liked `product`.
    Liked { product: &'a Product, liker: UserId },
    /// A match was proposed between the liked product and a counterpart.
    Matched {
        liked: &'a Product,
        counterpart: &'a Product,
    },
    /// `requesting` asked to swap with `requested`.
    Requested {
        requesting: &'a Product,
        requested: &'a Product,
    },
    /// `accepting` confirmed the swap requested by `requesting`.
    Swapped {
        accepting: &'a Product,
        requesting: &'a Product,
    },
    /// The owner of `reviewer` reviewed the owner of `reviewed`.
    Reviewed {
        reviewer: &'a Product,
        reviewed: &'a Product,
    },
}

impl SwapEvent<'_> {
    /// Notification records this event raises.
    pub fn notifications(&self, now: DateTime<Utc>) -> Vec<Notification> {
        match *self {
            Self::Liked { product, liker } => vec![record(
                liker,
                product.creator(),
                Some(product),
                None,
                NotificationKind::Like,
                format!("Someone liked your \"{}\"", product.title()),
                now,
            )],
            Self::Matched { liked, counterpart } => vec![
                record(
                    counterpart.creator(),
                    liked.creator(),
                    Some(liked),
                    Some(counterpart),
                    NotificationKind::Match,
                    format!(
                        "Your \"{}\" matched with \"{}\"",
                        liked.title(),
                        counterpart.title()
                    ),
                    now,
                ),
                record(
                    liked.creator(),
                    counterpart.creator(),
                    Some(counterpart),
                    Some(liked),
                    NotificationKind::Match,
                    format!(
                        "Your \"{}\" matched with \"{}\"",
                        counterpart.title(),
                        liked.title()
                    ),
                    now,
                ),
            ],
            Self::Requested {
                requesting,
                requested,
            } => vec![record(
                requesting.creator(),
                requested.creator(),
                Some(requested),
                Some(requesting),
                NotificationKind::Request,
                format!(
                    "Swap requested: \"{}\" for your \"{}\"",
                    requesting.title(),
                    requested.title()
                ),
                now,
            )],
            Self::Swapped {
                accepting,
                requesting,
            } => vec![
                record(
                    accepting.creator(),
                    requesting.creator(),
                    Some(requesting),
                    Some(accepting),
                    NotificationKind::Swap,
                    format!(
                        "Swap confirmed: your \"{}\" for \"{}\"",
                        requesting.title(),
                        accepting.title()
                    ),
                    now,
                ),
                record(
                    requesting.creator(),
                    accepting.creator(),
                    Some(accepting),
                    Some(requesting),
                    NotificationKind::Swap,
                    format!(
                        "Swap confirmed: your \"{}\" for \"{}\"",
                        accepting.title(),
                        requesting.title()
                    ),
                    now,
                ),
            ],
            Self::Reviewed { reviewer, reviewed } => vec![record(
                reviewer.creator(),
                reviewed.creator(),
                Some(reviewed),
                Some(reviewer),
                NotificationKind::Review,
                format!("You received a review for \"{}\"", reviewed.title()),
                now,
            )],
        }
    }
}

fn record(
    creator: UserId,
    target_user: UserId,
    product: Option<&Product>,
    matched: Option<&Product>,
    kind: NotificationKind,
    description: String,
    created_at: DateTime<Utc>,
) -> Notification {
    Notification {
        id: NotificationId::random(),
        creator,
        target_user,
        product_id: product.map(Product::id),
        matched_product_id: matched.map(Product::id),
        description,
        kind,
        is_read: false,
        created_at,
    }
}

/// One push to deliver to a user once the unit has committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPush {
    pub recipient: UserId,
    pub title: String,
    pub body: String,
}

/// Plan pushes for `notifications`, grouped by recipient in first-seen order.
///
/// # Examples
/// ```
/// use swap_backend::domain::notification_emitter::plan_pushes;
///
/// assert!(plan_pushes(&[]).is_empty());
/// ```
pub fn plan_pushes(notifications: &[Notification]) -> Vec<PlannedPush> {
    let mut groups: Vec<(UserId, Vec<&Notification>)> = Vec::new();
    for notification in notifications {
        match groups
            .iter_mut()
            .find(|(recipient, _)| *recipient == notification.target_user)
        {
            Some((_, bucket)) => bucket.push(notification),
            None => groups.push((notification.target_user, vec![notification])),
        }
    }

    groups
        .into_iter()
        .flat_map(|(recipient, bucket)| {
            if bucket.len() >= SUMMARY_THRESHOLD {
                vec![PlannedPush {
                    recipient,
                    title: "New activity".to_owned(),
                    body: format!("You have {} new notifications", bucket.len()),
                }]
            } else {
                bucket
                    .into_iter()
                    .map(|notification| PlannedPush {
                        recipient,
                        title: push_title(notification.kind).to_owned(),
                        body: notification.description.clone(),
                    })
                    .collect()
            }
        })
        .collect()
}

const fn push_title(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Like => "New like",
        NotificationKind::Request => "Swap request",
        NotificationKind::Swap => "Swap confirmed",
        NotificationKind::Match => "It's a match",
        NotificationKind::Review => "New review",
        NotificationKind::Follow => "New follower",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    use crate::domain::{PriceRange, ProductDraft};

    fn product(title: &str) -> Product {
        let price = PriceRange::new(10, 20).expect("valid price range");
        Product::new(ProductDraft::listing(
            UserId::random(),
            title,
            "tops",
            price,
            Utc::now(),
        ))
        .expect("valid product")
    }

    #[fixture]
    fn pair() -> (Product, Product) {
        (product("Linen shirt"), product("Wool scarf"))
    }

    #[rstest]
    fn like_targets_product_creator(pair: (Product, Product)) {
        let (liked, _) = pair;
        let liker = UserId::random();
        let records = SwapEvent::Liked {
            product: &liked,
            liker,
        }
        .notifications(Utc::now());

        assert_eq!(records.len(), 1);
        let like = &records[0];
        assert_eq!(like.kind, NotificationKind::Like);
        assert_eq!(like.creator, liker);
        assert_eq!(like.target_user, liked.creator());
        assert_eq!(like.product_id, Some(liked.id()));
    }

    #[rstest]
    fn match_notifies_both_sides(pair: (Product, Product)) {
        let (liked, counterpart) = pair;
        let records = SwapEvent::Matched {
            liked: &liked,
            counterpart: &counterpart,
        }
        .notifications(Utc::now());

        let targets: Vec<_> = records.iter().map(|n| n.target_user).collect();
        assert_eq!(targets, vec![liked.creator(), counterpart.creator()]);
        assert!(records.iter().all(|n| n.kind == NotificationKind::Match));
    }

    #[rstest]
    fn request_notifies_opposing_creator(pair: (Product, Product)) {
        let (requesting, requested) = pair;
        let records = SwapEvent::Requested {
            requesting: &requesting,
            requested: &requested,
        }
        .notifications(Utc::now());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target_user, requested.creator());
        assert_eq!(records[0].matched_product_id, Some(requesting.id()));
    }

    #[rstest]
    fn swap_notifies_both_creators(pair: (Product, Product)) {
        let (accepting, requesting) = pair;
        let records = SwapEvent::Swapped {
            accepting: &accepting,
            requesting: &requesting,
        }
        .notifications(Utc::now());

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|n| n.kind == NotificationKind::Swap));
    }

    #[rstest]
    #[case::below_threshold(3, 3)]
    #[case::at_threshold(4, 1)]
    #[case::above_threshold(7, 1)]
    fn pushes_collapse_for_busy_recipients(#[case] records: usize, #[case] pushes: usize) {
        let liked = product("Canvas tote");
        let notifications: Vec<_> = (0..records)
            .flat_map(|_| {
                SwapEvent::Liked {
                    product: &liked,
                    liker: UserId::random(),
                }
                .notifications(Utc::now())
            })
            .collect();

        let plan = plan_pushes(&notifications);

        assert_eq!(plan.len(), pushes);
        assert!(plan.iter().all(|push| push.recipient == liked.creator()));
    }

    #[rstest]
    fn summary_counts_records() {
        let liked = product("Canvas tote");
        let notifications: Vec<_> = (0..5)
            .flat_map(|_| {
                SwapEvent::Liked {
                    product: &liked,
                    liker: UserId::random(),
                }
                .notifications(Utc::now())
            })
            .collect();

        let plan = plan_pushes(&notifications);

        assert_eq!(plan[0].body, "You have 5 new notifications");
    }

    #[rstest]
    fn recipients_are_batched_independently(pair: (Product, Product)) {
        let (liked, counterpart) = pair;
        let mut notifications = Vec::new();
        for _ in 0..4 {
            notifications.extend(
                SwapEvent::Liked {
                    product: &liked,
                    liker: counterpart.creator(),
                }
                .notifications(Utc::now()),
            );
        }
        notifications.extend(
            SwapEvent::Requested {
                requesting: &liked,
                requested: &counterpart,
            }
            .notifications(Utc::now()),
        );

        let plan = plan_pushes(&notifications);

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].title, "Swap request");
    }
}
