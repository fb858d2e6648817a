//! Best-effort delivery of planned pushes after a unit has committed.
//!
//! Delivery runs on a spawned task so callers never wait on the push service.
//! Missing device tokens and notifier failures are logged and dropped.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{Instrument, debug, warn};

use crate::domain::notification_emitter::PlannedPush;
use crate::domain::ports::{MarketplaceStore, PushMessage, PushNotifier};

/// Spawns push delivery for committed notifications.
pub struct PushDispatcher<S, P> {
    store: Arc<S>,
    notifier: Arc<P>,
}

impl<S, P> Clone for PushDispatcher<S, P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<S, P> PushDispatcher<S, P>
where
    S: MarketplaceStore + 'static,
    P: PushNotifier + 'static,
{
    /// Dispatcher reading tokens from `store` and sending through `notifier`.
    pub fn new(store: Arc<S>, notifier: Arc<P>) -> Self {
        Self { store, notifier }
    }

    /// Deliver `plan` in the background. Returns `None` for an empty plan.
    pub fn dispatch(&self, plan: Vec<PlannedPush>) -> Option<JoinHandle<()>> {
        if plan.is_empty() {
            return None;
        }
        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);
        let task = async move {
            for push in plan {
                deliver(store.as_ref(), notifier.as_ref(), push).await;
            }
        };
        Some(tokio::spawn(task.in_current_span()))
    }
}

async fn deliver<S, P>(store: &S, notifier: &P, push: PlannedPush)
where
    S: MarketplaceStore,
    P: PushNotifier,
{
    let recipient = push.recipient;
    let token = match store.find_device_token(recipient).await {
        Ok(Some(token)) => token,
        Ok(None) => {
            debug!(%recipient, "no device token; skipping push");
            return;
        }
        Err(err) => {
            warn!(%recipient, error = %err, "device token lookup failed; push dropped");
            return;
        }
    };

    let message = PushMessage {
        token: token.token,
        title: push.title,
        body: push.body,
    };
    if let Err(err) = notifier.send(&message).await {
        warn!(%recipient, error = %err, "push delivery failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::always;
    use rstest::rstest;

    use crate::domain::UserId;
    use crate::domain::ports::{
        DeviceToken, MockMarketplaceStore, MockPushNotifier, PushNotifierError,
    };

    fn planned(recipient: UserId) -> PlannedPush {
        PlannedPush {
            recipient,
            title: "New like".to_owned(),
            body: "Someone liked your \"Wool scarf\"".to_owned(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn empty_plan_spawns_nothing() {
        let dispatcher = PushDispatcher::new(
            Arc::new(MockMarketplaceStore::new()),
            Arc::new(MockPushNotifier::new()),
        );
        assert!(dispatcher.dispatch(Vec::new()).is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn sends_to_registered_token() {
        let recipient = UserId::random();
        let mut store = MockMarketplaceStore::new();
        store
            .expect_find_device_token()
            .times(1)
            .return_once(move |user| {
                Ok(Some(DeviceToken {
                    user_id: user,
                    token: "ExponentPushToken[xyz]".to_owned(),
                }))
            });
        let mut notifier = MockPushNotifier::new();
        notifier
            .expect_send()
            .withf(|message| message.token == "ExponentPushToken[xyz]")
            .times(1)
            .return_once(|_| Ok(()));

        let handle = PushDispatcher::new(Arc::new(store), Arc::new(notifier))
            .dispatch(vec![planned(recipient)])
            .expect("non-empty plan spawns");
        handle.await.expect("delivery task completes");
    }

    #[rstest]
    #[tokio::test]
    async fn missing_token_skips_send() {
        let mut store = MockMarketplaceStore::new();
        store
            .expect_find_device_token()
            .times(1)
            .return_once(|_| Ok(None));
        let mut notifier = MockPushNotifier::new();
        notifier.expect_send().never();

        let handle = PushDispatcher::new(Arc::new(store), Arc::new(notifier))
            .dispatch(vec![planned(UserId::random())])
            .expect("non-empty plan spawns");
        handle.await.expect("delivery task completes");
    }

    #[rstest]
    #[tokio::test]
    async fn failures_do_not_stop_remaining_pushes() {
        let mut store = MockMarketplaceStore::new();
        store.expect_find_device_token().times(2).returning(|user| {
            Ok(Some(DeviceToken {
                user_id: user,
                token: "ExponentPushToken[abc]".to_owned(),
            }))
        });
        let mut notifier = MockPushNotifier::new();
        let mut calls = 0_u8;
        notifier
            .expect_send()
            .with(always())
            .times(2)
            .returning(move |_| {
                calls += 1;
                if calls == 1 {
                    Err(PushNotifierError::transport("connection reset"))
                } else {
                    Ok(())
                }
            });

        let handle = PushDispatcher::new(Arc::new(store), Arc::new(notifier))
            .dispatch(vec![planned(UserId::random()), planned(UserId::random())])
            .expect("non-empty plan spawns");
        handle.await.expect("delivery task completes");
    }
}
