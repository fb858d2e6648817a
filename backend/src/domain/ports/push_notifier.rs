//! Driven port for outbound push delivery.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by push notifier adapters.
    pub enum PushNotifierError {
        /// The push service could not be reached.
        Transport { message: String } =>
            "push transport failed: {message}",
        /// The push service refused the message.
        Rejected { status: u16, message: String } =>
            "push rejected with status {status}: {message}",
        /// The push service did not answer in time.
        Timeout { message: String } =>
            "push timed out: {message}",
    }
}

/// Message addressed to one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
}

/// Port for sending a push to a device.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<(), PushNotifierError>;
}

/// Notifier that drops every message; used when push is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpPushNotifier;

#[async_trait]
impl PushNotifier for NoOpPushNotifier {
    async fn send(&self, _message: &PushMessage) -> Result<(), PushNotifierError> {
        Ok(())
    }
}
