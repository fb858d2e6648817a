//! Push delivery adapters.

mod expo_http_notifier;

pub use expo_http_notifier::{DEFAULT_EXPO_ENDPOINT, ExpoHttpNotifier};
