//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod marketplace_store;
mod push_notifier;
mod swap_command;
mod swap_query;

#[cfg(test)]
pub use marketplace_store::MockMarketplaceStore;
pub use marketplace_store::{DeviceToken, FixtureMarketplaceStore, MarketplaceStore, StoreError};
#[cfg(test)]
pub use push_notifier::MockPushNotifier;
pub use push_notifier::{NoOpPushNotifier, PushMessage, PushNotifier, PushNotifierError};
#[cfg(test)]
pub use swap_command::MockSwapCommand;
pub(crate) use swap_command::build_listing;
pub use swap_command::{
    DeleteProductRequest, DeleteProductResponse, DeletionOutcome, FixtureSwapCommand,
    LikePayload, LikeProductResponse, ListProductRequest, ListProductResponse,
    MatchActionRequest, MatchActionResponse, MatchPayload, ProductLikeRequest, ProductPayload,
    SwapCommand, UnlikeProductResponse,
};
#[cfg(test)]
pub use swap_query::MockSwapQuery;
pub use swap_query::{
    FixtureSwapQuery, GetMatchResponse, GetProductResponse, ListProductMatchesResponse, SwapQuery,
};
