//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they depend only
//! on the driving ports and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{FixtureSwapCommand, FixtureSwapQuery, SwapCommand, SwapQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub swaps: Arc<dyn SwapCommand>,
    pub swaps_query: Arc<dyn SwapQuery>,
}

impl HttpState {
    /// Construct state from explicit port implementations.
    pub fn new(swaps: Arc<dyn SwapCommand>, swaps_query: Arc<dyn SwapQuery>) -> Self {
        Self { swaps, swaps_query }
    }
}

impl Default for HttpState {
    fn default() -> Self {
        Self::new(Arc::new(FixtureSwapCommand), Arc::new(FixtureSwapQuery))
    }
}
