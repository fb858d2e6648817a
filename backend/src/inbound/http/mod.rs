//! HTTP inbound adapter exposing the marketplace REST endpoints.

pub mod error;
pub mod health;
pub mod matches;
pub mod products;
pub mod schemas;
pub mod state;
mod validation;

pub use error::ApiResult;
