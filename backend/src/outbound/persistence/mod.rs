//! PostgreSQL persistence for the marketplace store.
//!
//! `DieselMarketplaceStore` implements the
//! [`MarketplaceStore`](crate::domain::ports::MarketplaceStore) port over a
//! `bb8` pool of `diesel-async` connections. Row structs (`models.rs`) and
//! table definitions (`schema.rs`) stay private to this module; every read
//! is converted into a validated domain entity.
//!
//! # Example
//!
//! ```ignore
//! use swap_backend::outbound::persistence::{
//!     DbPool, DieselMarketplaceStore, PoolConfig, run_pending_migrations,
//! };
//!
//! run_pending_migrations("postgres://localhost/swap").await?;
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/swap")).await?;
//! let store = DieselMarketplaceStore::new(pool);
//! ```

mod diesel_marketplace_store;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_marketplace_store::DieselMarketplaceStore;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
