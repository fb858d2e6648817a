//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **memory**: in-process marketplace store for development and tests
//! - **persistence**: PostgreSQL-backed marketplace store using Diesel
//! - **push**: Expo push delivery over HTTP
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod memory;
pub mod persistence;
pub mod push;
