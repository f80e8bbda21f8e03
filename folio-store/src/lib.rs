//! Folio storage layer
//!
//! Ports (traits) for the durable holdings table, an in-memory
//! implementation for tests and development, and a PostgreSQL
//! implementation behind the `postgres` feature.

#![warn(clippy::all)]

pub mod error;
pub mod memory;
pub mod repository;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use repository::{HoldingStore, HoldingTxn, PortfolioSummary};

#[cfg(feature = "postgres")]
pub use postgres::PgStore;
