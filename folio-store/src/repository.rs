//! Repository trait definitions (Ports)
//!
//! These traits define the storage interface for the holdings table.
//! Implementations can be PostgreSQL or in-memory for testing.
//!
//! Every mutating call lives on [`HoldingTxn`]: mutations are only possible
//! inside a transaction, and a transaction dropped without `commit` rolls
//! back. This is what gives the mutation operations their all-or-nothing
//! guarantee, including when the caller's future is cancelled mid-flight.

use crate::error::StoreError;
use async_trait::async_trait;
use folio_domain::{Holding, Ticker};
use rust_decimal::Decimal;
use serde::Serialize;

/// Store-computed aggregate over the whole portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortfolioSummary {
    /// Number of holdings
    pub holding_count: i64,
    /// Sum of all weights, in percent
    pub total_weight: Decimal,
    /// Mean return over the holdings that report one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_return: Option<Decimal>,
}

/// Durable keyed table of holdings.
#[async_trait]
pub trait HoldingStore: Send + Sync {
    /// List every holding, ordered by ticker
    async fn list(&self) -> Result<Vec<Holding>, StoreError>;

    /// Fetch a single holding
    async fn get(&self, ticker: &Ticker) -> Result<Holding, StoreError>;

    /// Compute the portfolio aggregate
    async fn summary(&self) -> Result<PortfolioSummary, StoreError>;

    /// Check connectivity
    async fn ping(&self) -> Result<(), StoreError>;

    /// Begin a transaction scoped to one operation
    async fn begin(&self) -> Result<Box<dyn HoldingTxn>, StoreError>;
}

/// One atomic multi-statement transaction over the holdings table.
///
/// Writes become visible to other callers only at `commit`. Dropping the
/// transaction without committing rolls back.
#[async_trait]
pub trait HoldingTxn: Send {
    /// List every holding as seen inside this transaction, ordered by ticker
    async fn list(&mut self) -> Result<Vec<Holding>, StoreError>;

    /// Fetch a single holding as seen inside this transaction
    async fn get(&mut self, ticker: &Ticker) -> Result<Holding, StoreError>;

    /// Insert a new holding; fails with `Duplicate` if the ticker exists
    async fn insert(&mut self, holding: &Holding) -> Result<Holding, StoreError>;

    /// Overwrite an existing holding; fails with `NotFound` if absent
    async fn update(&mut self, holding: &Holding) -> Result<Holding, StoreError>;

    /// Remove a holding; fails with `NotFound` if absent
    async fn delete(&mut self, ticker: &Ticker) -> Result<(), StoreError>;

    /// Remove every holding
    async fn delete_all(&mut self) -> Result<(), StoreError>;

    /// Make all writes in this transaction atomically visible
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discard all writes in this transaction
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
