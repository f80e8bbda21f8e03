//! In-memory store implementation
//!
//! Used for testing and development without a database.
//! Transactions are copy-on-write: `begin` snapshots the table, writes go
//! to the snapshot, and `commit` swaps it in. Writers are serialized by an
//! owned mutex guard held for the life of the transaction, so concurrent
//! mutations see committed state only.

use crate::error::StoreError;
use crate::repository::{HoldingStore, HoldingTxn, PortfolioSummary};
use async_trait::async_trait;
use folio_domain::{Holding, Ticker};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};

type Table = BTreeMap<Ticker, Holding>;

/// In-memory store for testing and development
#[derive(Clone)]
pub struct MemoryStore {
    holdings: Arc<RwLock<Table>>,
    writer: Arc<Mutex<()>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            holdings: Arc::new(RwLock::new(BTreeMap::new())),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Get the number of holdings
    pub fn holding_count(&self) -> usize {
        self.holdings.read().unwrap().len()
    }

    /// Clear all data (useful for test setup)
    pub fn clear(&self) {
        self.holdings.write().unwrap().clear();
    }

    fn snapshot(&self) -> Table {
        self.holdings.read().unwrap().clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize(table: &Table) -> PortfolioSummary {
    let total_weight: Decimal = table.values().map(|h| h.weight.as_decimal()).sum();

    let returns: Vec<Decimal> =
        table.values().filter_map(|h| h.ret.map(|r| r.as_decimal())).collect();
    let average_return = if returns.is_empty() {
        None
    } else {
        Some(returns.iter().sum::<Decimal>() / Decimal::from(returns.len() as i64))
    };

    PortfolioSummary {
        holding_count: table.len() as i64,
        total_weight,
        average_return,
    }
}

// =============================================================================
// Store Implementation
// =============================================================================

#[async_trait]
impl HoldingStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Holding>, StoreError> {
        Ok(self.holdings.read().unwrap().values().cloned().collect())
    }

    async fn get(&self, ticker: &Ticker) -> Result<Holding, StoreError> {
        self.holdings
            .read()
            .unwrap()
            .get(ticker)
            .cloned()
            .ok_or_else(|| StoreError::not_found(ticker.as_str()))
    }

    async fn summary(&self) -> Result<PortfolioSummary, StoreError> {
        Ok(summarize(&self.holdings.read().unwrap()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn HoldingTxn>, StoreError> {
        let guard = self.writer.clone().lock_owned().await;
        Ok(Box::new(MemoryTxn {
            holdings: self.holdings.clone(),
            working: self.snapshot(),
            _guard: guard,
        }))
    }
}

// =============================================================================
// Transaction Implementation
// =============================================================================

/// Copy-on-write transaction over the in-memory table
pub struct MemoryTxn {
    holdings: Arc<RwLock<Table>>,
    working: Table,
    _guard: OwnedMutexGuard<()>,
}

#[async_trait]
impl HoldingTxn for MemoryTxn {
    async fn list(&mut self) -> Result<Vec<Holding>, StoreError> {
        Ok(self.working.values().cloned().collect())
    }

    async fn get(&mut self, ticker: &Ticker) -> Result<Holding, StoreError> {
        self.working
            .get(ticker)
            .cloned()
            .ok_or_else(|| StoreError::not_found(ticker.as_str()))
    }

    async fn insert(&mut self, holding: &Holding) -> Result<Holding, StoreError> {
        if self.working.contains_key(&holding.ticker) {
            return Err(StoreError::duplicate(holding.ticker.as_str()));
        }
        self.working.insert(holding.ticker.clone(), holding.clone());
        Ok(holding.clone())
    }

    async fn update(&mut self, holding: &Holding) -> Result<Holding, StoreError> {
        if !self.working.contains_key(&holding.ticker) {
            return Err(StoreError::not_found(holding.ticker.as_str()));
        }
        self.working.insert(holding.ticker.clone(), holding.clone());
        Ok(holding.clone())
    }

    async fn delete(&mut self, ticker: &Ticker) -> Result<(), StoreError> {
        if self.working.remove(ticker).is_none() {
            return Err(StoreError::not_found(ticker.as_str()));
        }
        Ok(())
    }

    async fn delete_all(&mut self) -> Result<(), StoreError> {
        self.working.clear();
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        *self.holdings.write().unwrap() = self.working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
