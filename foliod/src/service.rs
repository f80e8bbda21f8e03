//! Portfolio service: mutation orchestrator and query operations.
//!
//! Every mutation runs `begin -> read -> compute -> write(s) -> commit`
//! against the injected store; a failure at any step drops the transaction,
//! which rolls back, so partial writes are never visible. The service holds
//! no state of its own between calls — the store owns all holdings.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use folio_domain::{Holding, Price, Return, Ticker, Weight};
use folio_store::{HoldingStore, PortfolioSummary};

use crate::config::PortfolioConfig;
use crate::error::{ServiceError, ServiceResult};

// =============================================================================
// Operation parameters
// =============================================================================

/// Arguments for `add_holding`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddHoldingParams {
    pub ticker: String,
    pub name: String,
    pub weight: Decimal,
    pub price: Decimal,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default, rename = "return")]
    pub ret: Option<Decimal>,
}

/// Arguments for `update_holding`. Omitted fields retain prior values.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateHoldingParams {
    pub ticker: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub weight: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default, rename = "return")]
    pub ret: Option<Decimal>,
}

/// Arguments for `delete_holding`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteHoldingParams {
    pub ticker: String,
}

/// One entry of a `rebalance_holdings` batch.
#[derive(Debug, Clone, Deserialize)]
pub struct RebalanceEntry {
    pub ticker: String,
    pub weight: Decimal,
}

/// Arguments for `rebalance_holdings`.
#[derive(Debug, Clone, Deserialize)]
pub struct RebalanceHoldingsParams {
    pub holdings: Vec<RebalanceEntry>,
}

/// Arguments for `reset_portfolio`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResetPortfolioParams {
    #[serde(default)]
    pub confirm: bool,
}

/// One target holding of `set_target_portfolio`.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetHolding {
    pub ticker: String,
    pub name: String,
    pub weight: Decimal,
    pub price: Decimal,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default, rename = "return")]
    pub ret: Option<Decimal>,
}

/// Arguments for `set_target_portfolio`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetTargetPortfolioParams {
    pub holdings: Vec<TargetHolding>,
}

// =============================================================================
// Service
// =============================================================================

/// Orchestrates the portfolio mutation and query operations over an
/// injected store handle.
pub struct PortfolioService<S: HoldingStore> {
    store: Arc<S>,
    policy: PortfolioConfig,
}

impl<S: HoldingStore> PortfolioService<S> {
    /// Create a service with default policy bounds.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            policy: PortfolioConfig::default(),
        }
    }

    /// Create a service with configured policy bounds.
    pub fn with_policy(store: Arc<S>, policy: PortfolioConfig) -> Self {
        Self { store, policy }
    }

    // =========================================================================
    // Query operations
    // =========================================================================

    /// Every holding, ordered by ticker.
    pub async fn get_holdings(&self) -> ServiceResult<Vec<Holding>> {
        Ok(self.store.list().await?)
    }

    /// Store-computed portfolio aggregate, forwarded verbatim.
    pub async fn get_portfolio_summary(&self) -> ServiceResult<PortfolioSummary> {
        Ok(self.store.summary().await?)
    }

    // =========================================================================
    // Mutation operations
    // =========================================================================

    /// Add a new holding, proportionally scaling existing weights down when
    /// the portfolio would otherwise exceed 100%. Returns the full holdings
    /// list after commit.
    pub async fn add_holding(&self, params: AddHoldingParams) -> ServiceResult<Vec<Holding>> {
        let ticker = Ticker::new(params.ticker)?;
        let weight = Weight::new(params.weight)?;
        let price = Price::new(params.price)?;

        let mut txn = self.store.begin().await?;
        let current = txn.list().await?;

        let weights: Vec<(Ticker, Weight)> =
            current.iter().map(|h| (h.ticker.clone(), h.weight)).collect();
        let plan = folio_engine::plan_room(&weights, weight);

        // Plan entries come back in the same order as the current rows;
        // only the weight changes.
        for (row, (_, new_weight)) in current.iter().zip(&plan) {
            let mut scaled = row.clone();
            scaled.weight = *new_weight;
            txn.update(&scaled).await?;
        }

        let mut holding = Holding::new(ticker, params.name, weight, price);
        holding.comment = params.comment;
        holding.ret = params.ret.map(Return::new);

        txn.insert(&holding).await?;
        txn.commit().await?;

        info!(ticker = %holding.ticker, rebalanced = !plan.is_empty(), "holding added");
        Ok(self.store.list().await?)
    }

    /// Partially update one holding; omitted fields retain prior values.
    /// Does not touch any other holding's weight.
    pub async fn update_holding(&self, params: UpdateHoldingParams) -> ServiceResult<Holding> {
        let ticker = Ticker::new(params.ticker)?;

        let mut txn = self.store.begin().await?;
        let mut holding = txn.get(&ticker).await?;

        if let Some(name) = params.name {
            holding.name = name;
        }
        if let Some(weight) = params.weight {
            holding.weight = Weight::new(weight)?;
        }
        if let Some(price) = params.price {
            holding.price = Price::new(price)?;
        }
        if let Some(comment) = params.comment {
            holding.comment = Some(comment);
        }
        if let Some(ret) = params.ret {
            holding.ret = Some(Return::new(ret));
        }

        let updated = txn.update(&holding).await?;
        txn.commit().await?;

        info!(ticker = %updated.ticker, "holding updated");
        Ok(updated)
    }

    /// Remove one holding. Remaining weights are left as they are.
    pub async fn delete_holding(&self, params: DeleteHoldingParams) -> ServiceResult<Ticker> {
        let ticker = Ticker::new(params.ticker)?;

        let mut txn = self.store.begin().await?;
        txn.delete(&ticker).await?;
        txn.commit().await?;

        info!(ticker = %ticker, "holding deleted");
        Ok(ticker)
    }

    /// Set new weights for the named holdings, all inside one transaction.
    /// Any missing ticker aborts the whole batch. Returns the updated rows
    /// in input order.
    pub async fn rebalance_holdings(
        &self,
        params: RebalanceHoldingsParams,
    ) -> ServiceResult<Vec<Holding>> {
        let mut txn = self.store.begin().await?;
        let mut updated = Vec::with_capacity(params.holdings.len());

        for entry in params.holdings {
            let ticker = Ticker::new(entry.ticker)?;
            let weight = Weight::new(entry.weight)?;

            let mut holding = txn.get(&ticker).await?;
            holding.weight = weight;
            updated.push(txn.update(&holding).await?);
        }

        txn.commit().await?;

        info!(count = updated.len(), "holdings rebalanced");
        Ok(updated)
    }

    /// Delete every holding. Requires explicit confirmation.
    pub async fn reset_portfolio(&self, params: ResetPortfolioParams) -> ServiceResult<()> {
        if !params.confirm {
            return Err(ServiceError::ConfirmationRequired);
        }

        let mut txn = self.store.begin().await?;
        txn.delete_all().await?;
        txn.commit().await?;

        info!("portfolio reset");
        Ok(())
    }

    /// Atomically replace the entire portfolio with the given targets.
    /// The weight sum must land inside the configured tolerance before any
    /// transaction is opened.
    pub async fn set_target_portfolio(
        &self,
        params: SetTargetPortfolioParams,
    ) -> ServiceResult<Vec<Holding>> {
        let total: Decimal = params.holdings.iter().map(|h| h.weight).sum();
        if total < self.policy.weight_sum_min || total > self.policy.weight_sum_max {
            return Err(ServiceError::InvalidWeightSum { total });
        }

        let mut txn = self.store.begin().await?;
        txn.delete_all().await?;

        let mut inserted = Vec::with_capacity(params.holdings.len());
        for target in params.holdings {
            let mut holding = Holding::new(
                Ticker::new(target.ticker)?,
                target.name,
                Weight::new(target.weight)?,
                Price::new(target.price)?,
            );
            holding.comment = target.comment;
            holding.ret = target.ret.map(Return::new);

            inserted.push(txn.insert(&holding).await?);
        }

        txn.commit().await?;

        info!(count = inserted.len(), "target portfolio set");
        Ok(inserted)
    }
}
