//! PostgreSQL store implementation
//!
//! Backs the holdings table with the `portfolio_holdings` table created by
//! the workspace migrations. Numeric fields are persisted as fixed-point
//! TEXT (weight to 3 decimal places, price and return to 4) so the stored
//! representation is exactly what the domain formatted.
//!
//! This module uses dynamic queries (sqlx::query) instead of compile-time
//! checked macros (sqlx::query!) to allow compilation without DATABASE_URL.

use crate::error::StoreError;
use crate::repository::{HoldingStore, HoldingTxn, PortfolioSummary};
use async_trait::async_trait;
use folio_domain::{Holding, Price, Return, Ticker, Weight};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Executor, Postgres, Row, Transaction};
use std::str::FromStr;
use tracing::debug;

/// PostgreSQL-backed holding store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database and build a store around a small pool.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        debug!("connected to postgres");
        Ok(Self { pool })
    }

    /// Wrap an existing pool (for tests that manage their own pool).
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// =============================================================================
// Row mapping
// =============================================================================

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(raw)
        .map_err(|e| StoreError::Deserialization(format!("Invalid {} {:?}: {}", field, raw, e)))
}

fn parse_holding_row(row: &PgRow) -> Result<Holding, StoreError> {
    let ticker: String = row.try_get("ticker")?;
    let name: String = row.try_get("name")?;
    let weight: String = row.try_get("weight")?;
    let price: String = row.try_get("price")?;
    let comment: Option<String> = row.try_get("comment")?;
    let ret: Option<String> = row.try_get("return")?;

    let ticker = Ticker::new(ticker)
        .map_err(|e| StoreError::Deserialization(format!("Invalid ticker: {}", e)))?;
    // Persisted weights may be 0.000 after a degenerate rebalance
    let weight = Weight::clamped(parse_decimal("weight", &weight)?);
    let price = Price::new(parse_decimal("price", &price)?)
        .map_err(|e| StoreError::Deserialization(format!("Invalid price: {}", e)))?;
    let ret = ret.as_deref().map(|r| parse_decimal("return", r)).transpose()?.map(Return::new);

    let mut holding = Holding::new(ticker, name, weight, price);
    holding.comment = comment;
    holding.ret = ret;
    Ok(holding)
}

// =============================================================================
// Queries (shared between pool and transaction executors)
// =============================================================================

const SELECT_COLUMNS: &str = r#"ticker, name, weight, price, comment, "return""#;

async fn fetch_all_holdings<'e, E>(executor: E) -> Result<Vec<Holding>, StoreError>
where
    E: Executor<'e, Database = Postgres>,
{
    let rows = sqlx::query(&format!(
        "SELECT {} FROM portfolio_holdings ORDER BY ticker ASC",
        SELECT_COLUMNS
    ))
    .fetch_all(executor)
    .await?;

    rows.iter().map(parse_holding_row).collect()
}

async fn fetch_holding<'e, E>(executor: E, ticker: &Ticker) -> Result<Holding, StoreError>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(&format!(
        "SELECT {} FROM portfolio_holdings WHERE ticker = $1",
        SELECT_COLUMNS
    ))
    .bind(ticker.as_str())
    .fetch_optional(executor)
    .await?;

    match row {
        Some(row) => parse_holding_row(&row),
        None => Err(StoreError::not_found(ticker.as_str())),
    }
}

async fn fetch_summary<'e, E>(executor: E) -> Result<PortfolioSummary, StoreError>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS holding_count,
            COALESCE(SUM(weight::numeric), 0) AS total_weight,
            AVG("return"::numeric) AS average_return
        FROM portfolio_holdings
        "#,
    )
    .fetch_one(executor)
    .await?;

    Ok(PortfolioSummary {
        holding_count: row.try_get("holding_count")?,
        total_weight: row.try_get("total_weight")?,
        average_return: row.try_get("average_return")?,
    })
}

fn bind_holding<'q>(
    query: sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments>,
    holding: &'q Holding,
) -> sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(holding.ticker.as_str())
        .bind(holding.name.as_str())
        .bind(holding.weight.to_fixed())
        .bind(holding.price.to_fixed())
        .bind(holding.comment.as_deref())
        .bind(holding.ret.map(|r| r.to_fixed()))
}

// =============================================================================
// Store Implementation
// =============================================================================

#[async_trait]
impl HoldingStore for PgStore {
    async fn list(&self) -> Result<Vec<Holding>, StoreError> {
        fetch_all_holdings(&self.pool).await
    }

    async fn get(&self, ticker: &Ticker) -> Result<Holding, StoreError> {
        fetch_holding(&self.pool, ticker).await
    }

    async fn summary(&self) -> Result<PortfolioSummary, StoreError> {
        fetch_summary(&self.pool).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn HoldingTxn>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;
        Ok(Box::new(PgTxn { tx }))
    }
}

// =============================================================================
// Transaction Implementation
// =============================================================================

/// One Postgres transaction; dropped un-committed it rolls back.
pub struct PgTxn {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl HoldingTxn for PgTxn {
    async fn list(&mut self) -> Result<Vec<Holding>, StoreError> {
        fetch_all_holdings(&mut *self.tx).await
    }

    async fn get(&mut self, ticker: &Ticker) -> Result<Holding, StoreError> {
        fetch_holding(&mut *self.tx, ticker).await
    }

    async fn insert(&mut self, holding: &Holding) -> Result<Holding, StoreError> {
        let row = bind_holding(
            sqlx::query(&format!(
                r#"
                INSERT INTO portfolio_holdings (ticker, name, weight, price, comment, "return")
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {}
                "#,
                SELECT_COLUMNS
            )),
            holding,
        )
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Duplicate { .. } => StoreError::duplicate(holding.ticker.as_str()),
            other => other,
        })?;

        parse_holding_row(&row)
    }

    async fn update(&mut self, holding: &Holding) -> Result<Holding, StoreError> {
        let row = bind_holding(
            sqlx::query(&format!(
                r#"
                UPDATE portfolio_holdings
                SET name = $2, weight = $3, price = $4, comment = $5, "return" = $6
                WHERE ticker = $1
                RETURNING {}
                "#,
                SELECT_COLUMNS
            )),
            holding,
        )
        .fetch_optional(&mut *self.tx)
        .await?;

        match row {
            Some(row) => parse_holding_row(&row),
            None => Err(StoreError::not_found(holding.ticker.as_str())),
        }
    }

    async fn delete(&mut self, ticker: &Ticker) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM portfolio_holdings WHERE ticker = $1")
            .bind(ticker.as_str())
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(ticker.as_str()));
        }
        Ok(())
    }

    async fn delete_all(&mut self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM portfolio_holdings")
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))
    }
}
