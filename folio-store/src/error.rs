//! Storage layer errors

use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// No holding with the given ticker
    #[error("Holding not found: {ticker}")]
    NotFound {
        /// Ticker that was looked up
        ticker: String,
    },

    /// A holding with the given ticker already exists
    #[error("Holding already exists: {ticker}")]
    Duplicate {
        /// Ticker that collided
        ticker: String,
    },

    /// Transaction begin/commit/rollback failure
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Deserialization error (reading a persisted row)
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl StoreError {
    /// Create a not found error
    pub fn not_found(ticker: impl Into<String>) -> Self {
        Self::NotFound { ticker: ticker.into() }
    }

    /// Create a duplicate error
    pub fn duplicate(ticker: impl Into<String>) -> Self {
        Self::Duplicate { ticker: ticker.into() }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound {
                ticker: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) => {
                // Check for unique constraint violation
                if db_err.code().map(|c| c == "23505").unwrap_or(false) {
                    StoreError::Duplicate {
                        ticker: "unknown".to_string(),
                    }
                } else {
                    StoreError::Database(db_err.to_string())
                }
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Connection(err.to_string())
            },
            _ => StoreError::Database(err.to_string()),
        }
    }
}
