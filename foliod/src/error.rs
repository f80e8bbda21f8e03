//! Service error types.

use folio_domain::DomainError;
use folio_store::StoreError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Operation-level errors surfaced to the protocol adapter.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No holding with the given ticker
    #[error("Holding not found: {ticker}")]
    NotFound {
        /// Ticker that was looked up
        ticker: String,
    },

    /// A holding with the given ticker already exists
    #[error("Holding already exists: {ticker}")]
    DuplicateKey {
        /// Ticker that collided
        ticker: String,
    },

    /// Target-portfolio weights outside the accepted tolerance
    #[error("Target portfolio weights must sum to ~100%, got {total:.3}%")]
    InvalidWeightSum {
        /// The offending sum
        total: Decimal,
    },

    /// Reset called without confirmation
    #[error("Portfolio reset requires confirm=true")]
    ConfirmationRequired,

    /// Domain validation error
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Store error (transaction or connectivity failures included)
    #[error("Store error: {0}")]
    Store(StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        // Keyed failures keep their operation-level identity; everything
        // else (transaction, connection, database) surfaces as a store fault.
        match err {
            StoreError::NotFound { ticker } => ServiceError::NotFound { ticker },
            StoreError::Duplicate { ticker } => ServiceError::DuplicateKey { ticker },
            other => ServiceError::Store(other),
        }
    }
}
