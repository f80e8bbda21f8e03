//! Value Objects for the Folio domain
//!
//! Immutable, validated domain primitives.
//! All value objects enforce invariants at construction time, and all
//! numeric values carry their persisted fixed-point precision: weights are
//! rounded to 3 decimal places, prices and returns to 4. Rounding once at
//! construction keeps the in-memory value identical to the stored string,
//! so repeated partial updates never drift.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain errors for value object validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Ticker must be a non-empty symbol without whitespace
    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    /// Weight must be positive
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),

    /// Price must be non-negative
    #[error("Invalid price: {0}")]
    InvalidPrice(String),
}

/// Persisted precision of portfolio weights (decimal places).
pub const WEIGHT_SCALE: u32 = 3;

/// Persisted precision of prices and returns (decimal places).
pub const PRICE_SCALE: u32 = 4;

fn round_fixed(value: Decimal, scale: u32) -> Decimal {
    // Half-away-from-zero matches the upstream feed's fixed-point output.
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    // Pin the scale so serialized values always carry their full precision
    rounded.rescale(scale);
    rounded
}

// =============================================================================
// Ticker
// =============================================================================

/// Ticker identifies one holding within the portfolio.
///
/// # Invariants
/// - Non-empty
/// - No whitespace
/// - Case-sensitive; never normalized
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ticker(String);

impl Ticker {
    /// Create a new Ticker with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidTicker` if the symbol is empty or
    /// contains whitespace
    pub fn new(symbol: impl Into<String>) -> Result<Self, DomainError> {
        let symbol = symbol.into();
        if symbol.is_empty() {
            return Err(DomainError::InvalidTicker("Ticker must be non-empty".to_string()));
        }
        if symbol.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidTicker(format!(
                "Ticker must not contain whitespace: {:?}",
                symbol
            )));
        }
        Ok(Self(symbol))
    }

    /// Get the ticker symbol
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Weight
// =============================================================================

/// Weight is a holding's percentage allocation within the portfolio.
///
/// # Invariants
/// - Caller-supplied weights must be > 0 (use [`Weight::new`])
/// - Always rounded to 3 decimal places
/// - Zero is admitted only through [`Weight::clamped`]: a proportional
///   rebalance with no head-room collapses existing weights to 0.000
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Weight(Decimal);

impl Weight {
    /// Create a new Weight with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidWeight` if value <= 0
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidWeight("Weight must be positive".to_string()));
        }
        Ok(Self(round_fixed(value, WEIGHT_SCALE)))
    }

    /// Create a Weight from scaled arithmetic, flooring at zero.
    ///
    /// Rebalancing an over-committed portfolio can legitimately scale an
    /// existing weight down to (or past) zero; negative results clamp to
    /// 0.000 rather than failing the whole mutation.
    pub fn clamped(value: Decimal) -> Self {
        Self(round_fixed(value.max(Decimal::ZERO), WEIGHT_SCALE))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Fixed-point string exactly as persisted (3 decimal places)
    pub fn to_fixed(&self) -> String {
        format!("{:.3}", self.0)
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

// =============================================================================
// Price
// =============================================================================

/// Price is an informational per-share quote, supplied by the caller.
///
/// # Invariants
/// - Must be >= 0
/// - Always rounded to 4 decimal places
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPrice` if value < 0
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value < Decimal::ZERO {
            return Err(DomainError::InvalidPrice("Price must be non-negative".to_string()));
        }
        Ok(Self(round_fixed(value, PRICE_SCALE)))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Fixed-point string exactly as persisted (4 decimal places)
    pub fn to_fixed(&self) -> String {
        format!("{:.4}", self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

// =============================================================================
// Return
// =============================================================================

/// Return is an informational percentage return. Any decimal is valid;
/// only the persisted precision (4 decimal places) is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Return(Decimal);

impl Return {
    /// Create a new Return, rounding to persisted precision
    pub fn new(value: Decimal) -> Self {
        Self(round_fixed(value, PRICE_SCALE))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Fixed-point string exactly as persisted (4 decimal places)
    pub fn to_fixed(&self) -> String {
        format!("{:.4}", self.0)
    }
}

impl fmt::Display for Return {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

// =============================================================================
// Tests
// =============================================================================
