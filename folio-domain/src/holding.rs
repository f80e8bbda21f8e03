//! Holding entity
//!
//! The only entity in the domain: one ticker's weighted position within the
//! single tracked portfolio. The store owns persisted holdings; nothing in
//! the domain caches state.

use crate::value_objects::{Price, Return, Ticker, Weight};
use serde::{Deserialize, Serialize};

/// One weighted position in the portfolio.
///
/// `ticker` is the primary key and is immutable once created (delete and
/// recreate to change it). Every other field is mutable in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Unique identifier, case-sensitive
    pub ticker: Ticker,

    /// Display name
    pub name: String,

    /// Percentage allocation; portfolio-wide weights sum to ~100%
    pub weight: Weight,

    /// Informational price, supplied by the caller (never auto-fetched)
    pub price: Price,

    /// Optional free-text annotation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Optional percentage return
    #[serde(rename = "return", skip_serializing_if = "Option::is_none")]
    pub ret: Option<Return>,
}

impl Holding {
    /// Create a holding with the required fields; comment and return start empty.
    pub fn new(ticker: Ticker, name: impl Into<String>, weight: Weight, price: Price) -> Self {
        Self {
            ticker,
            name: name.into(),
            weight,
            price,
            comment: None,
            ret: None,
        }
    }

    /// Attach a comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Attach a return figure
    pub fn with_return(mut self, ret: Return) -> Self {
        self.ret = Some(ret);
        self
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn holding(ticker: &str, weight: rust_decimal::Decimal) -> Holding {
        Holding::new(
            Ticker::new(ticker).unwrap(),
            format!("{} Inc.", ticker),
            Weight::new(weight).unwrap(),
            Price::new(dec!(100)).unwrap(),
        )
    }

    #[test]
    fn test_builder_attaches_optional_fields() {
        let h = holding("AAPL", dec!(12.5))
            .with_comment("core position")
            .with_return(Return::new(dec!(8.25)));

        assert_eq!(h.comment.as_deref(), Some("core position"));
        assert_eq!(h.ret.unwrap().as_decimal(), dec!(8.25));
    }

    #[test]
    fn test_serializes_ret_as_return() {
        let h = holding("MSFT", dec!(40)).with_return(Return::new(dec!(1.5)));
        let json = serde_json::to_value(&h).unwrap();

        assert!(json.get("return").is_some());
        assert!(json.get("ret").is_none());
    }

    #[test]
    fn test_omits_empty_optionals() {
        let h = holding("MSFT", dec!(40));
        let json = serde_json::to_value(&h).unwrap();

        assert!(json.get("comment").is_none());
        assert!(json.get("return").is_none());
    }
}
