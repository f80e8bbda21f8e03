//! Folio Engine Layer
//!
//! Pure decision logic, deterministic, no I/O.
//! Given the current weight set and an incoming weight, decides how to make
//! room without breaching the 100% portfolio budget.

#![warn(clippy::all)]

use folio_domain::{Ticker, Weight};
use rust_decimal::Decimal;
use tracing::debug;

/// The portfolio-wide weight budget, in percent.
pub const FULL_BUDGET: Decimal = Decimal::ONE_HUNDRED;

/// Compute the weight adjustments needed before inserting a new holding.
///
/// Let `T` be the sum of existing weights and `w` the incoming weight:
///
/// - `T + w <= 100`: there is room; no adjustment (empty plan).
/// - `T + w > 100`: every existing weight is replaced with
///   `weight * (100 - w) / T`, rounded to the persisted 3-decimal precision.
/// - `T == 0`: empty portfolio; the new holding simply fits (empty plan).
///
/// An incoming weight of 100 or more makes the scale factor zero or
/// negative; existing weights collapse to 0.000 rather than being rejected.
/// Whether such a request is sensible is the caller's policy.
///
/// Returns `(ticker, new_weight)` pairs to persist before the insert, in
/// the order the existing holdings were supplied. Pure function of its
/// inputs.
pub fn plan_room(existing: &[(Ticker, Weight)], incoming: Weight) -> Vec<(Ticker, Weight)> {
    let total: Decimal = existing.iter().map(|(_, w)| w.as_decimal()).sum();

    if total.is_zero() || total + incoming.as_decimal() <= FULL_BUDGET {
        return Vec::new();
    }

    let scale = (FULL_BUDGET - incoming.as_decimal()) / total;
    debug!(%total, incoming = %incoming, %scale, "scaling existing weights to make room");

    existing
        .iter()
        .map(|(ticker, weight)| {
            (ticker.clone(), Weight::clamped(weight.as_decimal() * scale))
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(ticker: &str, weight: Decimal) -> (Ticker, Weight) {
        (Ticker::new(ticker).unwrap(), Weight::new(weight).unwrap())
    }

    #[test]
    fn test_no_adjustment_when_room_remains() {
        let existing = vec![entry("AAPL", dec!(30)), entry("MSFT", dec!(25))];
        let plan = plan_room(&existing, Weight::new(dec!(45)).unwrap());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_exactly_full_budget_needs_no_adjustment() {
        let existing = vec![entry("AAPL", dec!(60)), entry("MSFT", dec!(20))];
        let plan = plan_room(&existing, Weight::new(dec!(20)).unwrap());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_empty_portfolio_never_divides() {
        let plan = plan_room(&[], Weight::new(dec!(120)).unwrap());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_scales_proportionally_to_make_room() {
        // T=100, w=20 -> scale = (100-20)/100 = 0.8
        let existing = vec![entry("AAPL", dec!(60)), entry("MSFT", dec!(40))];
        let plan = plan_room(&existing, Weight::new(dec!(20)).unwrap());

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].0.as_str(), "AAPL");
        assert_eq!(plan[0].1.as_decimal(), dec!(48));
        assert_eq!(plan[1].0.as_str(), "MSFT");
        assert_eq!(plan[1].1.as_decimal(), dec!(32));
    }

    #[test]
    fn test_scaled_sum_hits_budget_within_rounding() {
        let existing = vec![
            entry("AAPL", dec!(33.333)),
            entry("MSFT", dec!(33.333)),
            entry("GOOG", dec!(33.334)),
        ];
        let incoming = Weight::new(dec!(10)).unwrap();
        let plan = plan_room(&existing, incoming);

        let scaled: Decimal = plan.iter().map(|(_, w)| w.as_decimal()).sum();
        let total = scaled + incoming.as_decimal();
        assert!((total - FULL_BUDGET).abs() <= dec!(0.002), "sum was {}", total);
    }

    #[test]
    fn test_each_scaled_weight_matches_formula() {
        let existing = vec![entry("AAPL", dec!(70)), entry("MSFT", dec!(50))];
        let incoming = Weight::new(dec!(40)).unwrap();
        let plan = plan_room(&existing, incoming);

        // scale = (100-40)/120 = 0.5
        assert_eq!(plan[0].1.as_decimal(), dec!(35));
        assert_eq!(plan[1].1.as_decimal(), dec!(25));
    }

    #[test]
    fn test_scaled_weights_round_to_three_places() {
        // scale = (100-10)/90.001 -> repeating decimals
        let existing = vec![entry("AAPL", dec!(90.001))];
        let plan = plan_room(&existing, Weight::new(dec!(10)).unwrap());

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].1.as_decimal(), dec!(90.000));
    }

    #[test]
    fn test_full_incoming_weight_collapses_existing() {
        let existing = vec![entry("AAPL", dec!(60)), entry("MSFT", dec!(40))];
        let plan = plan_room(&existing, Weight::new(dec!(100)).unwrap());

        assert_eq!(plan.len(), 2);
        for (_, weight) in &plan {
            assert_eq!(weight.as_decimal(), Decimal::ZERO);
        }
    }

    #[test]
    fn test_oversized_incoming_weight_clamps_instead_of_going_negative() {
        let existing = vec![entry("AAPL", dec!(80))];
        let plan = plan_room(&existing, Weight::new(dec!(120)).unwrap());

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].1.as_decimal(), Decimal::ZERO);
    }

    #[test]
    fn test_plan_preserves_input_order() {
        let existing = vec![
            entry("MSFT", dec!(50)),
            entry("AAPL", dec!(30)),
            entry("GOOG", dec!(40)),
        ];
        let plan = plan_room(&existing, Weight::new(dec!(20)).unwrap());

        let tickers: Vec<&str> = plan.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tickers, vec!["MSFT", "AAPL", "GOOG"]);
    }
}
