//! Integration tests for the portfolio service against the in-memory store.
//!
//! These exercise the orchestrator's transactional contracts end to end:
//! proportional rebalancing on add, PATCH-style updates, all-or-nothing
//! batches, target-portfolio replacement, and the reset gate.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use folio_domain::{Holding, Price, Ticker, Weight};
use folio_store::{HoldingStore, MemoryStore};
use foliod::service::{
    AddHoldingParams, DeleteHoldingParams, RebalanceEntry, RebalanceHoldingsParams,
    ResetPortfolioParams, SetTargetPortfolioParams, TargetHolding, UpdateHoldingParams,
};
use foliod::{PortfolioService, ServiceError};

fn service() -> (PortfolioService<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (PortfolioService::new(store.clone()), store)
}

async fn seed(store: &MemoryStore, rows: &[(&str, Decimal)]) {
    let mut txn = store.begin().await.unwrap();
    for (ticker, weight) in rows {
        let holding = Holding::new(
            Ticker::new(*ticker).unwrap(),
            format!("{} Inc.", ticker),
            Weight::new(*weight).unwrap(),
            Price::new(dec!(100)).unwrap(),
        );
        txn.insert(&holding).await.unwrap();
    }
    txn.commit().await.unwrap();
}

fn add_params(ticker: &str, weight: Decimal) -> AddHoldingParams {
    AddHoldingParams {
        ticker: ticker.to_string(),
        name: format!("{} Inc.", ticker),
        weight,
        price: dec!(100),
        comment: None,
        ret: None,
    }
}

fn weight_of(holdings: &[Holding], ticker: &str) -> Decimal {
    holdings
        .iter()
        .find(|h| h.ticker.as_str() == ticker)
        .map(|h| h.weight.as_decimal())
        .unwrap()
}

// =============================================================================
// add_holding
// =============================================================================

#[tokio::test]
async fn test_add_with_room_leaves_existing_untouched() {
    let (service, store) = service();
    seed(&store, &[("AAPL", dec!(30)), ("MSFT", dec!(25))]).await;

    let holdings = service.add_holding(add_params("GOOG", dec!(40))).await.unwrap();

    assert_eq!(weight_of(&holdings, "AAPL"), dec!(30));
    assert_eq!(weight_of(&holdings, "MSFT"), dec!(25));
    assert_eq!(weight_of(&holdings, "GOOG"), dec!(40));
}

#[tokio::test]
async fn test_add_over_budget_scales_existing_proportionally() {
    let (service, store) = service();
    seed(&store, &[("AAPL", dec!(60)), ("MSFT", dec!(40))]).await;

    // T=100, w=20 -> scale = 0.8 -> [48, 32, 20]
    let holdings = service.add_holding(add_params("GOOG", dec!(20))).await.unwrap();

    assert_eq!(weight_of(&holdings, "AAPL"), dec!(48));
    assert_eq!(weight_of(&holdings, "MSFT"), dec!(32));
    assert_eq!(weight_of(&holdings, "GOOG"), dec!(20));

    let total: Decimal = holdings.iter().map(|h| h.weight.as_decimal()).sum();
    assert_eq!(total, dec!(100));
}

#[tokio::test]
async fn test_add_to_empty_portfolio_accepts_any_weight() {
    let (service, _store) = service();

    let holdings = service.add_holding(add_params("AAPL", dec!(120))).await.unwrap();

    assert_eq!(holdings.len(), 1);
    assert_eq!(weight_of(&holdings, "AAPL"), dec!(120));
}

#[tokio::test]
async fn test_add_duplicate_ticker_fails_and_rolls_back() {
    let (service, store) = service();
    seed(&store, &[("AAPL", dec!(60)), ("MSFT", dec!(40))]).await;

    // Over budget, so the rebalance plan would touch MSFT before the
    // insert collides. Nothing of that may stick.
    let err = service.add_holding(add_params("AAPL", dec!(50))).await.unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateKey { .. }));

    let holdings = service.get_holdings().await.unwrap();
    assert_eq!(weight_of(&holdings, "AAPL"), dec!(60));
    assert_eq!(weight_of(&holdings, "MSFT"), dec!(40));
}

#[tokio::test]
async fn test_add_returns_full_list_sorted_by_ticker() {
    let (service, store) = service();
    seed(&store, &[("MSFT", dec!(40))]).await;

    let holdings = service.add_holding(add_params("AAPL", dec!(30))).await.unwrap();

    let tickers: Vec<&str> = holdings.iter().map(|h| h.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["AAPL", "MSFT"]);
}

#[tokio::test]
async fn test_add_rejects_non_positive_weight() {
    let (service, _store) = service();

    let err = service.add_holding(add_params("AAPL", dec!(0))).await.unwrap_err();
    assert!(matches!(err, ServiceError::Domain(_)));
}

// =============================================================================
// update_holding
// =============================================================================

#[tokio::test]
async fn test_update_with_no_fields_is_idempotent() {
    let (service, store) = service();
    seed(&store, &[("AAPL", dec!(60))]).await;

    let before = service.get_holdings().await.unwrap();
    let updated = service
        .update_holding(UpdateHoldingParams {
            ticker: "AAPL".to_string(),
            name: None,
            weight: None,
            price: None,
            comment: None,
            ret: None,
        })
        .await
        .unwrap();

    assert_eq!(updated, before[0]);
}

#[tokio::test]
async fn test_update_overwrites_only_provided_fields() {
    let (service, store) = service();
    seed(&store, &[("AAPL", dec!(60)), ("MSFT", dec!(40))]).await;

    let updated = service
        .update_holding(UpdateHoldingParams {
            ticker: "AAPL".to_string(),
            name: None,
            weight: Some(dec!(55)),
            price: None,
            comment: Some("trimmed".to_string()),
            ret: None,
        })
        .await
        .unwrap();

    assert_eq!(updated.weight.as_decimal(), dec!(55));
    assert_eq!(updated.name, "AAPL Inc.");
    assert_eq!(updated.price.as_decimal(), dec!(100));
    assert_eq!(updated.comment.as_deref(), Some("trimmed"));

    // No cross-holding rebalancing
    let holdings = service.get_holdings().await.unwrap();
    assert_eq!(weight_of(&holdings, "MSFT"), dec!(40));
}

#[tokio::test]
async fn test_update_missing_ticker() {
    let (service, _store) = service();

    let err = service
        .update_holding(UpdateHoldingParams {
            ticker: "NOPE".to_string(),
            name: None,
            weight: None,
            price: None,
            comment: None,
            ret: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

#[tokio::test]
async fn test_weight_round_trips_at_three_decimals() {
    let (service, _store) = service();

    service.add_holding(add_params("AAPL", dec!(12.3456))).await.unwrap();

    let holdings = service.get_holdings().await.unwrap();
    assert_eq!(weight_of(&holdings, "AAPL"), dec!(12.346));
}

// =============================================================================
// delete_holding
// =============================================================================

#[tokio::test]
async fn test_delete_removes_only_the_named_holding() {
    let (service, store) = service();
    seed(&store, &[("AAPL", dec!(60)), ("MSFT", dec!(40))]).await;

    service
        .delete_holding(DeleteHoldingParams { ticker: "AAPL".to_string() })
        .await
        .unwrap();

    // Remaining weights are untouched
    let holdings = service.get_holdings().await.unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(weight_of(&holdings, "MSFT"), dec!(40));
}

#[tokio::test]
async fn test_delete_missing_ticker() {
    let (service, _store) = service();

    let err = service
        .delete_holding(DeleteHoldingParams { ticker: "NOPE".to_string() })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

// =============================================================================
// rebalance_holdings
// =============================================================================

#[tokio::test]
async fn test_rebalance_applies_weights_in_input_order() {
    let (service, store) = service();
    seed(&store, &[("AAPL", dec!(60)), ("MSFT", dec!(40))]).await;

    let updated = service
        .rebalance_holdings(RebalanceHoldingsParams {
            holdings: vec![
                RebalanceEntry { ticker: "MSFT".to_string(), weight: dec!(55) },
                RebalanceEntry { ticker: "AAPL".to_string(), weight: dec!(45) },
            ],
        })
        .await
        .unwrap();

    let tickers: Vec<&str> = updated.iter().map(|h| h.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["MSFT", "AAPL"]);
    assert_eq!(updated[0].weight.as_decimal(), dec!(55));
    assert_eq!(updated[1].weight.as_decimal(), dec!(45));
}

#[tokio::test]
async fn test_rebalance_preserves_non_weight_fields() {
    let (service, store) = service();
    seed(&store, &[("AAPL", dec!(60))]).await;

    let updated = service
        .rebalance_holdings(RebalanceHoldingsParams {
            holdings: vec![RebalanceEntry { ticker: "AAPL".to_string(), weight: dec!(30) }],
        })
        .await
        .unwrap();

    assert_eq!(updated[0].name, "AAPL Inc.");
    assert_eq!(updated[0].price.as_decimal(), dec!(100));
}

#[tokio::test]
async fn test_rebalance_is_all_or_nothing() {
    let (service, store) = service();
    seed(&store, &[("AAPL", dec!(60)), ("MSFT", dec!(40))]).await;

    // AAPL would be applied first, then the unknown ticker aborts the batch.
    let err = service
        .rebalance_holdings(RebalanceHoldingsParams {
            holdings: vec![
                RebalanceEntry { ticker: "AAPL".to_string(), weight: dec!(10) },
                RebalanceEntry { ticker: "NOPE".to_string(), weight: dec!(5) },
            ],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));

    let holdings = service.get_holdings().await.unwrap();
    assert_eq!(weight_of(&holdings, "AAPL"), dec!(60));
    assert_eq!(weight_of(&holdings, "MSFT"), dec!(40));
}

// =============================================================================
// reset_portfolio
// =============================================================================

#[tokio::test]
async fn test_reset_requires_confirmation() {
    let (service, store) = service();
    seed(&store, &[("AAPL", dec!(60))]).await;

    let err = service
        .reset_portfolio(ResetPortfolioParams { confirm: false })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ConfirmationRequired));

    assert_eq!(store.holding_count(), 1);
}

#[tokio::test]
async fn test_reset_then_get_holdings_is_empty() {
    let (service, store) = service();
    seed(&store, &[("AAPL", dec!(60)), ("MSFT", dec!(40))]).await;

    service.reset_portfolio(ResetPortfolioParams { confirm: true }).await.unwrap();

    assert!(service.get_holdings().await.unwrap().is_empty());
}

// =============================================================================
// set_target_portfolio
// =============================================================================

fn target(ticker: &str, weight: Decimal) -> TargetHolding {
    TargetHolding {
        ticker: ticker.to_string(),
        name: format!("{} Inc.", ticker),
        weight,
        price: dec!(100),
        comment: None,
        ret: None,
    }
}

#[tokio::test]
async fn test_set_target_rejects_out_of_tolerance_sums() {
    let (service, store) = service();
    seed(&store, &[("AAPL", dec!(60))]).await;

    for weights in [[dec!(50), dec!(45)], [dec!(50), dec!(55)]] {
        let err = service
            .set_target_portfolio(SetTargetPortfolioParams {
                holdings: vec![target("MSFT", weights[0]), target("GOOG", weights[1])],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidWeightSum { .. }));
    }

    // Rejected before any transaction: prior state intact
    let holdings = service.get_holdings().await.unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(weight_of(&holdings, "AAPL"), dec!(60));
}

#[tokio::test]
async fn test_set_target_accepts_sums_inside_tolerance() {
    let (service, _store) = service();

    service
        .set_target_portfolio(SetTargetPortfolioParams {
            holdings: vec![target("AAPL", dec!(50)), target("MSFT", dec!(50.00))],
        })
        .await
        .unwrap();

    service
        .set_target_portfolio(SetTargetPortfolioParams {
            holdings: vec![target("AAPL", dec!(49.995)), target("MSFT", dec!(50))],
        })
        .await
        .unwrap();

    let holdings = service.get_holdings().await.unwrap();
    assert_eq!(weight_of(&holdings, "AAPL"), dec!(49.995));
}

#[tokio::test]
async fn test_set_target_replaces_entire_portfolio() {
    let (service, store) = service();
    seed(&store, &[("AAPL", dec!(60)), ("MSFT", dec!(40))]).await;

    let inserted = service
        .set_target_portfolio(SetTargetPortfolioParams {
            holdings: vec![target("GOOG", dec!(70)), target("NVDA", dec!(30))],
        })
        .await
        .unwrap();

    assert_eq!(inserted.len(), 2);

    let holdings = service.get_holdings().await.unwrap();
    let tickers: Vec<&str> = holdings.iter().map(|h| h.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["GOOG", "NVDA"]);
}

#[tokio::test]
async fn test_set_target_rolls_back_on_duplicate_ticker() {
    let (service, store) = service();
    seed(&store, &[("AAPL", dec!(60)), ("MSFT", dec!(40))]).await;

    let err = service
        .set_target_portfolio(SetTargetPortfolioParams {
            holdings: vec![target("GOOG", dec!(50)), target("GOOG", dec!(50))],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateKey { .. }));

    // The delete-all inside the failed transaction must not be visible
    let holdings = service.get_holdings().await.unwrap();
    assert_eq!(holdings.len(), 2);
    assert_eq!(weight_of(&holdings, "AAPL"), dec!(60));
}

// =============================================================================
// queries
// =============================================================================

#[tokio::test]
async fn test_summary_is_forwarded_from_store() {
    let (service, store) = service();
    seed(&store, &[("AAPL", dec!(60)), ("MSFT", dec!(40))]).await;

    let summary = service.get_portfolio_summary().await.unwrap();
    assert_eq!(summary.holding_count, 2);
    assert_eq!(summary.total_weight, dec!(100));
}
