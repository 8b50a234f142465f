//! Integration tests for the run triggers.
//!
//! Tests verify the single-date, range, and conflict behaviour:
//! 1. A reversed range is rejected outright
//! 2. A range settles day by day, and an empty day still succeeds
//! 3. A conflict mid-range is tallied without stopping the rest
//! 4. A conflicting single-date run reports the conflict and leaves no job row

use chrono::NaiveDate;
use settlement_core::commission::SellerGrade;
use settlement_core::config::SettlementConfig;
use settlement_core::error::SettlementError;
use settlement_core::ledger::{settlement_window, OrderItemRow, OrderRow, OrderStatus, SellerRow};
use settlement_core::registry::RunRegistry;
use settlement_core::store::SettlementStore;
use settlement_core::trigger::{run_for_date, run_for_range, RunStatus};

fn store() -> SettlementStore {
    let store = SettlementStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

/// One delivered order for seller 1 on `date`.
fn seed_day(store: &mut SettlementStore, order_id: i64, date: NaiveDate) {
    let (window_start, _) = settlement_window(date);
    store
        .insert_orders(&[OrderRow {
            id: order_id,
            buyer_id: 6_000_000 + order_id,
            status: OrderStatus::Delivered,
            shipping_fee_minor: 0,
            coupon_discount_minor: 0,
            total_amount_minor: 25_00,
            ordered_at: window_start + 3600,
        }])
        .expect("insert order");
    store
        .insert_order_items(&[OrderItemRow {
            id: order_id,
            order_id,
            product_id: 1,
            seller_id: 1,
            quantity: 1,
            unit_price_minor: 25_00,
            total_price_minor: 25_00,
        }])
        .expect("insert order item");
}

fn seed_seller(store: &mut SettlementStore) {
    store
        .insert_sellers(&[SellerRow {
            id: 1,
            name: "Seller 1".into(),
            email: "seller1@example.com".into(),
            grade: SellerGrade::Silver,
            business_number: "BRN-00000001".into(),
        }])
        .expect("insert seller");
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: reversed range is rejected before anything runs
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn reversed_range_is_rejected() {
    let mut store = store();
    let registry = RunRegistry::new();
    let err = run_for_range(
        &mut store,
        &registry,
        day(10),
        day(5),
        &SettlementConfig::default(),
    )
    .unwrap_err();
    match err {
        SettlementError::InvalidDateRange { start, end } => {
            assert_eq!(start, day(10));
            assert_eq!(end, day(5));
        }
        other => panic!("expected InvalidDateRange, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: three-day range, middle day empty, all three succeed
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn range_settles_each_day_independently() {
    let mut store = store();
    seed_seller(&mut store);
    seed_day(&mut store, 1, day(1));
    seed_day(&mut store, 2, day(3));

    let registry = RunRegistry::new();
    let outcome = run_for_range(
        &mut store,
        &registry,
        day(1),
        day(3),
        &SettlementConfig::default(),
    )
    .expect("range should run");

    assert_eq!(outcome.total_days, 3);
    assert_eq!(outcome.success_count, 3);
    assert_eq!(outcome.fail_count, 0);
    assert_eq!(outcome.outcomes.len(), 3);

    let dates: Vec<NaiveDate> = outcome.outcomes.iter().map(|o| o.target_date).collect();
    assert_eq!(dates, vec![day(1), day(2), day(3)]);

    // The empty middle day completed with nothing to do.
    let middle = &outcome.outcomes[1];
    assert_eq!(middle.status, RunStatus::Success);
    assert_eq!(middle.counts.expect("counts on success").read, 0);

    assert_eq!(store.settlement_count(day(1)).unwrap(), 1);
    assert_eq!(store.settlement_count(day(2)).unwrap(), 0);
    assert_eq!(store.settlement_count(day(3)).unwrap(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: a conflicting middle day is tallied, the rest keeps going
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn conflict_mid_range_does_not_stop_the_rest() {
    let mut store = store();
    seed_seller(&mut store);
    seed_day(&mut store, 1, day(1));
    seed_day(&mut store, 2, day(3));

    let registry = RunRegistry::new();
    // Another job is already settling day 2.
    let _held = registry.acquire(day(2)).unwrap();

    let outcome = run_for_range(
        &mut store,
        &registry,
        day(1),
        day(3),
        &SettlementConfig::default(),
    )
    .expect("range should run");

    assert_eq!(outcome.success_count, 2);
    assert_eq!(outcome.fail_count, 1);

    let failed = &outcome.outcomes[1];
    assert_eq!(failed.target_date, day(2));
    assert_eq!(failed.status, RunStatus::Error);
    assert!(failed.conflict, "the failure must be marked as a conflict");
    let message = failed.message.as_deref().unwrap_or_default();
    assert!(
        message.contains("already running"),
        "message should say the date is already running: {message}"
    );

    // The surrounding days still settled.
    assert_eq!(store.settlement_count(day(1)).unwrap(), 1);
    assert_eq!(store.settlement_count(day(3)).unwrap(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: single-date conflict reports cleanly and records no run
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn single_date_conflict_leaves_no_job_row() {
    let mut store = store();
    seed_seller(&mut store);
    seed_day(&mut store, 1, day(14));

    let registry = RunRegistry::new();
    let _held = registry.acquire(day(14)).unwrap();

    let outcome = run_for_date(&mut store, &registry, day(14), &SettlementConfig::default());
    assert_eq!(outcome.status, RunStatus::Error);
    assert!(outcome.conflict);
    assert!(outcome.run_id.is_none(), "no run was started");

    // The job never got far enough to write a job_runs row.
    assert!(store.job_runs_for_date(day(14)).unwrap().is_empty());
    assert_eq!(store.settlement_count(day(14)).unwrap(), 0);

    // Once the holder finishes, the date settles normally.
    drop(_held);
    let retry = run_for_date(&mut store, &registry, day(14), &SettlementConfig::default());
    assert_eq!(retry.status, RunStatus::Success);
    assert_eq!(store.settlement_count(day(14)).unwrap(), 1);
}
