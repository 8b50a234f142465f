//! Integration tests for ledger pagination and chunked writes.
//!
//! Tests verify the reader's keyset cursor and the writer's chunking:
//! 1. Pages come back in ascending seller order with no duplicates
//! 2. Chunk size is independent of page size and everyone still settles
//! 3. Sellers without settleable orders never reach the pipeline

use chrono::NaiveDate;
use settlement_core::commission::SellerGrade;
use settlement_core::config::SettlementConfig;
use settlement_core::job::run_settlement_job;
use settlement_core::ledger::{settlement_window, OrderItemRow, OrderRow, OrderStatus, SellerRow};
use settlement_core::reader::AggregateReader;
use settlement_core::registry::RunRegistry;
use settlement_core::store::SettlementStore;

fn store() -> SettlementStore {
    let store = SettlementStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn target_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

/// Seed `count` sellers, each with one delivered 10.00 order.
fn seed_sellers_with_orders(store: &mut SettlementStore, count: i64) {
    let (window_start, _) = settlement_window(target_date());
    let sellers: Vec<SellerRow> = (1..=count)
        .map(|id| SellerRow {
            id,
            name: format!("Seller {id}"),
            email: format!("seller{id}@example.com"),
            grade: SellerGrade::Bronze,
            business_number: format!("BRN-{id:08}"),
        })
        .collect();
    store.insert_sellers(&sellers).expect("insert sellers");

    let orders: Vec<OrderRow> = (1..=count)
        .map(|id| OrderRow {
            id,
            buyer_id: 3_000_000 + id,
            status: OrderStatus::Delivered,
            shipping_fee_minor: 0,
            coupon_discount_minor: 0,
            total_amount_minor: 10_00,
            ordered_at: window_start + id,
        })
        .collect();
    store.insert_orders(&orders).expect("insert orders");

    let items: Vec<OrderItemRow> = (1..=count)
        .map(|id| OrderItemRow {
            id,
            order_id: id,
            product_id: 1,
            seller_id: id,
            quantity: 1,
            unit_price_minor: 10_00,
            total_price_minor: 10_00,
        })
        .collect();
    store.insert_order_items(&items).expect("insert order items");
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: pages are ascending, disjoint, and sized 10/10/5 for 25 sellers
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn reader_pages_ascending_without_duplicates() {
    let mut store = store();
    seed_sellers_with_orders(&mut store, 25);

    let mut reader = AggregateReader::new(target_date(), 10);
    let mut page_sizes = Vec::new();
    let mut seen = Vec::new();
    while let Some(page) = reader.next_page(&store).expect("page read") {
        page_sizes.push(page.len());
        seen.extend(page.iter().map(|a| a.seller_id));
    }

    assert_eq!(page_sizes, vec![10, 10, 5]);
    assert_eq!(seen.len(), 25);
    assert!(
        seen.windows(2).all(|w| w[0] < w[1]),
        "seller ids must be strictly ascending across pages: {seen:?}"
    );

    // The reader stays exhausted once it has answered None.
    assert!(reader.next_page(&store).unwrap().is_none());
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: chunk size 7 against page size 10 still settles all 25
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn chunking_is_independent_of_page_size() {
    let mut store = store();
    seed_sellers_with_orders(&mut store, 25);

    let config = SettlementConfig {
        page_size: 10,
        chunk_size: 7,
        ..SettlementConfig::default()
    };
    let registry = RunRegistry::new();
    let report = run_settlement_job(&mut store, &registry, target_date(), &config)
        .expect("job should complete");

    assert_eq!(report.counts.read, 25);
    assert_eq!(report.counts.inserted, 25);
    // 25 settlements drain as 7+7+7 with a final chunk of 4.
    assert_eq!(report.counts.chunks, 4);
    assert_eq!(store.settlement_count(target_date()).unwrap(), 25);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: sellers without settleable orders are skipped entirely
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn sellers_without_orders_are_skipped() {
    let mut store = store();
    let (window_start, _) = settlement_window(target_date());
    let sellers: Vec<SellerRow> = (1..=3)
        .map(|id| SellerRow {
            id,
            name: format!("Seller {id}"),
            email: format!("seller{id}@example.com"),
            grade: SellerGrade::Gold,
            business_number: format!("BRN-{id:08}"),
        })
        .collect();
    store.insert_sellers(&sellers).unwrap();

    // Only seller 2 sold anything.
    store
        .insert_orders(&[OrderRow {
            id: 1,
            buyer_id: 3_100_000,
            status: OrderStatus::Paid,
            shipping_fee_minor: 0,
            coupon_discount_minor: 0,
            total_amount_minor: 42_00,
            ordered_at: window_start + 100,
        }])
        .unwrap();
    store
        .insert_order_items(&[OrderItemRow {
            id: 1,
            order_id: 1,
            product_id: 9,
            seller_id: 2,
            quantity: 1,
            unit_price_minor: 42_00,
            total_price_minor: 42_00,
        }])
        .unwrap();

    let mut reader = AggregateReader::new(target_date(), 10);
    let page = reader
        .next_page(&store)
        .unwrap()
        .expect("one page expected");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].seller_id, 2);
    assert!(reader.next_page(&store).unwrap().is_none());
}
