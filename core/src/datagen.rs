//! Deterministic synthetic ledger generator. Seeds a realistic day of
//! sellers, products, orders, and order items so settlement runs have
//! something to chew on; the same seed always produces the same ledger.

use crate::commission::SellerGrade;
use crate::error::{SettlementError, SettlementResult};
use crate::ledger::{
    settlement_window, OrderItemRow, OrderRow, OrderStatus, ProductRow, ProductStatus, SellerRow,
};
use crate::store::SettlementStore;
use crate::types::{ProductId, SellerId};
use chrono::NaiveDate;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::Serialize;
use std::time::Instant;

/// Rows are buffered and flushed in batches of this size.
const BATCH_SIZE: usize = 5_000;

/// Orders at or above this subtotal ship free; the rest pay the flat fee.
const FREE_SHIPPING_THRESHOLD_MINOR: i64 = 5_000_00;
const SHIPPING_FEE_MINOR: i64 = 30_00;

/// Shape of the ledger to generate.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub seller_count: u32,
    pub products_per_seller: u32,
    pub order_count: u32,
    pub items_per_order: u32,
    pub target_date: NaiveDate,
}

impl GeneratorConfig {
    /// Baseline shape: 100 sellers with 10 products each and 10,000
    /// four-item orders, all placed on `target_date`.
    pub fn for_date(target_date: NaiveDate) -> Self {
        Self {
            seed: 42,
            seller_count: 100,
            products_per_seller: 10,
            order_count: 10_000,
            items_per_order: 4,
            target_date,
        }
    }

    pub fn validate(&self) -> SettlementResult<()> {
        if self.order_count > 0 && (self.seller_count == 0 || self.products_per_seller == 0) {
            return Err(SettlementError::InvalidConfig {
                reason: "orders need a non-empty product catalog".into(),
            });
        }
        Ok(())
    }
}

/// How many rows of each kind a generation run produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedCounts {
    pub sellers: u64,
    pub products: u64,
    pub orders: u64,
    pub order_items: u64,
}

struct LedgerRng {
    rng: Pcg64Mcg,
}

impl LedgerRng {
    fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Uniform draw in `0..n`.
    fn below(&mut self, n: i64) -> i64 {
        self.rng.gen_range(0..n)
    }

    fn percent(&mut self) -> i64 {
        self.below(100)
    }
}

/// 40% bronze, 30% silver, 20% gold, 10% platinum.
fn grade_for(roll: i64) -> SellerGrade {
    match roll {
        0..=39 => SellerGrade::Bronze,
        40..=69 => SellerGrade::Silver,
        70..=89 => SellerGrade::Gold,
        _ => SellerGrade::Platinum,
    }
}

/// 60% delivered, 15% shipped, 10% paid, 10% refunded, 5% cancelled.
/// The refunded and cancelled tail never settles, so a generated
/// ledger always exercises the status filter.
fn status_for(roll: i64) -> OrderStatus {
    match roll {
        0..=59 => OrderStatus::Delivered,
        60..=74 => OrderStatus::Shipped,
        75..=84 => OrderStatus::Paid,
        85..=94 => OrderStatus::Refunded,
        _ => OrderStatus::Cancelled,
    }
}

/// Generate a full day's ledger into `store`.
///
/// Ids are sequential from 1 per table. All orders land inside the
/// target date's settlement window, spread uniformly across the day.
pub fn generate_ledger(
    store: &mut SettlementStore,
    config: &GeneratorConfig,
) -> SettlementResult<GeneratedCounts> {
    config.validate()?;
    let clock = Instant::now();
    let mut rng = LedgerRng::new(config.seed);
    let (window_start, _) = settlement_window(config.target_date);
    log::info!(
        "generating ledger for {}: {} sellers, {} products, {} orders, seed {}",
        config.target_date,
        config.seller_count,
        config.seller_count as u64 * config.products_per_seller as u64,
        config.order_count,
        config.seed
    );

    let mut counts = GeneratedCounts::default();

    let mut seller_batch: Vec<SellerRow> = Vec::new();
    for seller_id in 1..=config.seller_count as i64 {
        seller_batch.push(SellerRow {
            id: seller_id,
            name: format!("Seller {seller_id}"),
            email: format!("seller{seller_id}@example.com"),
            grade: grade_for(rng.percent()),
            business_number: format!("BRN-{seller_id:08}"),
        });
        if seller_batch.len() >= BATCH_SIZE {
            store.insert_sellers(&seller_batch)?;
            counts.sellers += seller_batch.len() as u64;
            seller_batch.clear();
        }
    }
    if !seller_batch.is_empty() {
        store.insert_sellers(&seller_batch)?;
        counts.sellers += seller_batch.len() as u64;
    }

    // The catalog stays in memory so order items can price off it.
    let mut catalog: Vec<(ProductId, SellerId, i64)> =
        Vec::with_capacity(config.seller_count as usize * config.products_per_seller as usize);
    let mut product_batch: Vec<ProductRow> = Vec::new();
    let mut product_id: ProductId = 0;
    for seller_id in 1..=config.seller_count as i64 {
        for _ in 0..config.products_per_seller {
            product_id += 1;
            let price_minor = 1_00 + rng.below(999_00);
            product_batch.push(ProductRow {
                id: product_id,
                seller_id,
                name: format!("Product {product_id}"),
                price_minor,
                stock: 100 + rng.below(900),
                status: ProductStatus::Active,
            });
            catalog.push((product_id, seller_id, price_minor));
            if product_batch.len() >= BATCH_SIZE {
                store.insert_products(&product_batch)?;
                counts.products += product_batch.len() as u64;
                product_batch.clear();
            }
        }
    }
    if !product_batch.is_empty() {
        store.insert_products(&product_batch)?;
        counts.products += product_batch.len() as u64;
    }

    let mut order_batch: Vec<OrderRow> = Vec::new();
    let mut item_batch: Vec<OrderItemRow> = Vec::new();
    let mut item_id: i64 = 0;
    for order_id in 1..=config.order_count as i64 {
        let mut subtotal = 0i64;
        for _ in 0..config.items_per_order {
            item_id += 1;
            let (product_id, seller_id, price_minor) =
                catalog[rng.below(catalog.len() as i64) as usize];
            let quantity = 1 + rng.below(3);
            let total_price_minor = price_minor * quantity;
            subtotal += total_price_minor;
            item_batch.push(OrderItemRow {
                id: item_id,
                order_id,
                product_id,
                seller_id,
                quantity,
                unit_price_minor: price_minor,
                total_price_minor,
            });
        }
        let shipping_fee_minor = if subtotal >= FREE_SHIPPING_THRESHOLD_MINOR {
            0
        } else {
            SHIPPING_FEE_MINOR
        };
        // One order in ten carries a 10% coupon.
        let coupon_discount_minor = if rng.below(10) == 0 { subtotal / 10 } else { 0 };
        order_batch.push(OrderRow {
            id: order_id,
            buyer_id: 1_000_000 + rng.below(9_000_000),
            status: status_for(rng.percent()),
            shipping_fee_minor,
            coupon_discount_minor,
            total_amount_minor: subtotal + shipping_fee_minor - coupon_discount_minor,
            ordered_at: window_start + rng.below(86_400),
        });
        if order_batch.len() >= BATCH_SIZE {
            // Orders land first so the item rows have parents.
            store.insert_orders(&order_batch)?;
            counts.orders += order_batch.len() as u64;
            order_batch.clear();
            store.insert_order_items(&item_batch)?;
            counts.order_items += item_batch.len() as u64;
            item_batch.clear();
            log::info!("generated {} of {} orders", counts.orders, config.order_count);
        }
    }
    if !order_batch.is_empty() {
        store.insert_orders(&order_batch)?;
        counts.orders += order_batch.len() as u64;
    }
    if !item_batch.is_empty() {
        store.insert_order_items(&item_batch)?;
        counts.order_items += item_batch.len() as u64;
    }

    log::info!(
        "ledger generated in {} ms: {} sellers, {} products, {} orders, {} order items",
        clock.elapsed().as_millis(),
        counts.sellers,
        counts.products,
        counts.orders,
        counts.order_items
    );
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_distribution_boundaries() {
        assert_eq!(grade_for(0), SellerGrade::Bronze);
        assert_eq!(grade_for(39), SellerGrade::Bronze);
        assert_eq!(grade_for(40), SellerGrade::Silver);
        assert_eq!(grade_for(69), SellerGrade::Silver);
        assert_eq!(grade_for(70), SellerGrade::Gold);
        assert_eq!(grade_for(89), SellerGrade::Gold);
        assert_eq!(grade_for(90), SellerGrade::Platinum);
        assert_eq!(grade_for(99), SellerGrade::Platinum);
    }

    #[test]
    fn status_distribution_boundaries() {
        assert_eq!(status_for(0), OrderStatus::Delivered);
        assert_eq!(status_for(59), OrderStatus::Delivered);
        assert_eq!(status_for(60), OrderStatus::Shipped);
        assert_eq!(status_for(74), OrderStatus::Shipped);
        assert_eq!(status_for(75), OrderStatus::Paid);
        assert_eq!(status_for(84), OrderStatus::Paid);
        assert_eq!(status_for(85), OrderStatus::Refunded);
        assert_eq!(status_for(94), OrderStatus::Refunded);
        assert_eq!(status_for(95), OrderStatus::Cancelled);
        assert_eq!(status_for(99), OrderStatus::Cancelled);
    }

    #[test]
    fn empty_catalog_with_orders_is_rejected() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let mut config = GeneratorConfig::for_date(date);
        config.seller_count = 0;
        assert!(matches!(
            config.validate(),
            Err(SettlementError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let mut a = LedgerRng::new(7);
        let mut b = LedgerRng::new(7);
        let draws_a: Vec<i64> = (0..32).map(|_| a.below(1_000)).collect();
        let draws_b: Vec<i64> = (0..32).map(|_| b.below(1_000)).collect();
        assert_eq!(draws_a, draws_b);
    }
}
