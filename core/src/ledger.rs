//! Order ledger domain: statuses, insert row shapes, and the settlement
//! day window.
//!
//! The ledger is append-only as far as this pipeline is concerned. Rows
//! are written by the data generator (or an upstream shop system) and
//! only ever read during settlement.

use crate::commission::SellerGrade;
use crate::error::SettlementError;
use crate::types::{OrderId, ProductId, SellerId};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Refunded,
    Cancelled,
}

/// Statuses that count toward settlement. Unpaid and reversed orders
/// stay out of the totals.
pub const SETTLEABLE_STATUSES: [OrderStatus; 3] = [
    OrderStatus::Delivered,
    OrderStatus::Shipped,
    OrderStatus::Paid,
];

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Refunded => "REFUNDED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_settleable(&self) -> bool {
        SETTLEABLE_STATUSES.contains(self)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = SettlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PAID" => Ok(OrderStatus::Paid),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "REFUNDED" => Ok(OrderStatus::Refunded),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(SettlementError::UnknownStatus {
                value: other.to_string(),
            }),
        }
    }
}

/// The settleable statuses as a quoted SQL list, for `IN (...)` clauses.
/// The set is a closed enum, so inlining it into SQL is safe.
pub fn settleable_status_sql() -> String {
    SETTLEABLE_STATUSES
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductStatus {
    Active,
    SoldOut,
    Discontinued,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "ACTIVE",
            ProductStatus::SoldOut => "SOLD_OUT",
            ProductStatus::Discontinued => "DISCONTINUED",
        }
    }
}

/// Half-open unix-seconds window `[00:00 of date, 00:00 of date+1)` in UTC.
pub fn settlement_window(date: NaiveDate) -> (i64, i64) {
    let start = NaiveDateTime::new(date, NaiveTime::MIN).and_utc().timestamp();
    let end = match date.succ_opt() {
        Some(next) => NaiveDateTime::new(next, NaiveTime::MIN).and_utc().timestamp(),
        // date == NaiveDate::MAX; leave the window open-ended.
        None => i64::MAX,
    };
    (start, end)
}

// ── Insert row shapes ──────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SellerRow {
    pub id: SellerId,
    pub name: String,
    pub email: String,
    pub grade: SellerGrade,
    pub business_number: String,
}

#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: ProductId,
    pub seller_id: SellerId,
    pub name: String,
    pub price_minor: i64,
    pub stock: i64,
    pub status: ProductStatus,
}

#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: OrderId,
    pub buyer_id: i64,
    pub status: OrderStatus,
    pub shipping_fee_minor: i64,
    pub coupon_discount_minor: i64,
    pub total_amount_minor: i64,
    pub ordered_at: i64,
}

#[derive(Debug, Clone)]
pub struct OrderItemRow {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub seller_id: SellerId,
    pub quantity: i64,
    pub unit_price_minor: i64,
    pub total_price_minor: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn window_covers_exactly_one_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (start, end) = settlement_window(date);
        assert_eq!(end - start, 86_400, "window must span 24h of unix seconds");
    }

    #[test]
    fn settleable_set_excludes_refunds_and_cancellations() {
        assert!(OrderStatus::Delivered.is_settleable());
        assert!(OrderStatus::Shipped.is_settleable());
        assert!(OrderStatus::Paid.is_settleable());
        assert!(!OrderStatus::Pending.is_settleable());
        assert!(!OrderStatus::Refunded.is_settleable());
        assert!(!OrderStatus::Cancelled.is_settleable());
    }

    #[test]
    fn settleable_sql_list_is_quoted() {
        assert_eq!(settleable_status_sql(), "'DELIVERED','SHIPPED','PAID'");
    }
}
