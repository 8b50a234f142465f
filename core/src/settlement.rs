//! The computed settlement for one seller on one day.

use crate::error::SettlementError;
use crate::types::SellerId;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a settlement row. The pipeline only ever writes
/// `Pending`; every recompute resets the row to `Pending` so a
/// downstream payout approval restarts from scratch on fresher numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    Pending,
    Confirmed,
    Paid,
}

impl SettlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Pending => "PENDING",
            SettlementStatus::Confirmed => "CONFIRMED",
            SettlementStatus::Paid => "PAID",
        }
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettlementStatus {
    type Err = SettlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(SettlementStatus::Pending),
            "CONFIRMED" => Ok(SettlementStatus::Confirmed),
            "PAID" => Ok(SettlementStatus::Paid),
            other => Err(SettlementError::UnknownStatus {
                value: other.to_string(),
            }),
        }
    }
}

/// One seller's settlement for one day, ready to be written.
///
/// Invariant: `net_amount = total_sales - commission`, with `commission`
/// already rounded to two places. The store stamps `created_at` /
/// `updated_at` at write time; they are storage concerns, not part of
/// the computed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub seller_id: SellerId,
    pub settlement_date: NaiveDate,
    pub total_sales: Decimal,
    pub commission_rate: Decimal,
    pub commission: Decimal,
    pub net_amount: Decimal,
    pub order_count: i64,
    pub item_count: i64,
    pub status: SettlementStatus,
}
