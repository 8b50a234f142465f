//! Keyset-paginated reads of per-seller ledger aggregates.

use crate::commission::SellerGrade;
use crate::error::SettlementResult;
use crate::store::SettlementStore;
use crate::types::SellerId;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Per-seller totals aggregated from the order ledger for one day.
///
/// `total_sales` sums item line totals, not order totals, so an order
/// spanning several sellers contributes to each seller separately.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerAggregate {
    pub seller_id: SellerId,
    pub grade: SellerGrade,
    pub total_sales: Decimal,
    pub order_count: i64,
    pub item_count: i64,
}

/// Pages through one day's aggregates in ascending seller id order.
///
/// The cursor is the last seller id returned; each page starts strictly
/// after it, so a page never repeats a seller and the reader terminates
/// on the first empty page regardless of writes landing behind the
/// cursor mid-run.
#[derive(Debug)]
pub struct AggregateReader {
    date: NaiveDate,
    page_size: u32,
    last_seller_id: SellerId,
    exhausted: bool,
}

impl AggregateReader {
    pub fn new(date: NaiveDate, page_size: u32) -> Self {
        Self {
            date,
            page_size,
            // Seller rowids start at 1, so 0 sits before every real id.
            last_seller_id: 0,
            exhausted: false,
        }
    }

    /// Fetch the next page, or `None` once the ledger is exhausted.
    pub fn next_page(
        &mut self,
        store: &SettlementStore,
    ) -> SettlementResult<Option<Vec<SellerAggregate>>> {
        if self.exhausted {
            return Ok(None);
        }
        let page = store.aggregate_page(self.date, self.last_seller_id, self.page_size)?;
        if page.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }
        if let Some(last) = page.last() {
            self.last_seller_id = last.seller_id;
        }
        log::debug!(
            "aggregation page read: {} sellers, cursor now at {}",
            page.len(),
            self.last_seller_id
        );
        Ok(Some(page))
    }
}
