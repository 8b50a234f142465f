//! Ledger-side aggregation queries: the reader's page query and the
//! verifier's ground-truth totals.
//!
//! Every query here filters orders to the settlement day window and the
//! settleable status set, so the reader and the verifier can never
//! disagree about which ledger rows count.

use super::{date_text, SettlementStore};
use crate::error::SettlementResult;
use crate::ledger::{settleable_status_sql, settlement_window};
use crate::reader::SellerAggregate;
use crate::types::SellerId;
use chrono::NaiveDate;
use rusqlite::params;

/// One seller whose ledger total and stored settlement total disagree.
/// Raw minor units; the verifier turns these into decimals for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SellerDiffRow {
    pub seller_id: SellerId,
    pub ledger_minor: i64,
    pub settlement_minor: i64,
}

impl SettlementStore {
    /// One page of per-seller aggregates for `date`, keyset-paginated:
    /// only sellers with id strictly greater than `after_seller`, in
    /// ascending id order, at most `page_size` rows.
    pub fn aggregate_page(
        &self,
        date: NaiveDate,
        after_seller: SellerId,
        page_size: u32,
    ) -> SettlementResult<Vec<SellerAggregate>> {
        let (window_start, window_end) = settlement_window(date);
        let statuses = settleable_status_sql();
        let sql = format!(
            "SELECT s.id,
                    s.grade,
                    SUM(oi.total_price_minor),
                    COUNT(DISTINCT oi.order_id),
                    COUNT(oi.id)
             FROM order_items oi
             JOIN orders o ON o.id = oi.order_id
             JOIN sellers s ON s.id = oi.seller_id
             WHERE o.ordered_at >= ?1 AND o.ordered_at < ?2
               AND o.status IN ({statuses})
               AND s.id > ?3
             GROUP BY s.id, s.grade
             ORDER BY s.id ASC
             LIMIT ?4"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let raw = stmt
            .query_map(
                params![window_start, window_end, after_seller, page_size],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(seller_id, grade, total_minor, order_count, item_count)| {
                Ok(SellerAggregate {
                    seller_id,
                    grade: grade.parse()?,
                    total_sales: crate::money::from_minor(total_minor),
                    order_count,
                    item_count,
                })
            })
            .collect()
    }

    /// Ground-truth ledger total for the day, in minor units.
    pub fn ledger_total_minor(&self, date: NaiveDate) -> SettlementResult<i64> {
        let (window_start, window_end) = settlement_window(date);
        let statuses = settleable_status_sql();
        let sql = format!(
            "SELECT COALESCE(SUM(oi.total_price_minor), 0)
             FROM order_items oi
             JOIN orders o ON o.id = oi.order_id
             WHERE o.ordered_at >= ?1 AND o.ordered_at < ?2
               AND o.status IN ({statuses})"
        );
        self.conn
            .query_row(&sql, params![window_start, window_end], |row| row.get(0))
            .map_err(Into::into)
    }

    /// Per-seller divergences between the ledger and the settlements
    /// table for the day, worst absolute difference first, capped at
    /// `limit` rows. Sellers with a matching total do not appear. The
    /// comparison covers both sides: a settlement row with no ledger
    /// rows behind it counts as a full divergence.
    pub fn ledger_mismatches(
        &self,
        date: NaiveDate,
        limit: u32,
    ) -> SettlementResult<Vec<SellerDiffRow>> {
        let (window_start, window_end) = settlement_window(date);
        let statuses = settleable_status_sql();
        let sql = format!(
            "WITH ledger AS (
                 SELECT oi.seller_id AS seller_id,
                        SUM(oi.total_price_minor) AS ledger_minor
                 FROM order_items oi
                 JOIN orders o ON o.id = oi.order_id
                 WHERE o.ordered_at >= ?1 AND o.ordered_at < ?2
                   AND o.status IN ({statuses})
                 GROUP BY oi.seller_id
             ),
             settled AS (
                 SELECT seller_id, total_sales_minor AS settlement_minor
                 FROM settlements
                 WHERE settlement_date = ?3
             ),
             pairs AS (
                 SELECT l.seller_id,
                        l.ledger_minor,
                        COALESCE(s.settlement_minor, 0) AS settlement_minor
                 FROM ledger l
                 LEFT JOIN settled s ON s.seller_id = l.seller_id
                 UNION ALL
                 SELECT s.seller_id, 0, s.settlement_minor
                 FROM settled s
                 WHERE s.seller_id NOT IN (SELECT seller_id FROM ledger)
             )
             SELECT seller_id, ledger_minor, settlement_minor
             FROM pairs
             WHERE ledger_minor != settlement_minor
             ORDER BY ABS(ledger_minor - settlement_minor) DESC, seller_id ASC
             LIMIT ?4"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![window_start, window_end, date_text(date), limit],
                |row| {
                    Ok(SellerDiffRow {
                        seller_id: row.get(0)?,
                        ledger_minor: row.get(1)?,
                        settlement_minor: row.get(2)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
