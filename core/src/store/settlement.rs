//! Settlement table operations: the chunk upsert, verification totals,
//! statistics, and job-run bookkeeping.

use super::{date_text, timestamp, SettlementStore};
use crate::error::SettlementResult;
use crate::job::JobCounts;
use crate::money;
use crate::settlement::{Settlement, SettlementStatus};
use crate::types::{RunId, SellerId};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, ToSql};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// What one chunk write did to the settlements table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkStats {
    pub inserted: usize,
    pub updated: usize,
}

/// A persisted settlement row, read back with storage bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementRecord {
    pub id: i64,
    pub seller_id: SellerId,
    pub settlement_date: NaiveDate,
    pub total_sales: Decimal,
    pub commission_rate: Decimal,
    pub commission: Decimal,
    pub net_amount: Decimal,
    pub order_count: i64,
    pub item_count: i64,
    pub status: SettlementStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Aggregate statistics over one day's settlements.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementStats {
    pub seller_count: i64,
    pub total_sales: Decimal,
    pub total_commission: Decimal,
    pub total_net_amount: Decimal,
    pub total_orders: i64,
    pub total_items: i64,
}

/// One row of the job_runs audit table.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRunRow {
    pub run_id: RunId,
    pub target_date: NaiveDate,
    pub status: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub read_count: i64,
    pub insert_count: i64,
    pub update_count: i64,
    pub chunk_count: i64,
    pub error: Option<String>,
}

impl SettlementStore {
    // ── Settlement upsert ──────────────────────────────────────────

    /// Write one chunk of settlements for a single day in one transaction:
    /// fetch the existing `(seller, date)` rows, update those in place
    /// (refreshing `updated_at`, never `created_at`), insert the rest.
    ///
    /// Callers guarantee the chunk is non-empty, single-date, and free of
    /// duplicate sellers; a duplicate trips the unique index and rolls the
    /// whole chunk back.
    pub fn upsert_settlement_chunk(
        &mut self,
        date: NaiveDate,
        chunk: &[Settlement],
    ) -> SettlementResult<ChunkStats> {
        let date_str = date_text(date);
        let now = timestamp();
        let tx = self.conn.transaction()?;

        let existing: HashMap<SellerId, i64> = {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT seller_id, id FROM settlements
                 WHERE settlement_date = ? AND seller_id IN ({placeholders})"
            );
            let mut stmt = tx.prepare(&sql)?;
            let mut bind: Vec<&dyn ToSql> = Vec::with_capacity(chunk.len() + 1);
            bind.push(&date_str);
            for settlement in chunk {
                bind.push(&settlement.seller_id);
            }
            let rows = stmt
                .query_map(&bind[..], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
                })?
                .collect::<Result<HashMap<_, _>, _>>()?;
            rows
        };

        let mut stats = ChunkStats::default();
        {
            let mut update_stmt = tx.prepare(
                "UPDATE settlements
                 SET total_sales_minor = ?1, commission_rate_bps = ?2,
                     commission_minor = ?3, net_amount_minor = ?4,
                     order_count = ?5, item_count = ?6,
                     status = ?7, updated_at = ?8
                 WHERE id = ?9",
            )?;
            let mut insert_stmt = tx.prepare(
                "INSERT INTO settlements (seller_id, settlement_date,
                     total_sales_minor, commission_rate_bps, commission_minor,
                     net_amount_minor, order_count, item_count, status,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            )?;
            for settlement in chunk {
                let total_sales_minor = money::to_minor(settlement.total_sales)?;
                let rate_bps = money::to_rate_bps(settlement.commission_rate)?;
                let commission_minor = money::to_minor(settlement.commission)?;
                let net_amount_minor = money::to_minor(settlement.net_amount)?;
                match existing.get(&settlement.seller_id) {
                    Some(&row_id) => {
                        update_stmt.execute(params![
                            total_sales_minor,
                            rate_bps,
                            commission_minor,
                            net_amount_minor,
                            settlement.order_count,
                            settlement.item_count,
                            settlement.status.as_str(),
                            now,
                            row_id,
                        ])?;
                        stats.updated += 1;
                    }
                    None => {
                        insert_stmt.execute(params![
                            settlement.seller_id,
                            date_str,
                            total_sales_minor,
                            rate_bps,
                            commission_minor,
                            net_amount_minor,
                            settlement.order_count,
                            settlement.item_count,
                            settlement.status.as_str(),
                            now,
                        ])?;
                        stats.inserted += 1;
                    }
                }
            }
        }
        tx.commit()?;
        Ok(stats)
    }

    // ── Verification totals and statistics ─────────────────────────

    /// Sum of stored settlement totals for the day, in minor units.
    pub fn settlement_total_minor(&self, date: NaiveDate) -> SettlementResult<i64> {
        self.conn
            .query_row(
                "SELECT COALESCE(SUM(total_sales_minor), 0)
                 FROM settlements WHERE settlement_date = ?1",
                params![date_text(date)],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    pub fn settlement_stats(&self, date: NaiveDate) -> SettlementResult<SettlementStats> {
        self.conn
            .query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(total_sales_minor), 0),
                        COALESCE(SUM(commission_minor), 0),
                        COALESCE(SUM(net_amount_minor), 0),
                        COALESCE(SUM(order_count), 0),
                        COALESCE(SUM(item_count), 0)
                 FROM settlements WHERE settlement_date = ?1",
                params![date_text(date)],
                |row| {
                    Ok(SettlementStats {
                        seller_count: row.get(0)?,
                        total_sales: money::from_minor(row.get(1)?),
                        total_commission: money::from_minor(row.get(2)?),
                        total_net_amount: money::from_minor(row.get(3)?),
                        total_orders: row.get(4)?,
                        total_items: row.get(5)?,
                    })
                },
            )
            .map_err(Into::into)
    }

    // ── Settlement reads ───────────────────────────────────────────

    pub fn settlements_for_date(&self, date: NaiveDate) -> SettlementResult<Vec<SettlementRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, seller_id, settlement_date, total_sales_minor,
                    commission_rate_bps, commission_minor, net_amount_minor,
                    order_count, item_count, status, created_at, updated_at
             FROM settlements
             WHERE settlement_date = ?1
             ORDER BY seller_id ASC",
        )?;
        let rows = stmt
            .query_map(params![date_text(date)], map_settlement_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn settlement_for(
        &self,
        seller_id: SellerId,
        date: NaiveDate,
    ) -> SettlementResult<Option<SettlementRecord>> {
        self.conn
            .query_row(
                "SELECT id, seller_id, settlement_date, total_sales_minor,
                        commission_rate_bps, commission_minor, net_amount_minor,
                        order_count, item_count, status, created_at, updated_at
                 FROM settlements
                 WHERE seller_id = ?1 AND settlement_date = ?2",
                params![seller_id, date_text(date)],
                map_settlement_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Move one settlement to a new lifecycle status.
    pub fn update_settlement_status(
        &self,
        seller_id: SellerId,
        date: NaiveDate,
        status: SettlementStatus,
    ) -> SettlementResult<()> {
        self.conn.execute(
            "UPDATE settlements SET status = ?1, updated_at = ?2
             WHERE seller_id = ?3 AND settlement_date = ?4",
            params![status.as_str(), timestamp(), seller_id, date_text(date)],
        )?;
        Ok(())
    }

    pub fn settlement_count(&self, date: NaiveDate) -> SettlementResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM settlements WHERE settlement_date = ?1",
                params![date_text(date)],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    // ── Job runs ───────────────────────────────────────────────────

    pub fn insert_job_run(
        &self,
        run_id: &str,
        target_date: NaiveDate,
        started_at: &str,
    ) -> SettlementResult<()> {
        self.conn.execute(
            "INSERT INTO job_runs (run_id, target_date, status, started_at)
             VALUES (?1, ?2, 'RUNNING', ?3)",
            params![run_id, date_text(target_date), started_at],
        )?;
        Ok(())
    }

    pub fn finish_job_run(
        &self,
        run_id: &str,
        status: &str,
        finished_at: &str,
        counts: &JobCounts,
        error: Option<&str>,
    ) -> SettlementResult<()> {
        self.conn.execute(
            "UPDATE job_runs
             SET status = ?1, finished_at = ?2, read_count = ?3,
                 insert_count = ?4, update_count = ?5, chunk_count = ?6,
                 error = ?7
             WHERE run_id = ?8",
            params![
                status,
                finished_at,
                counts.read as i64,
                counts.inserted as i64,
                counts.updated as i64,
                counts.chunks as i64,
                error,
                run_id,
            ],
        )?;
        Ok(())
    }

    pub fn job_run(&self, run_id: &str) -> SettlementResult<Option<JobRunRow>> {
        self.conn
            .query_row(
                "SELECT run_id, target_date, status, started_at, finished_at,
                        read_count, insert_count, update_count, chunk_count, error
                 FROM job_runs WHERE run_id = ?1",
                params![run_id],
                map_job_run_row,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn job_runs_for_date(&self, date: NaiveDate) -> SettlementResult<Vec<JobRunRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, target_date, status, started_at, finished_at,
                    read_count, insert_count, update_count, chunk_count, error
             FROM job_runs WHERE target_date = ?1
             ORDER BY started_at ASC",
        )?;
        let rows = stmt
            .query_map(params![date_text(date)], map_job_run_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── Test helper methods ────────────────────────────────────────

    /// Force a stored settlement total, bypassing the pipeline. Lets
    /// tests manufacture the divergence the verifier must catch.
    pub fn overwrite_settlement_total(
        &self,
        seller_id: SellerId,
        date: NaiveDate,
        total_sales_minor: i64,
    ) -> SettlementResult<()> {
        self.conn.execute(
            "UPDATE settlements SET total_sales_minor = ?1
             WHERE seller_id = ?2 AND settlement_date = ?3",
            params![total_sales_minor, seller_id, date_text(date)],
        )?;
        Ok(())
    }
}

fn map_settlement_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SettlementRecord> {
    let date_str: String = row.get(2)?;
    let settlement_date = NaiveDate::parse_from_str(&date_str, super::DATE_FMT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    let status_str: String = row.get(9)?;
    let status: SettlementStatus = status_str
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?;
    Ok(SettlementRecord {
        id: row.get(0)?,
        seller_id: row.get(1)?,
        settlement_date,
        total_sales: money::from_minor(row.get(3)?),
        commission_rate: money::from_rate_bps(row.get(4)?),
        commission: money::from_minor(row.get(5)?),
        net_amount: money::from_minor(row.get(6)?),
        order_count: row.get(7)?,
        item_count: row.get(8)?,
        status,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn map_job_run_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<JobRunRow> {
    let date_str: String = row.get(1)?;
    let target_date = NaiveDate::parse_from_str(&date_str, super::DATE_FMT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    Ok(JobRunRow {
        run_id: row.get(0)?,
        target_date,
        status: row.get(2)?,
        started_at: row.get(3)?,
        finished_at: row.get(4)?,
        read_count: row.get(5)?,
        insert_count: row.get(6)?,
        update_count: row.get(7)?,
        chunk_count: row.get(8)?,
        error: row.get(9)?,
    })
}
