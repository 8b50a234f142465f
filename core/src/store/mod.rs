//! SQLite persistence layer.
//!
//! RULE: Only the store modules talk to the database.
//! Pipeline components call store methods; they never execute SQL directly.
//!
//! Storage formats: money is integer minor units, commission rates are
//! integer basis points (rate * 10_000), `ordered_at` is unix seconds,
//! settlement dates are `YYYY-MM-DD` text, and audit timestamps are
//! microsecond-precision text written through [`timestamp`].

use crate::error::SettlementResult;
use crate::ledger::{OrderItemRow, OrderRow, ProductRow, SellerRow};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection};

mod aggregate;
mod settlement;

pub use aggregate::SellerDiffRow;
pub use settlement::{ChunkStats, JobRunRow, SettlementRecord, SettlementStats};

const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const DATE_FMT: &str = "%Y-%m-%d";

/// Current UTC wall clock in the audit-column text format.
pub fn timestamp() -> String {
    Utc::now().format(TIMESTAMP_FMT).to_string()
}

/// A date in the `settlement_date` column format.
pub(crate) fn date_text(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

pub struct SettlementStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl SettlementStore {
    pub fn open(path: &str) -> SettlementResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SettlementResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// The file path this store was opened with, if any.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SettlementResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_ledger.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_settlements.sql"))?;
        Ok(())
    }

    // ── Ledger inserts ─────────────────────────────────────────────
    // One transaction per slice; the generator feeds these in batches.

    pub fn insert_sellers(&mut self, rows: &[SellerRow]) -> SettlementResult<()> {
        let now = timestamp();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO sellers (id, name, email, grade, business_number, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.id,
                    row.name,
                    row.email,
                    row.grade.as_str(),
                    row.business_number,
                    now,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn insert_products(&mut self, rows: &[ProductRow]) -> SettlementResult<()> {
        let now = timestamp();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO products (id, seller_id, name, price_minor, stock, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.id,
                    row.seller_id,
                    row.name,
                    row.price_minor,
                    row.stock,
                    row.status.as_str(),
                    now,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn insert_orders(&mut self, rows: &[OrderRow]) -> SettlementResult<()> {
        let now = timestamp();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO orders (id, buyer_id, status, shipping_fee_minor,
                                     coupon_discount_minor, total_amount_minor,
                                     ordered_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.id,
                    row.buyer_id,
                    row.status.as_str(),
                    row.shipping_fee_minor,
                    row.coupon_discount_minor,
                    row.total_amount_minor,
                    row.ordered_at,
                    now,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn insert_order_items(&mut self, rows: &[OrderItemRow]) -> SettlementResult<()> {
        let now = timestamp();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO order_items (id, order_id, product_id, seller_id,
                                          quantity, unit_price_minor, total_price_minor, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.id,
                    row.order_id,
                    row.product_id,
                    row.seller_id,
                    row.quantity,
                    row.unit_price_minor,
                    row.total_price_minor,
                    now,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ── Test / summary helpers ─────────────────────────────────────

    pub fn seller_count(&self) -> SettlementResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM sellers", [], |row| row.get(0))
            .map_err(Into::into)
    }

    pub fn order_count(&self) -> SettlementResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))
            .map_err(Into::into)
    }

    pub fn order_item_count(&self) -> SettlementResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM order_items", [], |row| row.get(0))
            .map_err(Into::into)
    }

    /// Earliest and latest `ordered_at` across all orders, if any.
    pub fn order_timestamp_range(&self) -> SettlementResult<Option<(i64, i64)>> {
        let range = self.conn.query_row(
            "SELECT MIN(ordered_at), MAX(ordered_at) FROM orders",
            [],
            |row| {
                Ok((
                    row.get::<_, Option<i64>>(0)?,
                    row.get::<_, Option<i64>>(1)?,
                ))
            },
        )?;
        Ok(match range {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        })
    }

    /// Insert one seller with a raw grade string. The grade column is
    /// not CHECK-constrained, so tests can plant grades the pipeline
    /// has never heard of.
    pub fn insert_seller_with_grade(
        &self,
        id: crate::types::SellerId,
        grade: &str,
    ) -> SettlementResult<()> {
        let now = timestamp();
        self.conn.execute(
            "INSERT INTO sellers (id, name, email, grade, business_number, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                id,
                format!("Seller {id}"),
                format!("seller{id}@example.com"),
                grade,
                format!("BRN-{id:08}"),
                now,
            ],
        )?;
        Ok(())
    }
}
