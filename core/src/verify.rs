//! Post-write reconciliation. The settled totals must equal what the
//! ledger says was sold; any divergence fails the day.

use crate::error::{SettlementError, SettlementResult};
use crate::money;
use crate::store::{SettlementStats, SettlementStore};
use crate::types::SellerId;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// One seller whose settled total diverges from the ledger.
///
/// `diff` is ledger minus settled, so a positive diff means sales the
/// settlement missed and a negative one means it over-paid.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerDiff {
    pub seller_id: SellerId,
    pub ledger_total: Decimal,
    pub settlement_total: Decimal,
    pub diff: Decimal,
}

/// Outcome of a verification pass that found nothing wrong.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReport {
    pub target_date: NaiveDate,
    pub ledger_total: Decimal,
    pub settlement_total: Decimal,
    pub stats: SettlementStats,
}

/// Compare the day's ledger total against its settlement total.
///
/// On mismatch, collects the worst-diverging sellers (largest absolute
/// diff first, at most `report_limit` of them) and fails with
/// [`SettlementError::ReconciliationMismatch`]. The comparison is
/// exact; there is no tolerance.
pub fn verify_settlement(
    store: &SettlementStore,
    date: NaiveDate,
    report_limit: u32,
) -> SettlementResult<VerificationReport> {
    let ledger_total = money::from_minor(store.ledger_total_minor(date)?);
    let settlement_total = money::from_minor(store.settlement_total_minor(date)?);
    log::info!(
        "verifying settlements for {date}: ledger {ledger_total}, settled {settlement_total}"
    );

    if ledger_total != settlement_total {
        let diffs: Vec<SellerDiff> = store
            .ledger_mismatches(date, report_limit)?
            .into_iter()
            .map(|row| SellerDiff {
                seller_id: row.seller_id,
                ledger_total: money::from_minor(row.ledger_minor),
                settlement_total: money::from_minor(row.settlement_minor),
                diff: money::from_minor(row.ledger_minor - row.settlement_minor),
            })
            .collect();
        log::error!(
            "settlement totals diverge for {date}: ledger {ledger_total}, settled {settlement_total}, {} seller(s) reported (limit {report_limit})",
            diffs.len()
        );
        for diff in &diffs {
            log::error!(
                "  seller {}: ledger {}, settled {}, diff {}",
                diff.seller_id,
                diff.ledger_total,
                diff.settlement_total,
                diff.diff
            );
        }
        return Err(SettlementError::ReconciliationMismatch {
            date,
            ledger_total,
            settlement_total,
            diffs,
        });
    }

    let stats = store.settlement_stats(date)?;
    log::info!(
        "verification passed for {date}: {} sellers, sales {}, commission {}, net {}, {} orders, {} items",
        stats.seller_count,
        stats.total_sales,
        stats.total_commission,
        stats.total_net_amount,
        stats.total_orders,
        stats.total_items
    );
    Ok(VerificationReport {
        target_date: date,
        ledger_total,
        settlement_total,
        stats,
    })
}
