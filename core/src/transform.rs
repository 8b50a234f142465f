//! Aggregate-to-settlement transform: applies the grade commission and
//! splits one day's sales into commission and net payout.

use crate::commission;
use crate::error::{SettlementError, SettlementResult};
use crate::money;
use crate::reader::SellerAggregate;
use crate::settlement::{Settlement, SettlementStatus};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Build the settlement for one seller aggregate.
///
/// Commission is `total_sales * rate` rounded half away from zero to
/// cents; the net amount is whatever remains, so the two always add
/// back up to the total. A negative total means the ledger upstream is
/// corrupt and the day must not settle.
pub fn to_settlement(
    aggregate: &SellerAggregate,
    settlement_date: NaiveDate,
) -> SettlementResult<Settlement> {
    if aggregate.total_sales < Decimal::ZERO {
        return Err(SettlementError::NegativeSales {
            seller_id: aggregate.seller_id,
            amount: aggregate.total_sales,
        });
    }
    let commission_rate = commission::commission_rate(aggregate.grade);
    let commission = money::round_half_up(aggregate.total_sales * commission_rate);
    let net_amount = aggregate.total_sales - commission;
    Ok(Settlement {
        seller_id: aggregate.seller_id,
        settlement_date,
        total_sales: aggregate.total_sales,
        commission_rate,
        commission,
        net_amount,
        order_count: aggregate.order_count,
        item_count: aggregate.item_count,
        status: SettlementStatus::Pending,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commission::SellerGrade;
    use rust_decimal_macros::dec;

    fn aggregate(grade: SellerGrade, total_sales: Decimal) -> SellerAggregate {
        SellerAggregate {
            seller_id: 7,
            grade,
            total_sales,
            order_count: 3,
            item_count: 9,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    #[test]
    fn gold_seller_pays_ten_percent() {
        let settlement =
            to_settlement(&aggregate(SellerGrade::Gold, dec!(500.00)), date()).unwrap();
        assert_eq!(settlement.commission_rate, dec!(0.1000));
        assert_eq!(settlement.commission, dec!(50.00));
        assert_eq!(settlement.net_amount, dec!(450.00));
        assert_eq!(settlement.status, SettlementStatus::Pending);
    }

    #[test]
    fn commission_rounds_half_up_to_cents() {
        // 33.33 * 0.15 = 4.9995, which rounds up to 5.00.
        let settlement =
            to_settlement(&aggregate(SellerGrade::Bronze, dec!(33.33)), date()).unwrap();
        assert_eq!(settlement.commission, dec!(5.00));
        assert_eq!(settlement.net_amount, dec!(28.33));
        assert_eq!(
            settlement.commission + settlement.net_amount,
            settlement.total_sales
        );
    }

    #[test]
    fn zero_sales_settle_to_zero() {
        let settlement =
            to_settlement(&aggregate(SellerGrade::Platinum, Decimal::ZERO), date()).unwrap();
        assert_eq!(settlement.commission, Decimal::ZERO);
        assert_eq!(settlement.net_amount, Decimal::ZERO);
    }

    #[test]
    fn negative_sales_are_rejected() {
        let err = to_settlement(&aggregate(SellerGrade::Silver, dec!(-1.00)), date()).unwrap_err();
        assert!(matches!(
            err,
            SettlementError::NegativeSales { seller_id: 7, .. }
        ));
    }
}
