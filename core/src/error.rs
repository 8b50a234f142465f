use crate::types::SellerId;
use crate::verify::SellerDiff;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settlement for {date} is already running")]
    AlreadyRunning { date: NaiveDate },

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Unknown seller grade '{value}'")]
    UnknownGrade { value: String },

    #[error("Unknown status '{value}'")]
    UnknownStatus { value: String },

    #[error("Negative sales total {amount} for seller {seller_id}")]
    NegativeSales { seller_id: SellerId, amount: Decimal },

    #[error("Amount {amount} is not representable in minor units")]
    AmountPrecision { amount: Decimal },

    #[error("Settlement chunk mixes settlement dates")]
    MixedChunk,

    #[error(
        "Settlement totals diverge for {date}: ledger {ledger_total}, settled {settlement_total}"
    )]
    ReconciliationMismatch {
        date: NaiveDate,
        ledger_total: Decimal,
        settlement_total: Decimal,
        diffs: Vec<SellerDiff>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SettlementResult<T> = Result<T, SettlementError>;
