//! Entry points that trigger settlement runs: a single date, an
//! inclusive date range, or yesterday. Outcomes are shaped for
//! reporting rather than control flow; a failed day is a value here,
//! not an error.

use crate::config::SettlementConfig;
use crate::error::{SettlementError, SettlementResult};
use crate::job::{self, JobCounts, JobReport};
use crate::registry::RunRegistry;
use crate::store::SettlementStore;
use crate::types::RunId;
use chrono::{NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Success,
    Error,
}

/// What happened to one triggered date.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub target_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<JobCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The date was already being settled by another run.
    #[serde(skip)]
    pub conflict: bool,
}

impl RunOutcome {
    fn success(report: &JobReport) -> Self {
        Self {
            status: RunStatus::Success,
            target_date: report.target_date,
            run_id: Some(report.run_id.clone()),
            started_at: Some(report.started_at.clone()),
            finished_at: Some(report.finished_at.clone()),
            counts: Some(report.counts),
            message: None,
            conflict: false,
        }
    }

    fn failure(date: NaiveDate, err: &SettlementError) -> Self {
        Self {
            status: RunStatus::Error,
            target_date: date,
            run_id: None,
            started_at: None,
            finished_at: None,
            counts: None,
            message: Some(err.to_string()),
            conflict: matches!(err, SettlementError::AlreadyRunning { .. }),
        }
    }
}

/// Tally of a range trigger. Days run independently; one bad day does
/// not stop the rest.
#[derive(Debug, Clone, Serialize)]
pub struct RangeOutcome {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: u32,
    pub success_count: u32,
    pub fail_count: u32,
    pub outcomes: Vec<RunOutcome>,
}

/// Settle a single date, folding any failure into the outcome.
pub fn run_for_date(
    store: &mut SettlementStore,
    registry: &RunRegistry,
    date: NaiveDate,
    config: &SettlementConfig,
) -> RunOutcome {
    match job::run_settlement_job(store, registry, date, config) {
        Ok(report) => RunOutcome::success(&report),
        Err(err) => {
            log::error!("settlement run for {date} failed: {err}");
            RunOutcome::failure(date, &err)
        }
    }
}

/// Settle every date in `start..=end`, one job per day.
///
/// A reversed range is the only hard error; everything after that is
/// tallied per day so a backfill keeps going past a bad date.
pub fn run_for_range(
    store: &mut SettlementStore,
    registry: &RunRegistry,
    start: NaiveDate,
    end: NaiveDate,
    config: &SettlementConfig,
) -> SettlementResult<RangeOutcome> {
    if start > end {
        return Err(SettlementError::InvalidDateRange { start, end });
    }
    log::info!("range settlement started: {start} through {end}");

    let mut outcomes = Vec::new();
    let mut success_count = 0u32;
    let mut fail_count = 0u32;
    for date in start.iter_days().take_while(|d| *d <= end) {
        let outcome = run_for_date(store, registry, date, config);
        match outcome.status {
            RunStatus::Success => success_count += 1,
            RunStatus::Error => fail_count += 1,
        }
        outcomes.push(outcome);
    }
    log::info!(
        "range settlement finished: {} day(s), {success_count} succeeded, {fail_count} failed",
        outcomes.len()
    );
    Ok(RangeOutcome {
        start_date: start,
        end_date: end,
        total_days: outcomes.len() as u32,
        success_count,
        fail_count,
        outcomes,
    })
}

/// Settle yesterday, the daily scheduled entry point.
pub fn run_for_yesterday(
    store: &mut SettlementStore,
    registry: &RunRegistry,
    config: &SettlementConfig,
) -> RunOutcome {
    // pred_opt is None only at NaiveDate::MIN, which the wall clock
    // never reaches.
    let yesterday = Utc::now()
        .date_naive()
        .pred_opt()
        .unwrap_or(NaiveDate::MIN);
    log::info!("daily settlement triggered for {yesterday}");
    run_for_date(store, registry, yesterday, config)
}
