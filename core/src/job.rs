//! Settlement job orchestration: aggregate the ledger, write the
//! settlements, verify the totals, and record the run in `job_runs`.

use crate::config::SettlementConfig;
use crate::error::SettlementResult;
use crate::reader::AggregateReader;
use crate::registry::RunRegistry;
use crate::settlement::Settlement;
use crate::store::{timestamp, SettlementStore};
use crate::transform;
use crate::types::RunId;
use crate::verify::{self, VerificationReport};
use crate::writer;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

/// Pipeline phase a running job is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Aggregation,
    Verification,
}

impl JobPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobPhase::Aggregation => "aggregation",
            JobPhase::Verification => "verification",
        }
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one settlement job. A job moves from `NotStarted`
/// through both `Running` phases and ends `Completed` or `Failed`;
/// there are no other transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    NotStarted,
    Running(JobPhase),
    Completed,
    Failed,
}

impl JobState {
    /// Status string recorded in `job_runs`.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::NotStarted => "NOT_STARTED",
            JobState::Running(_) => "RUNNING",
            JobState::Completed => "COMPLETED",
            JobState::Failed => "FAILED",
        }
    }
}

/// Counters accumulated over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    /// Seller aggregates read from the ledger.
    pub read: u64,
    /// Settlement rows newly inserted.
    pub inserted: u64,
    /// Existing settlement rows overwritten.
    pub updated: u64,
    /// Chunks written.
    pub chunks: u64,
}

/// Everything a finished run reports back to its caller.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub run_id: RunId,
    pub target_date: NaiveDate,
    pub state: JobState,
    pub started_at: String,
    pub finished_at: String,
    pub counts: JobCounts,
    pub verification: VerificationReport,
}

/// Run the full settlement pipeline for one date.
///
/// Claims the date in `registry` for the duration of the run, reads
/// the ledger page by page, transforms and writes settlements in
/// chunks of `config.chunk_size`, then verifies the written totals
/// against the ledger. Every run leaves a `job_runs` row; a failed
/// run records the error there and still returns it to the caller.
///
/// Re-running a finished date is safe: the writer overwrites existing
/// `(seller, date)` rows instead of duplicating them.
pub fn run_settlement_job(
    store: &mut SettlementStore,
    registry: &RunRegistry,
    date: NaiveDate,
    config: &SettlementConfig,
) -> SettlementResult<JobReport> {
    config.validate()?;
    let _guard = registry.acquire(date)?;

    let run_id: RunId = Uuid::new_v4().to_string();
    let started_at = timestamp();
    store.insert_job_run(&run_id, date, &started_at)?;
    log::info!("settlement job {run_id} started for {date}");
    let clock = Instant::now();

    let mut state = JobState::NotStarted;
    let mut counts = JobCounts::default();
    let outcome = run_phases(store, date, config, &mut state, &mut counts);
    let finished_at = timestamp();

    match outcome {
        Ok(verification) => {
            state = JobState::Completed;
            store.finish_job_run(&run_id, state.as_str(), &finished_at, &counts, None)?;
            log::info!(
                "settlement job {run_id} completed for {date} in {} ms: {} read, {} inserted, {} updated, {} chunks",
                clock.elapsed().as_millis(),
                counts.read,
                counts.inserted,
                counts.updated,
                counts.chunks
            );
            Ok(JobReport {
                run_id,
                target_date: date,
                state,
                started_at,
                finished_at,
                counts,
                verification,
            })
        }
        Err(err) => {
            let phase = match state {
                JobState::Running(phase) => phase.as_str(),
                _ => "startup",
            };
            log::error!("settlement job {run_id} failed for {date} during {phase}: {err}");
            state = JobState::Failed;
            let recorded = store.finish_job_run(
                &run_id,
                state.as_str(),
                &finished_at,
                &counts,
                Some(&err.to_string()),
            );
            if let Err(persist_err) = recorded {
                // The original failure is the one the caller needs.
                log::error!("could not record failed run {run_id}: {persist_err}");
            }
            Err(err)
        }
    }
}

fn run_phases(
    store: &mut SettlementStore,
    date: NaiveDate,
    config: &SettlementConfig,
    state: &mut JobState,
    counts: &mut JobCounts,
) -> SettlementResult<VerificationReport> {
    *state = JobState::Running(JobPhase::Aggregation);
    log::info!("{} phase started for {date}", JobPhase::Aggregation);

    let mut reader = AggregateReader::new(date, config.page_size);
    let mut pending: Vec<Settlement> = Vec::with_capacity(config.chunk_size);
    while let Some(page) = reader.next_page(store)? {
        counts.read += page.len() as u64;
        for aggregate in &page {
            pending.push(transform::to_settlement(aggregate, date)?);
        }
        // Page size and chunk size are independent; drain whole chunks
        // as soon as they fill and keep the tail for the next page.
        while pending.len() >= config.chunk_size {
            let chunk: Vec<Settlement> = pending.drain(..config.chunk_size).collect();
            flush_chunk(store, &chunk, counts)?;
        }
    }
    if !pending.is_empty() {
        flush_chunk(store, &pending, counts)?;
    }

    *state = JobState::Running(JobPhase::Verification);
    log::info!("{} phase started for {date}", JobPhase::Verification);
    verify::verify_settlement(store, date, config.mismatch_report_limit)
}

fn flush_chunk(
    store: &mut SettlementStore,
    chunk: &[Settlement],
    counts: &mut JobCounts,
) -> SettlementResult<()> {
    let stats = writer::write_chunk(store, chunk)?;
    counts.inserted += stats.inserted as u64;
    counts.updated += stats.updated as u64;
    counts.chunks += 1;
    Ok(())
}
