//! In-process run registry: at most one settlement job per date.

use crate::error::{SettlementError, SettlementResult};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Tracks which settlement dates have a job in flight.
///
/// A date leaves the registry when its guard drops, panics included,
/// so finished dates can always be re-run.
#[derive(Debug, Default)]
pub struct RunRegistry {
    inflight: Mutex<HashSet<NaiveDate>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `date`, or fail with [`SettlementError::AlreadyRunning`]
    /// if another job already holds it.
    pub fn acquire(&self, date: NaiveDate) -> SettlementResult<RunGuard<'_>> {
        let mut inflight = self.lock();
        if !inflight.insert(date) {
            return Err(SettlementError::AlreadyRunning { date });
        }
        Ok(RunGuard {
            registry: self,
            date,
        })
    }

    pub fn is_running(&self, date: NaiveDate) -> bool {
        self.lock().contains(&date)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<NaiveDate>> {
        // A poisoned lock only means some holder panicked; the set of
        // dates is still coherent, so keep going.
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// RAII claim on one settlement date.
#[derive(Debug)]
pub struct RunGuard<'a> {
    registry: &'a RunRegistry,
    date: NaiveDate,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.date);
    }
}
