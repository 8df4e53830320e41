//! Reduction of per-domain results into one batch classification.

use crate::types::{AvailabilityStatus, BatchStatus, CheckResult};
use serde::Serialize;

/// Classify a sequence of statuses.
///
/// Any `unknown` makes the whole batch an error, even when every other
/// domain resolved cleanly. An empty sequence counts as all available.
pub fn classify<I>(statuses: I) -> BatchStatus
where
    I: IntoIterator<Item = AvailabilityStatus>,
{
    let mut any_available = false;
    let mut any_registered = false;

    for status in statuses {
        match status {
            AvailabilityStatus::Unknown => return BatchStatus::Error,
            AvailabilityStatus::Available => any_available = true,
            AvailabilityStatus::Registered => any_registered = true,
        }
    }

    match (any_available, any_registered) {
        (true, true) => BatchStatus::Mixed,
        (false, true) => BatchStatus::Registered,
        _ => BatchStatus::Available,
    }
}

/// Classify a slice of results.
pub fn summarize(results: &[CheckResult]) -> BatchStatus {
    classify(results.iter().map(|result| result.status))
}

/// Batch classification together with per-status counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub status: BatchStatus,
    pub total: usize,
    pub available: usize,
    pub registered: usize,
    pub unknown: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[CheckResult]) -> Self {
        let count = |wanted: AvailabilityStatus| {
            results
                .iter()
                .filter(|result| result.status == wanted)
                .count()
        };

        Self {
            status: summarize(results),
            total: results.len(),
            available: count(AvailabilityStatus::Available),
            registered: count(AvailabilityStatus::Registered),
            unknown: count(AvailabilityStatus::Unknown),
        }
    }
}
