//! Serializable summaries of a run and of a planned partition.

use crate::partition::IndexRange;
use serde::Serialize;

/// Outcome of one full summation run.
///
/// `arrivals` counts payloads the handler processed; with no abnormal exits
/// it equals `workers_spawned` and `total` is the arithmetic sum of
/// `1..=array_len`. When workers died abnormally their shares are missing
/// from the total, which the coordinator reports as a warning rather than
/// a failure.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Final aggregated total.
    pub total: i64,
    /// Array length the run was configured with.
    pub array_len: usize,
    /// Number of shares (workers plus the coordinator).
    pub shares: usize,
    /// Workers actually forked (`shares - 1`).
    pub workers_spawned: usize,
    /// Workers that exited with status 0.
    pub clean_exits: usize,
    /// Workers that were reaped but did not exit cleanly.
    pub abnormal_exits: usize,
    /// Payloads recorded by the delivery handler.
    pub arrivals: usize,
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "final total = {}", self.total)
    }
}

/// Partition layout for a `(array_len, shares)` pair, without running
/// anything.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub array_len: usize,
    pub shares: usize,
    /// Ranges assigned to forked workers, in worker order.
    pub worker_ranges: Vec<IndexRange>,
    /// The final range, computed inline by the coordinator.
    pub coordinator_range: IndexRange,
}

impl PlanReport {
    /// Build a plan from a full partition, splitting off the coordinator's
    /// final share.
    pub fn new(array_len: usize, shares: usize, mut ranges: Vec<IndexRange>) -> Self {
        let coordinator_range = ranges
            .pop()
            .unwrap_or(IndexRange { start: 0, end: 0 });
        Self {
            array_len,
            shares,
            worker_ranges: ranges,
            coordinator_range,
        }
    }
}

impl std::fmt::Display for PlanReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "array length {} split into {} shares",
            self.array_len, self.shares
        )?;
        for (i, range) in self.worker_ranges.iter().enumerate() {
            writeln!(f, "worker {}: {} ({} elements)", i, range, range.len())?;
        }
        write!(
            f,
            "coordinator: {} ({} elements)",
            self.coordinator_range,
            self.coordinator_range.len()
        )
    }
}
