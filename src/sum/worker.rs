//! Worker-side entry point.
//!
//! A worker exists to do exactly one thing: sum its assigned range of the
//! inherited array, queue the result at the coordinator, and exit. It never
//! returns into the coordinator's code path, and it sends exactly once; if
//! the send fails there is no second delivery path, so the worker exits
//! non-zero and the coordinator leaves it out of the expected-arrival
//! count.

use crate::partition::IndexRange;
use crate::sum::channel::PayloadChannel;
use nix::unistd::{Pid, getpid};

/// Sum the array elements covered by `range`.
pub fn partial_sum(array: &[i64], range: IndexRange) -> i64 {
    array[range.start..=range.end].iter().sum()
}

/// Run a forked worker to completion. Never returns.
///
/// `coordinator` is the pid captured by the parent before forking; the
/// send targets it directly instead of asking the kernel for a parent pid
/// that may have been reassigned.
pub fn run(
    channel: &PayloadChannel,
    coordinator: Pid,
    worker_index: usize,
    range: IndexRange,
    array: &[i64],
) -> ! {
    if injected_fault(worker_index) {
        tracing::warn!(
            worker = worker_index,
            pid = getpid().as_raw(),
            "Exiting before delivery (injected fault)"
        );
        std::process::exit(3);
    }

    let partial = partial_sum(array, range);
    tracing::debug!(
        worker = worker_index,
        pid = getpid().as_raw(),
        start = range.start,
        end = range.end,
        partial_sum = partial,
        "Worker computed partial sum"
    );

    match channel.send(coordinator, partial) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            tracing::error!(
                worker = worker_index,
                pid = getpid().as_raw(),
                error = %e,
                "Failed to deliver partial sum"
            );
            std::process::exit(1);
        }
    }
}

/// Fault injection knob: `SIGTALLY_FAIL_WORKER=<index>` makes that worker
/// exit non-zero before it sends, leaving its share undelivered. Inherited
/// across the fork, so the end-to-end suite sets it on the coordinator.
fn injected_fault(worker_index: usize) -> bool {
    if let Ok(raw) = std::env::var("SIGTALLY_FAIL_WORKER")
        && let Ok(index) = raw.parse::<usize>()
    {
        return index == worker_index;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_sum_over_whole_array() {
        let array: Vec<i64> = (1..=10).collect();
        let range = IndexRange { start: 0, end: 9 };
        assert_eq!(partial_sum(&array, range), 55);
    }

    #[test]
    fn test_partial_sum_matches_concrete_shares() {
        let array: Vec<i64> = (1..=10).collect();
        assert_eq!(partial_sum(&array, IndexRange { start: 0, end: 2 }), 6);
        assert_eq!(partial_sum(&array, IndexRange { start: 3, end: 5 }), 15);
        assert_eq!(partial_sum(&array, IndexRange { start: 6, end: 9 }), 34);
    }

    #[test]
    fn test_partial_sum_single_element() {
        let array: Vec<i64> = (1..=4).collect();
        assert_eq!(partial_sum(&array, IndexRange { start: 3, end: 3 }), 4);
    }
}
