//! Parallel array summation across forked worker processes.
//!
//! An array of length N (holding `1..=N`) is split into P contiguous ranges.
//! P-1 forked workers each sum one range and deliver the result back to the
//! coordinator through a queued real-time signal carrying the value as its
//! payload. The coordinator sums the final range itself, reaps every worker,
//! waits for the outstanding deliveries, and reports the grand total.
//!
//! The interesting part is the delivery path: results arrive asynchronously
//! in a signal handler while the coordinator is busy reaping and computing,
//! so all shared state lives in a [`sum::Tally`] that the handler mutates
//! with atomics only, and every foreground access happens behind a
//! block-all signal mask.
//!
//! # Example
//!
//! ```no_run
//! use sigtally::sum::{self, RunConfig};
//!
//! let config = RunConfig {
//!     array_len: 4096,
//!     shares: 4,
//!     rt_offset: 0,
//! };
//! let report = sum::run(&config).unwrap();
//! assert_eq!(report.total, 8_390_656);
//! ```

pub mod error;
pub mod logging;
pub mod partition;
pub mod report;
pub mod sum;

pub use error::{Result, TallyError};
pub use partition::{IndexRange, partition};
pub use report::{PlanReport, RunReport};
