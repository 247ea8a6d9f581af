//! Forked-worker summation with signal-carried result delivery.
//!
//! The coordinator forks one worker per range (keeping the last range for
//! itself), and each worker hands its partial sum back through a queued
//! real-time signal whose payload carries the value. Delivery interrupts the
//! coordinator asynchronously, so the handler only touches the atomic
//! [`Tally`], and the coordinator masks all signals whenever its foreground
//! code reads or writes the same state.
//!
//! # Architecture
//!
//! ```text
//!                  ┌──────────────────┐
//!                  │   Coordinator    │
//!                  │ fork / reap /    │
//!                  │ own range / wait │
//!                  └───────┬──────────┘
//!                          │ fork
//!            ┌─────────────┼─────────────┐
//!            │             │             │
//!      ┌─────▼─────┐ ┌─────▼─────┐ ┌─────▼─────┐
//!      │ Worker 0  │ │ Worker 1  │ │ Worker n  │
//!      │ sum range │ │ sum range │ │ sum range │
//!      └─────┬─────┘ └─────┬─────┘ └─────┬─────┘
//!            │             │             │
//!            └── sigqueue(SIGRTMIN+k, partial) ──▶ handler ──▶ Tally
//! ```
//!
//! A worker exits 0 only after its send succeeded, so the number of clean
//! exits observed while reaping equals the number of deliveries the
//! coordinator still has to wait for before it may finalize the total.

pub mod channel;
pub mod coordinator;
pub mod mask;
pub mod tally;
pub mod termination;
pub mod worker;

pub use channel::PayloadChannel;
pub use coordinator::{MAX_ARRAY_LEN, RunConfig, run};
pub use tally::Tally;
