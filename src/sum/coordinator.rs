//! Coordinator-side lifecycle: spawn, reap, self-compute, await, finalize.
//!
//! The ordering here is deliberate and must not be rearranged: the handler
//! is installed before the first fork, every worker is reaped before the
//! final wait, and the wait closes the race where the last delivery is
//! still in flight when the last termination is observed. The number of
//! deliveries to wait for is not guessed; it is the number of workers that
//! exited cleanly, because a worker only exits 0 after its send succeeded.

use crate::error::{Result, TallyError};
use crate::partition::partition;
use crate::report::RunReport;
use crate::sum::channel::PayloadChannel;
use crate::sum::mask::{self, MaskGuard};
use crate::sum::tally::Tally;
use crate::sum::termination;
use crate::sum::worker;
use nix::errno::Errno;
use nix::sys::wait::waitpid;
use nix::unistd::{ForkResult, Pid, fork, getpid};

/// Upper bound on the array length, keeping the allocation and the `i64`
/// total comfortably in range.
pub const MAX_ARRAY_LEN: usize = 1 << 24;

/// Runtime configuration for one summation run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Array length N; the array holds `1..=N`.
    pub array_len: usize,
    /// Total shares P. `P - 1` workers are forked; the coordinator keeps
    /// the final share for itself.
    pub shares: usize,
    /// Offset from `SIGRTMIN` for the payload channel.
    pub rt_offset: i32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            array_len: 4096,
            shares: 4,
            rt_offset: 0,
        }
    }
}

impl RunConfig {
    /// Validate bounds before anything is allocated or spawned.
    pub fn validate(&self) -> Result<()> {
        if self.array_len == 0 || self.array_len > MAX_ARRAY_LEN {
            return Err(TallyError::Config(format!(
                "array length must be in [1, {}], got {}",
                MAX_ARRAY_LEN, self.array_len
            )));
        }
        if self.shares == 0 || self.shares > self.array_len {
            return Err(TallyError::Config(format!(
                "share count must be in [1, {}], got {}",
                self.array_len, self.shares
            )));
        }
        Ok(())
    }
}

/// Execute a full run and return its report.
///
/// Must be called from a single-threaded process: forking duplicates only
/// the calling thread, and the mask discipline manipulates the process-wide
/// disposition. The binary calls this exactly once; a second call in the
/// same process is rejected at handler registration.
pub fn run(config: &RunConfig) -> Result<RunReport> {
    config.validate()?;
    let channel = PayloadChannel::new(config.rt_offset)?;

    let array: Vec<i64> = (1..=config.array_len as i64).collect();
    let ranges = partition(config.array_len, config.shares);
    let worker_count = config.shares - 1;

    // The handler may fire until process exit, so the tally must never be
    // freed.
    let tally: &'static Tally = Box::leak(Box::new(Tally::new(worker_count)));
    channel.install(tally)?;

    let coordinator = getpid();
    tracing::info!(
        array_len = config.array_len,
        shares = config.shares,
        workers = worker_count,
        signal = channel.signal_number(),
        "Starting summation run"
    );

    // Spawn. Children jump straight into the worker entry point and never
    // return here.
    let mut children: Vec<Pid> = Vec::with_capacity(worker_count);
    for (index, range) in ranges[..worker_count].iter().enumerate() {
        match unsafe { fork() } {
            Ok(ForkResult::Child) => worker::run(&channel, coordinator, index, *range, &array),
            Ok(ForkResult::Parent { child }) => {
                tracing::info!(
                    worker = index,
                    pid = child.as_raw(),
                    start = range.start,
                    end = range.end,
                    "Spawned worker for range"
                );
                children.push(child);
            }
            Err(e) => {
                return Err(TallyError::Process(format!("fork failed: {}", e)));
            }
        }
    }

    // Reap every worker, in whatever order they finish. Deliveries race
    // freely with terminations; the handler fires whenever its signal is
    // unblocked, including in the middle of this loop.
    let mut clean_exits = 0usize;
    let mut abnormal_exits = 0usize;
    let mut notices_seen = 0usize;
    for _ in 0..worker_count {
        let status = loop {
            match waitpid(None::<Pid>, None) {
                Ok(status) => break status,
                Err(Errno::EINTR) => continue,
                Err(e) => {
                    return Err(TallyError::Process(format!("waitpid failed: {}", e)));
                }
            }
        };
        let kind = termination::classify(status);
        let pid = status.pid().map(|p| p.as_raw()).unwrap_or(-1);
        if let Some(reaped) = status.pid() {
            children.retain(|child| *child != reaped);
        }
        if kind.is_clean() {
            clean_exits += 1;
            tracing::info!(
                pid,
                status = %kind,
                remaining = children.len(),
                "Reaped worker"
            );
        } else {
            abnormal_exits += 1;
            tracing::warn!(
                pid,
                status = %kind,
                remaining = children.len(),
                "Worker terminated abnormally"
            );
        }
        drain_arrival_notices(tally, &mut notices_seen);
    }

    // The coordinator's own share, summed inline rather than through the
    // channel.
    let own_range = ranges[config.shares - 1];
    let own_share = worker::partial_sum(&array, own_range);
    tracing::info!(
        start = own_range.start,
        end = own_range.end,
        partial_sum = own_share,
        "Coordinator computed its own share"
    );

    // Every cleanly exited worker has exactly one delivery queued or
    // already processed; wait for that count and no more, so an abnormal
    // worker can never stall the run.
    tracing::debug!(
        expected = clean_exits,
        arrivals = tally.arrivals(),
        "Awaiting outstanding deliveries"
    );
    mask::await_arrivals(tally, clean_exits)?;
    drain_arrival_notices(tally, &mut notices_seen);

    let total = {
        let _guard = MaskGuard::block_all()?;
        tally.finalize(own_share)
    };

    // An abnormal worker may still have sent before dying, so the gap is
    // possible, not certain; arrivals vs clean_exits tells the two apart.
    if abnormal_exits > 0 {
        tracing::warn!(
            abnormal_exits,
            clean_exits,
            arrivals = tally.arrivals(),
            "Workers terminated abnormally; their shares may be missing from the total"
        );
    }
    tracing::info!(total, arrivals = tally.arrivals(), "Run complete");

    Ok(RunReport {
        total,
        array_len: config.array_len,
        shares: config.shares,
        workers_spawned: worker_count,
        clean_exits,
        abnormal_exits,
        arrivals: tally.arrivals(),
    })
}

/// Emit one progress notice per logged arrival that has not been reported
/// yet. The handler itself never logs; this is where "received payload"
/// lines come from.
fn drain_arrival_notices(tally: &Tally, seen: &mut usize) {
    while let Some((sender, value)) = tally.log_entry(*seen) {
        tracing::info!(sender, value, "Received payload");
        *seen += 1;
    }
}
