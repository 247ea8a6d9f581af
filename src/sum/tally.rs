//! Shared accumulator mutated from the delivery handler.
//!
//! A [`Tally`] is created by the coordinator, handed by reference into
//! handler registration, and from then on written by two actors: the signal
//! handler (via [`Tally::record`]) and the coordinator's foreground code
//! (via [`Tally::finalize`], behind a block-all mask). Everything on the
//! handler path is a plain atomic operation; nothing here allocates, locks,
//! or formats.

use std::sync::atomic::{AtomicI32, AtomicI64, AtomicUsize, Ordering};

/// One recorded arrival: sender pid and delivered value.
struct ArrivalSlot {
    sender: AtomicI32,
    value: AtomicI64,
}

/// Fixed-capacity log of arrivals, filled by the handler and drained by the
/// coordinator for the per-delivery progress notices.
///
/// `push` is only ever called from the delivery handler. The handler is
/// installed with a fill-all `sa_mask`, so its invocations never overlap and
/// the cursor has a single writer. Readers load the cursor with acquire
/// ordering and may then read every slot below it.
struct ArrivalLog {
    slots: Box<[ArrivalSlot]>,
    cursor: AtomicUsize,
}

impl ArrivalLog {
    fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| ArrivalSlot {
                sender: AtomicI32::new(0),
                value: AtomicI64::new(0),
            })
            .collect();
        Self {
            slots,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Append an entry. Arrivals beyond the configured capacity are counted
    /// by the caller but not logged.
    fn push(&self, sender: i32, value: i64) {
        let index = self.cursor.load(Ordering::Relaxed);
        if index < self.slots.len() {
            self.slots[index].sender.store(sender, Ordering::Relaxed);
            self.slots[index].value.store(value, Ordering::Relaxed);
            self.cursor.store(index + 1, Ordering::Release);
        }
    }

    fn len(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    fn entry(&self, index: usize) -> Option<(i32, i64)> {
        if index >= self.len() {
            return None;
        }
        let slot = &self.slots[index];
        Some((
            slot.sender.load(Ordering::Relaxed),
            slot.value.load(Ordering::Relaxed),
        ))
    }
}

/// Coordinator-owned accumulator for inbound partial sums.
///
/// The running total and the arrival counter are the state shared between
/// the asynchronous delivery handler and the coordinator's foreground code.
/// [`Tally::record`] bumps the counter last with release ordering, so a
/// foreground reader that observes `arrivals() == n` also observes the
/// first `n` additions to the total and the first `n` log entries.
pub struct Tally {
    total: AtomicI64,
    arrivals: AtomicUsize,
    log: ArrivalLog,
}

impl Tally {
    /// Create a tally expecting at most `capacity` logged arrivals (one per
    /// spawned worker).
    pub fn new(capacity: usize) -> Self {
        Self {
            total: AtomicI64::new(0),
            arrivals: AtomicUsize::new(0),
            log: ArrivalLog::with_capacity(capacity),
        }
    }

    /// Record one delivered payload.
    ///
    /// This is the only operation the delivery handler performs, and it is
    /// async-signal-safe: a handful of atomic operations, no allocation, no
    /// locking. Must not be called from foreground code; the log requires a
    /// single writer.
    pub fn record(&self, sender: i32, value: i64) {
        self.total.fetch_add(value, Ordering::Relaxed);
        self.log.push(sender, value);
        self.arrivals.fetch_add(1, Ordering::Release);
    }

    /// Number of payloads recorded so far.
    pub fn arrivals(&self) -> usize {
        self.arrivals.load(Ordering::Acquire)
    }

    /// Current running total.
    pub fn total(&self) -> i64 {
        self.total.load(Ordering::Acquire)
    }

    /// Add the coordinator's own share and return the final total.
    ///
    /// Callers must hold a block-all mask: after the exact-count wait no
    /// further deliveries are expected, and the mask keeps a stray one from
    /// interleaving with the read-back.
    pub fn finalize(&self, own_share: i64) -> i64 {
        self.total.fetch_add(own_share, Ordering::Relaxed) + own_share
    }

    /// Number of arrivals captured in the log.
    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    /// Read a logged arrival by index, `None` past the end.
    pub fn log_entry(&self, index: usize) -> Option<(i32, i64)> {
        self.log.entry(index)
    }
}
