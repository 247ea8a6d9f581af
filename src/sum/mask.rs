//! Signal masking for foreground critical sections.
//!
//! Mutual exclusion between the delivery handler and the coordinator's
//! foreground code is done the signal way: block everything, touch the
//! shared state, restore. [`MaskGuard`] wraps that in RAII, and
//! [`await_arrivals`] is the suspend-until-signaled wait the coordinator
//! uses instead of spinning.

use crate::error::{Result, TallyError};
use crate::sum::tally::Tally;
use nix::errno::Errno;
use nix::sys::signal::{SigSet, SigmaskHow, sigprocmask};

/// RAII guard that blocks all signals until dropped.
///
/// Construction saves the current mask and installs a fill-all mask; drop
/// restores the saved one. The process is single-threaded when this is
/// used, so manipulating the process mask is equivalent to the thread mask.
pub struct MaskGuard {
    saved: SigSet,
}

impl MaskGuard {
    /// Block every signal, returning a guard that restores the previous
    /// mask on drop.
    pub fn block_all() -> Result<Self> {
        let mut saved = SigSet::empty();
        sigprocmask(
            SigmaskHow::SIG_SETMASK,
            Some(&SigSet::all()),
            Some(&mut saved),
        )
        .map_err(|e| TallyError::Process(format!("sigprocmask failed: {}", e)))?;
        Ok(Self { saved })
    }
}

impl Drop for MaskGuard {
    fn drop(&mut self) {
        let _ = sigprocmask(SigmaskHow::SIG_SETMASK, Some(&self.saved), None);
    }
}

/// Block until the tally has seen at least `expected` arrivals.
///
/// The check-then-sleep race is closed the classic way: block everything,
/// re-check the counter, then atomically swap back to the caller's mask and
/// suspend. A delivery that slips in between the check and the suspension
/// stays pending until the suspension unmasks it, so no wakeup can be lost.
/// The channel signal must be unblocked in the caller's mask or the wait
/// can never be satisfied.
///
/// With `expected` already reached (for instance zero spawned workers) this
/// returns without suspending at all.
pub fn await_arrivals(tally: &Tally, expected: usize) -> Result<()> {
    let mut saved = SigSet::empty();
    sigprocmask(
        SigmaskHow::SIG_SETMASK,
        Some(&SigSet::all()),
        Some(&mut saved),
    )
    .map_err(|e| TallyError::Process(format!("sigprocmask failed: {}", e)))?;

    while tally.arrivals() < expected {
        // sigsuspend reports EINTR after the handler has run; that is the
        // normal wakeup path, not an error.
        match saved.suspend() {
            Ok(()) | Err(Errno::EINTR) => {}
            Err(e) => {
                let _ = sigprocmask(SigmaskHow::SIG_SETMASK, Some(&saved), None);
                return Err(TallyError::Process(format!("sigsuspend failed: {}", e)));
            }
        }
    }

    sigprocmask(SigmaskHow::SIG_SETMASK, Some(&saved), None)
        .map_err(|e| TallyError::Process(format!("sigprocmask failed: {}", e)))?;
    Ok(())
}
