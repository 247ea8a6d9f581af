//! Queued-signal payload channel between workers and the coordinator.
//!
//! A worker delivers its partial sum by queueing a real-time signal at the
//! coordinator with the value embedded in the signal payload
//! (`sigqueue(2)` with `SA_SIGINFO` delivery). Real-time signals queue one
//! entry per send, so concurrent deliveries from several workers cannot
//! collapse into a single pending instance the way standard signals do, and
//! the coordinator can rely on receiving exactly one handler invocation per
//! successful send.
//!
//! nix wraps neither `sigqueue` nor the real-time signal range, so this
//! module talks to libc directly; everything else in the crate stays on the
//! nix API.

use crate::error::{Result, TallyError};
use crate::sum::tally::Tally;
use nix::unistd::Pid;
use std::io;
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

#[cfg(not(target_os = "linux"))]
compile_error!("the payload channel requires Linux real-time signal queueing");

#[cfg(not(target_pointer_width = "64"))]
compile_error!("the payload encoding carries an i64 in a pointer-sized sigval");

type SigactionFn = extern "C" fn(libc::c_int, *mut libc::siginfo_t, *mut libc::c_void);

/// Destination tally for the delivery handler. Written once during
/// registration, before the handler can fire.
static SINK: AtomicPtr<Tally> = AtomicPtr::new(ptr::null_mut());

/// Whether a handler has been registered in this process.
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Delivery handler, invoked by the kernel with every signal blocked
/// (fill-all `sa_mask`), so invocations never overlap.
///
/// Runs in interrupt context: the body is restricted to decoding the
/// payload and one atomic [`Tally::record`] call. No allocation, no
/// formatting, no logging here; the coordinator reports arrivals later by
/// draining the tally's log.
extern "C" fn payload_handler(
    _signo: libc::c_int,
    info: *mut libc::siginfo_t,
    _context: *mut libc::c_void,
) {
    let tally = SINK.load(Ordering::Acquire);
    if tally.is_null() || info.is_null() {
        return;
    }
    unsafe {
        let info = &*info;
        let sender = info.si_pid();
        let value = info.si_value().sival_ptr as usize as i64;
        (*tally).record(sender, value);
    }
}

/// One-shot payload transport from workers to the coordinator.
///
/// Carries a single `i64` per send, encoded in the pointer-sized member of
/// the `sigval` union, along with the sender's pid as reported by the
/// kernel.
#[derive(Debug)]
pub struct PayloadChannel {
    signo: libc::c_int,
}

impl PayloadChannel {
    /// Create a channel on `SIGRTMIN + rt_offset`.
    ///
    /// The offset must keep the signal inside the platform's real-time
    /// range; the usable width varies because the C library reserves a few
    /// signals at the bottom of it.
    pub fn new(rt_offset: i32) -> Result<Self> {
        let min = libc::SIGRTMIN();
        let max = libc::SIGRTMAX();
        // checked_add: a huge offset must fail validation, not wrap.
        let signo = if rt_offset >= 0 {
            min.checked_add(rt_offset)
        } else {
            None
        };
        match signo {
            Some(signo) if signo <= max => Ok(Self { signo }),
            _ => Err(TallyError::Config(format!(
                "real-time signal offset must be in [0, {}], got {}",
                max - min,
                rt_offset
            ))),
        }
    }

    /// The raw signal number this channel uses.
    pub fn signal_number(&self) -> i32 {
        self.signo
    }

    /// Register the delivery handler, binding it to `tally`.
    ///
    /// Must be called once, before any worker is forked. The handler may
    /// fire at any point up to process exit, which is why the tally
    /// reference has to be `'static`. The installation mask blocks every
    /// signal for the handler's duration and `SA_RESTART` keeps interrupted
    /// waits transparent to the reap loop.
    pub fn install(&self, tally: &'static Tally) -> Result<()> {
        if INSTALLED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TallyError::Channel(
                "delivery handler is already installed".into(),
            ));
        }
        SINK.store(tally as *const Tally as *mut Tally, Ordering::Release);

        let mut action: libc::sigaction = unsafe { mem::zeroed() };
        action.sa_sigaction = payload_handler as SigactionFn as usize;
        action.sa_flags = libc::SA_SIGINFO | libc::SA_RESTART;
        unsafe {
            libc::sigfillset(&mut action.sa_mask);
        }

        let rc = unsafe { libc::sigaction(self.signo, &action, ptr::null_mut()) };
        if rc != 0 {
            SINK.store(ptr::null_mut(), Ordering::Release);
            INSTALLED.store(false, Ordering::Release);
            return Err(TallyError::Channel(format!(
                "sigaction for signal {} failed: {}",
                self.signo,
                io::Error::last_os_error()
            )));
        }

        tracing::debug!(signal = self.signo, "Installed payload delivery handler");
        Ok(())
    }

    /// Queue one payload at `target`.
    ///
    /// At most one send per worker; a failure here has no second delivery
    /// path and the sender must treat it as fatal.
    pub fn send(&self, target: Pid, value: i64) -> Result<()> {
        let payload = libc::sigval {
            sival_ptr: value as usize as *mut libc::c_void,
        };
        let rc = unsafe { libc::sigqueue(target.as_raw(), self.signo, payload) };
        if rc != 0 {
            return Err(TallyError::Channel(format!(
                "sigqueue to {} failed: {}",
                target,
                io::Error::last_os_error()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_zero_offset() {
        let channel = PayloadChannel::new(0).unwrap();
        assert_eq!(channel.signal_number(), libc::SIGRTMIN());
    }

    #[test]
    fn test_new_rejects_negative_offset() {
        let err = PayloadChannel::new(-1).unwrap_err();
        assert!(err.to_string().contains("offset"));
    }

    #[test]
    fn test_new_rejects_offset_past_sigrtmax() {
        let too_far = libc::SIGRTMAX() - libc::SIGRTMIN() + 1;
        let err = PayloadChannel::new(too_far).unwrap_err();
        assert!(err.to_string().contains("offset"));
    }

    #[test]
    fn test_new_rejects_overflowing_offset() {
        let err = PayloadChannel::new(i32::MAX).unwrap_err();
        assert!(matches!(err, TallyError::Config(_)));
        assert!(err.to_string().contains("offset"));
    }

    #[test]
    fn test_channel_debug_shows_signal_number() {
        let channel = PayloadChannel::new(0).unwrap();
        assert!(format!("{:?}", channel).contains("signo"));
    }

    #[test]
    fn test_install_rejects_double_registration() {
        let channel = PayloadChannel::new(0).unwrap();
        let tally: &'static Tally = Box::leak(Box::new(Tally::new(1)));
        channel.install(tally).unwrap();
        let err = channel.install(tally).unwrap_err();
        assert!(err.to_string().contains("already installed"));
    }
}
