//! Classification of reaped worker statuses.
//!
//! The coordinator reaps every worker it spawned and reports how each one
//! ended. An abnormal end is logged but never aborts the run; it only means
//! that worker's share will be missing from the total.

use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;

/// How a reaped worker ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationKind {
    /// Normal exit with the given status code.
    Exited(i32),
    /// Killed by a signal.
    Signaled(Signal),
    /// Any other wait status (stopped, traced).
    Unknown,
}

impl TerminationKind {
    /// A clean exit means the worker's send succeeded before it exited,
    /// so exactly one delivery is queued or already processed.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Exited(0))
    }

    fn description(&self) -> String {
        match self {
            Self::Exited(code) => format!("exited with status {}", code),
            Self::Signaled(signal) => format!("killed by signal {:?}", signal),
            Self::Unknown => "ended with an unexpected wait status".to_string(),
        }
    }
}

impl std::fmt::Display for TerminationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Map a raw `WaitStatus` onto a termination kind.
pub fn classify(status: WaitStatus) -> TerminationKind {
    match status {
        WaitStatus::Exited(_, code) => TerminationKind::Exited(code),
        WaitStatus::Signaled(_, signal, _) => TerminationKind::Signaled(signal),
        _ => TerminationKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::Pid;

    #[test]
    fn test_clean_exit() {
        let status = WaitStatus::Exited(Pid::from_raw(1), 0);
        let kind = classify(status);
        assert_eq!(kind, TerminationKind::Exited(0));
        assert!(kind.is_clean());
    }

    #[test]
    fn test_nonzero_exit_is_not_clean() {
        let status = WaitStatus::Exited(Pid::from_raw(1), 1);
        let kind = classify(status);
        assert_eq!(kind, TerminationKind::Exited(1));
        assert!(!kind.is_clean());
    }

    #[test]
    fn test_signaled_exit() {
        let status = WaitStatus::Signaled(Pid::from_raw(1), Signal::SIGKILL, false);
        let kind = classify(status);
        assert_eq!(kind, TerminationKind::Signaled(Signal::SIGKILL));
        assert!(!kind.is_clean());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            TerminationKind::Exited(0).to_string(),
            "exited with status 0"
        );
        assert!(
            TerminationKind::Signaled(Signal::SIGSEGV)
                .to_string()
                .contains("SIGSEGV")
        );
        assert!(TerminationKind::Unknown.to_string().contains("unexpected"));
    }
}
