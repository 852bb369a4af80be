//! Per-call error state.

use std::sync::atomic::{AtomicU8, Ordering};

const ACTIVE: u8 = 0;
const ERRORED: u8 = 0b01;
const CLOSED: u8 = 0b10;

/// The phase of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    /// No error seen and not closed.
    Active,
    /// An error is being handled.
    Errored,
    /// Closed; terminal.
    Closed,
}

/// Lock-free state machine guarding error dispatch for one call.
///
/// `Active -> Errored` happens at most once per call, even under
/// concurrent callback delivery. `Closed` is terminal. The errored mark is
/// kept after closing, so [`is_errored`](Self::is_errored) stays `true`
/// for calls closed because of an error.
#[derive(Debug, Default)]
pub struct CallState {
    bits: AtomicU8,
}

impl CallState {
    /// Creates an active state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bits: AtomicU8::new(ACTIVE),
        }
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> CallPhase {
        let bits = self.bits.load(Ordering::SeqCst);
        if bits & CLOSED != 0 {
            CallPhase::Closed
        } else if bits & ERRORED != 0 {
            CallPhase::Errored
        } else {
            CallPhase::Active
        }
    }

    /// Moves an active call to `Errored`.
    ///
    /// Returns `true` for exactly one caller per call: the first error
    /// seen while the call was active.
    pub fn try_error(&self) -> bool {
        self.bits
            .compare_exchange(ACTIVE, ERRORED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Marks the call closed.
    ///
    /// Returns `true` if this call closed it, `false` if it was already closed.
    pub fn mark_closed(&self) -> bool {
        self.bits.fetch_or(CLOSED, Ordering::SeqCst) & CLOSED == 0
    }

    /// Returns `true` if an error was ever dispatched for this call.
    #[must_use]
    pub fn is_errored(&self) -> bool {
        self.bits.load(Ordering::SeqCst) & ERRORED != 0
    }

    /// Returns `true` if the call is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.bits.load(Ordering::SeqCst) & CLOSED != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_lifecycle() {
        let state = CallState::new();
        assert_eq!(state.phase(), CallPhase::Active);

        assert!(state.try_error());
        assert_eq!(state.phase(), CallPhase::Errored);
        assert!(!state.try_error());

        assert!(state.mark_closed());
        assert_eq!(state.phase(), CallPhase::Closed);
        assert!(state.is_errored());
        assert!(!state.mark_closed());
    }

    #[test]
    fn test_closed_call_cannot_error() {
        let state = CallState::new();
        assert!(state.mark_closed());
        assert!(!state.try_error());
        assert!(!state.is_errored());
        assert!(state.is_closed());
    }

    #[test]
    fn test_concurrent_try_error_wins_once() {
        let state = Arc::new(CallState::new());
        let wins = Arc::new(AtomicUsize::new(0));

        let threads: Vec<_> = (0..16)
            .map(|_| {
                let state = Arc::clone(&state);
                let wins = Arc::clone(&wins);
                thread::spawn(move || {
                    if state.try_error() {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in threads {
            handle.join().unwrap();
        }

        assert_eq!(wins.load(Ordering::SeqCst), 1);
    }
}
