//! Transfer completion synchronization.
//!
//! A transfer is resolved by exactly one of two asynchronous sources: the
//! completion interrupt or the timeout. [`TransferCompletion`] serializes
//! both through one mutex so the race is deterministic — whichever source
//! observes `NotReady` first installs the terminal status, and the loser
//! sees an already-resolved state and becomes a no-op.
//!
//! The timeout source is the waiter itself: `Condvar::wait_timeout` expiry
//! re-checks the status under the mutex and, if the interrupt has not
//! resolved it, installs `Timeout`.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Outcome of a command or DMA transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    /// Armed, not yet resolved.
    NotReady,
    /// Hardware reported success.
    Success,
    /// Hardware reported failure.
    Error,
    /// No completion arrived within the caller's budget.
    Timeout,
}

impl TransferStatus {
    /// Whether the status is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::NotReady)
    }
}

/// Single-resolution completion shared between the waiting client thread
/// and the interrupt path.
pub(crate) struct TransferCompletion {
    state: Mutex<TransferStatus>,
    cond: Condvar,
}

fn lock(state: &Mutex<TransferStatus>) -> MutexGuard<'_, TransferStatus> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TransferCompletion {
    pub(crate) const fn new() -> Self {
        Self {
            state: Mutex::new(TransferStatus::NotReady),
            cond: Condvar::new(),
        }
    }

    /// Arms the completion for a new transfer.
    pub(crate) fn arm(&self) {
        *lock(&self.state) = TransferStatus::NotReady;
    }

    /// Installs a terminal status and wakes the waiter.
    ///
    /// Returns `false` without touching the state if the transfer is
    /// already resolved (the caller lost the race).
    pub(crate) fn resolve(&self, status: TransferStatus) -> bool {
        debug_assert!(status.is_terminal());
        let mut state = lock(&self.state);
        if state.is_terminal() {
            return false;
        }
        *state = status;
        self.cond.notify_all();
        true
    }

    /// Blocks until the transfer resolves or `timeout` elapses.
    ///
    /// Always returns a terminal status: on expiry the waiter itself
    /// resolves the transfer to [`TransferStatus::Timeout`].
    pub(crate) fn wait(&self, timeout: Duration) -> TransferStatus {
        let deadline = Instant::now() + timeout;
        let mut state = lock(&self.state);
        while !state.is_terminal() {
            let now = Instant::now();
            if now >= deadline {
                *state = TransferStatus::Timeout;
                break;
            }
            let (guard, _) = self
                .cond
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
        *state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn resolve_before_wait_wins() {
        let completion = TransferCompletion::new();
        completion.arm();
        assert!(completion.resolve(TransferStatus::Success));
        assert_eq!(
            completion.wait(Duration::from_millis(100)),
            TransferStatus::Success
        );
    }

    #[test]
    fn wait_expiry_resolves_timeout() {
        let completion = TransferCompletion::new();
        completion.arm();
        assert_eq!(
            completion.wait(Duration::from_millis(10)),
            TransferStatus::Timeout
        );
        // The late completion loses the race and changes nothing.
        assert!(!completion.resolve(TransferStatus::Success));
        assert_eq!(*lock(&completion.state), TransferStatus::Timeout);
    }

    #[test]
    fn second_resolution_is_noop() {
        let completion = TransferCompletion::new();
        completion.arm();
        assert!(completion.resolve(TransferStatus::Error));
        assert!(!completion.resolve(TransferStatus::Success));
        assert_eq!(*lock(&completion.state), TransferStatus::Error);
    }

    #[test]
    fn rearm_clears_terminal_state() {
        let completion = TransferCompletion::new();
        completion.arm();
        assert!(completion.resolve(TransferStatus::Timeout));
        completion.arm();
        assert!(completion.resolve(TransferStatus::Success));
    }

    #[test]
    fn concurrent_resolution_happens_once() {
        let completion = Arc::new(TransferCompletion::new());
        completion.arm();

        let resolver = {
            let completion = Arc::clone(&completion);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                completion.resolve(TransferStatus::Success)
            })
        };

        let status = completion.wait(Duration::from_secs(5));
        let resolved_by_interrupt = resolver.join().expect("resolver thread");

        assert_eq!(status, TransferStatus::Success);
        assert!(resolved_by_interrupt);
    }
}
