//! Cooperative cancellation shared by the jobs of one export run
//!
//! A token is a single flag plus a count of runs currently using it. Jobs
//! poll [`CancellationToken::is_cancelled`] (or call
//! [`CancellationToken::checkpoint`]) at safe points; cancellation never
//! interrupts a step in progress.

use crate::domain::{Result, SatchelError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct TokenState {
    cancelled: AtomicBool,
    active_runs: AtomicUsize,
}

/// Cloneable handle to a shared cancellation flag
///
/// # Examples
///
/// ```
/// use satchel::core::export::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// assert!(token.checkpoint().is_err());
///
/// token.reset().unwrap();
/// assert!(!token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<TokenState>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; idempotent and callable from any thread
    pub fn cancel(&self) {
        if !self.state.cancelled.swap(true, Ordering::SeqCst) {
            tracing::info!("Cancellation requested");
        }
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(SatchelError::Cancelled)` once cancellation has been requested
    pub fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(SatchelError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Clear a previous cancellation before starting a new run
    ///
    /// # Errors
    ///
    /// Returns `SatchelError::InvalidState` while a run holding this token is active.
    pub fn reset(&self) -> Result<()> {
        let active = self.state.active_runs.load(Ordering::SeqCst);
        if active > 0 {
            return Err(SatchelError::InvalidState(format!(
                "cannot reset cancellation token while {active} run(s) are active"
            )));
        }
        self.state.cancelled.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Number of runs currently holding this token
    pub fn active_runs(&self) -> usize {
        self.state.active_runs.load(Ordering::SeqCst)
    }

    /// Mark a run as active until the guard is dropped
    pub(crate) fn enter_run(&self) -> RunGuard {
        self.state.active_runs.fetch_add(1, Ordering::SeqCst);
        RunGuard {
            state: self.state.clone(),
        }
    }
}

/// Keeps a token marked active for the duration of a run
#[derive(Debug)]
pub(crate) struct RunGuard {
    state: Arc<TokenState>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.state.active_runs.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_idempotent() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_reset_rejected_while_run_active() {
        let token = CancellationToken::new();
        let guard = token.enter_run();
        token.cancel();

        assert!(matches!(token.reset(), Err(SatchelError::InvalidState(_))));
        assert!(token.is_cancelled());

        drop(guard);
        token.reset().unwrap();
        assert!(!token.is_cancelled());
        assert_eq!(token.active_runs(), 0);
    }

    #[test]
    fn test_cancel_visible_across_threads() {
        let token = CancellationToken::new();
        let remote = token.clone();
        std::thread::spawn(move || remote.cancel()).join().unwrap();
        assert!(matches!(token.checkpoint(), Err(SatchelError::Cancelled)));
    }
}
