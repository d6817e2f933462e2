#![forbid(unsafe_code)]

//! Cooperative cancellation for tick loops.
//!
//! A [`CancellationSource`] hands out [`CancellationToken`]s. The loop polls
//! [`CancellationToken::is_cancelled`] at each tick boundary and sleeps with
//! [`CancellationToken::wait_timeout`], which returns early as soon as the
//! source cancels. An in-flight tick always runs to completion.
//!
//! ```
//! use scrolltrial_runtime::cancellation::CancellationSource;
//! use std::time::Duration;
//!
//! let source = CancellationSource::new();
//! let token = source.token();
//! let worker = std::thread::spawn(move || {
//!     let mut ticks = 0u32;
//!     while !token.wait_timeout(Duration::from_millis(1)) {
//!         ticks += 1;
//!     }
//!     ticks
//! });
//! source.cancel();
//! let _ticks = worker.join().unwrap();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use web_time::Instant;

struct Shared {
    cancelled: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

/// Control side: triggers cancellation.
///
/// Dropping a source does not cancel its tokens.
pub struct CancellationSource {
    shared: Arc<Shared>,
}

/// Observer side: cheap to clone, safe to move into a worker thread.
#[derive(Clone)]
pub struct CancellationToken {
    shared: Arc<Shared>,
}

impl CancellationSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                cancelled: AtomicBool::new(false),
                lock: Mutex::new(()),
                wake: Condvar::new(),
            }),
        }
    }

    /// A token observing this source.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Request cancellation and wake every sleeping token. Idempotent.
    pub fn cancel(&self) {
        // Hold the lock while flipping the flag so a waiter cannot check the
        // flag and then miss the notification.
        let _guard = self.shared.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.shared.cancelled.store(true, Ordering::Release);
        self.shared.wake.notify_all();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationSource")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancellationToken {
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }

    /// Sleep for `period` unless cancelled first.
    ///
    /// Returns `true` when cancelled (before or during the wait), `false`
    /// when the full period elapsed.
    pub fn wait_timeout(&self, period: Duration) -> bool {
        let deadline = Instant::now() + period;
        let mut guard = self.shared.lock.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if self.is_cancelled() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (next, _) = self
                .shared
                .wake
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            guard = next;
        }
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn starts_uncancelled() {
        let source = CancellationSource::new();
        assert!(!source.is_cancelled());
        assert!(!source.token().is_cancelled());
    }

    #[test]
    fn cancel_reaches_every_token() {
        let source = CancellationSource::default();
        let a = source.token();
        let b = a.clone();
        source.cancel();
        source.cancel();
        assert!(a.is_cancelled() && b.is_cancelled());
    }

    #[test]
    fn dropping_source_keeps_tokens_live() {
        let source = CancellationSource::new();
        let token = source.token();
        drop(source);
        assert!(!token.is_cancelled());
        assert!(!token.wait_timeout(Duration::from_millis(1)));
    }

    #[test]
    fn wait_times_out_when_not_cancelled() {
        let token = CancellationSource::new().token();
        let start = Instant::now();
        assert!(!token.wait_timeout(Duration::from_millis(15)));
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn wait_wakes_early_on_cancel() {
        let source = CancellationSource::new();
        let token = source.token();
        let start = Instant::now();
        let sleeper = thread::spawn(move || token.wait_timeout(Duration::from_secs(30)));
        thread::sleep(Duration::from_millis(20));
        source.cancel();
        assert!(sleeper.join().unwrap());
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn wait_after_cancel_returns_immediately() {
        let source = CancellationSource::new();
        source.cancel();
        assert!(source.token().wait_timeout(Duration::from_secs(30)));
    }
}
