//! Managed runtime facade
//!
//! [`ManagedRuntime`] is the bridge's view of the managed side: the reentrant
//! guard, the pending-error slot, the waiter wake signal, and the
//! wrapped-object registry. One instance is shared (Arc) by every handle
//! record the engine attaches.
//!
//! The pending-error slot never auto-clears: the calling native path observes
//! it with [`ManagedRuntime::error_occurred`] after the bridge returns and
//! consumes it with [`ManagedRuntime::take_error`]. The first raised error is
//! kept; later raises while one is pending are logged and dropped so the root
//! cause survives unwinding.

use crate::engine::{HandleKind, RawHandle};
use crate::error::BridgeError;
use crate::guard::{GuardToken, RuntimeGuard};
use crate::proxy::{ProxyRegistry, WrappedObject};
use causeway_config::Settings;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Result of waiting for the wake signal
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WaitOutcome {
    Signaled,
    TimedOut,
}

/// The managed side of the bridge
pub struct ManagedRuntime {
    guard: RuntimeGuard,
    pending: Mutex<Option<BridgeError>>,
    wake_generation: Mutex<u64>,
    woken: Condvar,
    proxies: ProxyRegistry,
    settings: Settings,
}

impl ManagedRuntime {
    /// Create a runtime with default settings
    pub fn new() -> Arc<Self> {
        Self::with_settings(Settings::default())
    }

    /// Create a runtime with resolved configuration
    pub fn with_settings(settings: Settings) -> Arc<Self> {
        Arc::new(Self {
            guard: RuntimeGuard::new(),
            pending: Mutex::new(None),
            wake_generation: Mutex::new(0),
            woken: Condvar::new(),
            proxies: ProxyRegistry::new(settings.proxy_capacity),
            settings,
        })
    }

    /// Acquire the runtime guard for a managed-code entry
    pub fn lock(&self) -> GuardToken<'_> {
        self.guard.lock()
    }

    pub fn guard(&self) -> &RuntimeGuard {
        &self.guard
    }

    pub fn proxies(&self) -> &ProxyRegistry {
        &self.proxies
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ===== Wrapped-object minting =====

    /// Mint a proxy for a native handle. Guard must be held.
    pub fn mint(&self, raw: RawHandle, kind: HandleKind) -> Result<WrappedObject, BridgeError> {
        debug_assert!(self.guard.held_by_current_thread());
        self.proxies.mint(raw, kind)
    }

    /// Release a minted proxy. Guard must be held.
    pub fn release(&self, object: &WrappedObject) {
        debug_assert!(self.guard.held_by_current_thread());
        self.proxies.release(object);
    }

    // ===== Pending-error slot =====

    /// Park an error in the pending slot. The first error wins; later raises
    /// while one is pending are logged and dropped.
    pub fn raise(&self, error: BridgeError) {
        let mut pending = self.pending.lock().unwrap();
        match &*pending {
            None => {
                tracing::debug!(error = %error, "raising bridge error");
                *pending = Some(error);
            }
            Some(existing) => {
                tracing::warn!(
                    pending = %existing,
                    dropped = %error,
                    "error raised while another is pending; keeping the first"
                );
            }
        }
    }

    /// True if an error is parked in the pending slot
    pub fn error_occurred(&self) -> bool {
        self.pending.lock().unwrap().is_some()
    }

    /// Consume the pending error
    pub fn take_error(&self) -> Option<BridgeError> {
        self.pending.lock().unwrap().take()
    }

    /// Peek at the pending error without clearing it
    pub fn pending_error(&self) -> Option<BridgeError> {
        self.pending.lock().unwrap().clone()
    }

    // ===== Waiter wake signal =====

    /// Wake every native thread blocked in [`ManagedRuntime::wait_woken`] so
    /// it can observe the pending error instead of hanging.
    pub fn wake_waiters(&self) {
        let mut generation = self.wake_generation.lock().unwrap();
        *generation += 1;
        tracing::trace!(generation = *generation, "waking blocked waiters");
        drop(generation);
        self.woken.notify_all();
    }

    /// Block until the wake signal fires or the timeout elapses.
    ///
    /// Must be called from a blocking region, never while holding the guard:
    /// the wake usually comes from a callback that needs the guard to run.
    pub fn wait_woken(&self, timeout: Duration) -> WaitOutcome {
        debug_assert!(!self.guard.held_by_current_thread());
        let mut generation = self.wake_generation.lock().unwrap();
        let start_generation = *generation;
        loop {
            let (next, result) = self
                .woken
                .wait_timeout(generation, timeout)
                .unwrap();
            generation = next;
            if *generation != start_generation {
                return WaitOutcome::Signaled;
            }
            if result.timed_out() {
                return WaitOutcome::TimedOut;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_error_wins() {
        let runtime = ManagedRuntime::new();
        runtime.raise(BridgeError::OutOfMemory);
        runtime.raise(BridgeError::raised("later"));

        assert_eq!(runtime.take_error(), Some(BridgeError::OutOfMemory));
        assert!(!runtime.error_occurred());
    }

    #[test]
    fn test_pending_error_does_not_clear() {
        let runtime = ManagedRuntime::new();
        runtime.raise(BridgeError::raised("stuck"));

        assert!(runtime.pending_error().is_some());
        assert!(runtime.error_occurred());
        assert!(runtime.take_error().is_some());
        assert!(runtime.pending_error().is_none());
    }

    #[test]
    fn test_wait_woken_times_out_without_signal() {
        let runtime = ManagedRuntime::new();
        let outcome = runtime.wait_woken(Duration::from_millis(10));
        assert_eq!(outcome, WaitOutcome::TimedOut);
    }

    #[test]
    fn test_wake_signals_blocked_thread() {
        let runtime = ManagedRuntime::new();
        let waiter = Arc::clone(&runtime);

        let handle = std::thread::spawn(move || waiter.wait_woken(Duration::from_secs(5)));

        std::thread::sleep(Duration::from_millis(20));
        runtime.wake_waiters();

        assert_eq!(handle.join().unwrap(), WaitOutcome::Signaled);
    }

    #[test]
    fn test_mint_under_guard() {
        let runtime = ManagedRuntime::new();
        let token = runtime.lock();
        let object = runtime.mint(RawHandle(1), HandleKind::Stream).unwrap();
        assert_eq!(runtime.proxies().live_count(), 1);
        runtime.release(&object);
        assert_eq!(runtime.proxies().live_count(), 0);
        drop(token);
    }
}
