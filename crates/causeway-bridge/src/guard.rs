//! Runtime guard
//!
//! Scoped, reentrant mutual exclusion required before any call into managed
//! code. Native threads acquire the guard on entry; same-thread nesting (a
//! callback synchronously triggering an operation whose completion re-enters
//! the bridge) never deadlocks. [`GuardToken::blocking`] releases the guard
//! around a blocking native call and reacquires it before resuming, restoring
//! the full nesting depth even if the call unwinds.
//!
//! Without the `threads` feature (single-threaded engines) the guard degrades
//! to depth accounting only.

#[cfg(feature = "threads")]
mod imp {
    use std::sync::{Condvar, Mutex};
    use std::thread::{self, ThreadId};

    #[derive(Default)]
    struct GuardState {
        owner: Option<ThreadId>,
        depth: usize,
    }

    /// Reentrant mutual-exclusion guard for managed-code entry
    pub struct RuntimeGuard {
        state: Mutex<GuardState>,
        released: Condvar,
    }

    impl RuntimeGuard {
        pub fn new() -> Self {
            Self {
                state: Mutex::new(GuardState::default()),
                released: Condvar::new(),
            }
        }

        /// Acquire the guard, blocking until it is free or already held by
        /// this thread.
        pub fn lock(&self) -> GuardToken<'_> {
            self.acquire_depth(1);
            GuardToken { guard: self }
        }

        /// True if the calling thread currently holds the guard
        pub fn held_by_current_thread(&self) -> bool {
            let state = self.state.lock().unwrap();
            state.owner == Some(thread::current().id())
        }

        /// Nesting depth held by the calling thread (0 if not the owner)
        pub fn depth(&self) -> usize {
            let state = self.state.lock().unwrap();
            if state.owner == Some(thread::current().id()) {
                state.depth
            } else {
                0
            }
        }

        fn acquire_depth(&self, depth: usize) {
            let me = thread::current().id();
            let mut state = self.state.lock().unwrap();
            loop {
                match state.owner {
                    None => {
                        state.owner = Some(me);
                        state.depth = depth;
                        return;
                    }
                    Some(owner) if owner == me => {
                        state.depth += depth;
                        return;
                    }
                    Some(_) => state = self.released.wait(state).unwrap(),
                }
            }
        }

        fn unlock_one(&self) {
            let mut state = self.state.lock().unwrap();
            debug_assert_eq!(state.owner, Some(thread::current().id()));
            state.depth -= 1;
            if state.depth == 0 {
                state.owner = None;
                drop(state);
                self.released.notify_one();
            }
        }

        /// Release the full nesting depth held by this thread; returns the
        /// depth to restore.
        fn release_all(&self) -> usize {
            let mut state = self.state.lock().unwrap();
            debug_assert_eq!(state.owner, Some(thread::current().id()));
            let depth = state.depth;
            state.owner = None;
            state.depth = 0;
            drop(state);
            self.released.notify_one();
            depth
        }
    }

    impl Default for RuntimeGuard {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Scoped token; drops release the guard on every exit path
    pub struct GuardToken<'a> {
        guard: &'a RuntimeGuard,
    }

    impl GuardToken<'_> {
        /// Run a blocking native call with the guard released.
        ///
        /// The entire nesting depth is released so other threads can enter
        /// managed code for the duration; reacquisition restores it before
        /// results are interpreted. Restoration also happens if `f` unwinds.
        pub fn blocking<R>(&self, f: impl FnOnce() -> R) -> R {
            let depth = self.guard.release_all();
            let _restore = Reacquire {
                guard: self.guard,
                depth,
            };
            f()
        }
    }

    impl Drop for GuardToken<'_> {
        fn drop(&mut self) {
            self.guard.unlock_one();
        }
    }

    struct Reacquire<'a> {
        guard: &'a RuntimeGuard,
        depth: usize,
    }

    impl Drop for Reacquire<'_> {
        fn drop(&mut self) {
            self.guard.acquire_depth(self.depth);
        }
    }
}

#[cfg(not(feature = "threads"))]
mod imp {
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Depth accounting only; single-threaded engines need no exclusion
    pub struct RuntimeGuard {
        depth: AtomicUsize,
    }

    impl RuntimeGuard {
        pub fn new() -> Self {
            Self {
                depth: AtomicUsize::new(0),
            }
        }

        pub fn lock(&self) -> GuardToken<'_> {
            self.depth.fetch_add(1, Ordering::Relaxed);
            GuardToken { guard: self }
        }

        pub fn held_by_current_thread(&self) -> bool {
            self.depth.load(Ordering::Relaxed) > 0
        }

        pub fn depth(&self) -> usize {
            self.depth.load(Ordering::Relaxed)
        }
    }

    impl Default for RuntimeGuard {
        fn default() -> Self {
            Self::new()
        }
    }

    pub struct GuardToken<'a> {
        guard: &'a RuntimeGuard,
    }

    impl GuardToken<'_> {
        pub fn blocking<R>(&self, f: impl FnOnce() -> R) -> R {
            f()
        }
    }

    impl Drop for GuardToken<'_> {
        fn drop(&mut self) {
            self.guard.depth.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

pub use imp::{GuardToken, RuntimeGuard};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reentrant_acquire_on_same_thread() {
        let guard = RuntimeGuard::new();
        let outer = guard.lock();
        assert_eq!(guard.depth(), 1);

        let inner = guard.lock();
        assert_eq!(guard.depth(), 2);

        drop(inner);
        assert_eq!(guard.depth(), 1);
        drop(outer);
        assert_eq!(guard.depth(), 0);
    }

    #[test]
    fn test_released_on_drop() {
        let guard = RuntimeGuard::new();
        {
            let _token = guard.lock();
            assert!(guard.held_by_current_thread());
        }
        assert!(!guard.held_by_current_thread());
    }

    #[cfg(feature = "threads")]
    #[test]
    fn test_blocking_releases_and_restores_depth() {
        let guard = RuntimeGuard::new();
        let outer = guard.lock();
        let _inner = guard.lock();
        assert_eq!(guard.depth(), 2);

        outer.blocking(|| {
            assert!(!guard.held_by_current_thread());
        });

        assert_eq!(guard.depth(), 2);
    }

    #[cfg(feature = "threads")]
    #[test]
    fn test_excludes_other_threads() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let guard = Arc::new(RuntimeGuard::new());
        let entered = Arc::new(AtomicBool::new(false));

        let token = guard.lock();
        let handle = {
            let guard = Arc::clone(&guard);
            let entered = Arc::clone(&entered);
            std::thread::spawn(move || {
                let _token = guard.lock();
                entered.store(true, Ordering::SeqCst);
            })
        };

        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(!entered.load(Ordering::SeqCst));

        drop(token);
        handle.join().unwrap();
        assert!(entered.load(Ordering::SeqCst));
    }
}
