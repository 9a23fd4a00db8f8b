//! Sample modification lock
//!
//! Uniqueness-of-code enforcement for samples cannot rely on a database
//! exclusive table lock (portability constraint), so writes to sample
//! entities are serialized in-process instead. One reentrant gate exists per
//! persistence store; it is the only state shared and mutated across
//! transactions in this core.
//!
//! The lock is acquired on the first sample write inside a transaction,
//! re-entered for further writes on the same thread, and fully released when
//! the transaction completes, commit or rollback. There is no timeout: a
//! stuck transaction blocks all other sample writes indefinitely.

use crate::observer::EntityObserver;
use crate::transaction::{TransactionContext, TransactionOutcome};
use limsdb_core::Entity;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, error};

#[derive(Debug, Default)]
struct LockState {
    owner: Option<ThreadId>,
    count: usize,
}

/// Reentrant mutual-exclusion gate for sample writes
///
/// Built on a mutex/condvar pair rather than a scoped guard type because a
/// hold must span arbitrarily many call frames: acquired inside a write
/// notification, released at transaction completion.
#[derive(Debug, Default)]
pub struct SampleLock {
    state: Mutex<LockState>,
    available: Condvar,
}

impl SampleLock {
    /// Create an unlocked gate
    pub fn new() -> Self {
        SampleLock::default()
    }

    /// Acquire the gate, blocking while another thread owns it
    ///
    /// Reentrant: a no-op increment when the calling thread already owns it.
    pub fn acquire(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();
        loop {
            match state.owner {
                None => {
                    state.owner = Some(me);
                    state.count = 1;
                    debug!(target: "limsdb::lock", "Sample lock acquired");
                    return;
                }
                Some(owner) if owner == me => {
                    state.count += 1;
                    return;
                }
                Some(_) => self.available.wait(&mut state),
            }
        }
    }

    /// Acquire without blocking; returns whether the gate was acquired
    pub fn try_acquire(&self) -> bool {
        let me = thread::current().id();
        let mut state = self.state.lock();
        match state.owner {
            None => {
                state.owner = Some(me);
                state.count = 1;
                true
            }
            Some(owner) if owner == me => {
                state.count += 1;
                true
            }
            Some(_) => false,
        }
    }

    /// Release one hold; wakes a waiter when fully released
    ///
    /// A release by a thread that does not own the gate is an internal
    /// consistency violation; it is logged and ignored.
    pub fn release(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.owner != Some(me) || state.count == 0 {
            error!(target: "limsdb::lock", "Sample lock release by non-owner thread");
            return;
        }
        state.count -= 1;
        if state.count == 0 {
            state.owner = None;
            debug!(target: "limsdb::lock", "Sample lock released");
            self.available.notify_one();
        }
    }

    /// Whether any thread currently owns the gate
    pub fn is_locked(&self) -> bool {
        self.state.lock().owner.is_some()
    }

    /// Current hold count of the owning thread (zero when unlocked)
    pub fn held_count(&self) -> usize {
        self.state.lock().count
    }
}

/// A transaction's holds on the sample lock
///
/// Tracks how many times the owning transaction acquired the gate and
/// releases exactly that many times when dropped, so the gate is never left
/// held across transactions regardless of the exit path.
///
/// The hold (and the context carrying it) must stay on the thread that
/// acquired the gate: a drop on another thread is a non-owner release, which
/// the gate logs and ignores, leaving it held. A transaction runs on one
/// thread for its whole life, so the situation does not arise here.
#[derive(Debug)]
pub struct SampleLockHold {
    lock: Arc<SampleLock>,
    count: usize,
}

impl SampleLockHold {
    /// Create an empty hold on the given gate
    pub fn new(lock: Arc<SampleLock>) -> Self {
        SampleLockHold { lock, count: 0 }
    }

    /// Acquire one more hold (blocks on first acquisition if contended)
    pub fn acquire(&mut self) {
        self.lock.acquire();
        self.count += 1;
    }

    /// Number of holds this transaction has taken
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Drop for SampleLockHold {
    fn drop(&mut self) {
        for _ in 0..self.count {
            self.lock.release();
        }
        self.count = 0;
    }
}

/// Observer that serializes sample writes across concurrent transactions
pub struct SampleLockObserver {
    lock: Arc<SampleLock>,
}

impl SampleLockObserver {
    /// Create the observer over the store's gate
    pub fn new(lock: Arc<SampleLock>) -> Self {
        SampleLockObserver { lock }
    }
}

impl EntityObserver for SampleLockObserver {
    fn name(&self) -> &'static str {
        "sample-lock"
    }

    fn on_insert(&self, ctx: &mut TransactionContext, entity: &Entity) -> bool {
        if entity.kind.is_lock_guarded() {
            ctx.acquire_sample_lock(&self.lock);
        }
        false
    }

    fn on_update(&self, ctx: &mut TransactionContext, entity: &Entity) -> bool {
        if entity.kind.is_lock_guarded() {
            ctx.acquire_sample_lock(&self.lock);
        }
        false
    }

    fn after_completion(&self, ctx: &mut TransactionContext, _outcome: TransactionOutcome) {
        ctx.release_sample_lock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[test]
    fn test_reentrant_same_thread() {
        let lock = SampleLock::new();
        lock.acquire();
        lock.acquire();
        lock.acquire();
        assert_eq!(lock.held_count(), 3);

        lock.release();
        lock.release();
        assert!(lock.is_locked());
        lock.release();
        assert!(!lock.is_locked());
        assert_eq!(lock.held_count(), 0);
    }

    #[test]
    fn test_blocks_other_thread_until_fully_released() {
        let lock = Arc::new(SampleLock::new());
        lock.acquire();
        lock.acquire();

        let lock2 = Arc::clone(&lock);
        let acquired = Arc::new(AtomicBool::new(false));
        let acquired2 = Arc::clone(&acquired);
        let waiter = thread::spawn(move || {
            lock2.acquire();
            acquired2.store(true, Ordering::SeqCst);
            lock2.release();
        });

        thread::sleep(Duration::from_millis(30));
        assert!(
            !acquired.load(Ordering::SeqCst),
            "waiter must block while two holds remain"
        );

        lock.release();
        thread::sleep(Duration::from_millis(30));
        assert!(
            !acquired.load(Ordering::SeqCst),
            "waiter must block while one hold remains"
        );

        lock.release();
        waiter.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_try_acquire_contended() {
        let lock = Arc::new(SampleLock::new());
        lock.acquire();

        let lock2 = Arc::clone(&lock);
        let handle = thread::spawn(move || lock2.try_acquire());
        assert!(!handle.join().unwrap());

        lock.release();
        let lock3 = Arc::clone(&lock);
        let handle = thread::spawn(move || {
            let got = lock3.try_acquire();
            if got {
                lock3.release();
            }
            got
        });
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_hold_releases_all_on_drop() {
        let lock = Arc::new(SampleLock::new());
        {
            let mut hold = SampleLockHold::new(Arc::clone(&lock));
            hold.acquire();
            hold.acquire();
            assert_eq!(hold.count(), 2);
            assert_eq!(lock.held_count(), 2);
        }
        assert!(!lock.is_locked());
        assert_eq!(lock.held_count(), 0);
    }

    #[test]
    fn test_release_by_non_owner_is_ignored() {
        let lock = Arc::new(SampleLock::new());
        lock.acquire();

        let lock2 = Arc::clone(&lock);
        thread::spawn(move || lock2.release()).join().unwrap();

        // Still held by this thread
        assert!(lock.is_locked());
        assert_eq!(lock.held_count(), 1);
        lock.release();
    }
}
