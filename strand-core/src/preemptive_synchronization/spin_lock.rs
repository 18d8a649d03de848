//! Busy-waiting locks for preemptive threads.
//!
//! Two baseline mutual-exclusion locks, kept for comparison with the
//! lock-free collections:
//!
//! ```text
//!   TasLock (test-and-set):
//!   ┌──────────────────────────────────────────────┐
//!   │ loop { CAS(false -> true) }                  │
//!   │ every attempt is a write on the lock's line  │
//!   └──────────────────────────────────────────────┘
//!
//!   TtasLock (test-and-test-and-set):
//!   ┌──────────────────────────────────────────────┐
//!   │ loop { while load() {}  CAS(false -> true) } │
//!   │ waiters spin on a shared cached copy         │
//!   └──────────────────────────────────────────────┘
//! ```
//!
//! Neither lock is fair or re-entrant, and neither parks the thread.
//! `SpinMutex` wraps either one around a value with an RAII guard.

use std::cell::UnsafeCell;
use std::fmt;
use std::hint;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};

/// A raw mutual-exclusion lock with explicit acquire/release.
///
/// `release` must only be called by the thread that holds the lock.
///
pub trait RawSpinLock: Default + Send + Sync {
    /// Spin until the lock is held by the caller.
    fn acquire(&self);

    /// Release the lock.
    fn release(&self);

    /// Single acquisition attempt.
    fn try_acquire(&self) -> bool;

    /// Whether some thread currently holds the lock.
    fn is_locked(&self) -> bool;
}

/// Test-and-set lock.
#[derive(Default)]
pub struct TasLock {
    locked: AtomicBool,
}

impl TasLock {
    pub const fn new() -> Self {
        TasLock {
            locked: AtomicBool::new(false),
        }
    }
}

impl RawSpinLock for TasLock {
    fn acquire(&self) {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            hint::spin_loop();
        }
    }

    fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }

    fn try_acquire(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

/// Test-and-test-and-set lock.
#[derive(Default)]
pub struct TtasLock {
    locked: AtomicBool,
}

impl TtasLock {
    pub const fn new() -> Self {
        TtasLock {
            locked: AtomicBool::new(false),
        }
    }
}

impl RawSpinLock for TtasLock {
    fn acquire(&self) {
        loop {
            // Read-only spin until the lock looks free.
            while self.locked.load(Ordering::Relaxed) {
                hint::spin_loop();
            }

            if self.try_acquire() {
                return;
            }
        }
    }

    fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }

    fn try_acquire(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

/// A value protected by a spin lock.
///
/// ```rust
/// use strand_core::preemptive_synchronization::spin_lock::{SpinMutex, TasLock};
///
/// let counter: SpinMutex<usize, TasLock> = SpinMutex::new(0);
/// *counter.lock() += 1;
/// assert_eq!(counter.into_inner(), 1);
/// ```
///
pub struct SpinMutex<T, L: RawSpinLock = TtasLock> {
    lock: L,
    data: UnsafeCell<T>,
}

// Safety: access to `data` is serialized by `lock`.
unsafe impl<T: Send, L: RawSpinLock> Send for SpinMutex<T, L> {}
unsafe impl<T: Send, L: RawSpinLock> Sync for SpinMutex<T, L> {}

impl<T, L: RawSpinLock> SpinMutex<T, L> {
    pub fn new(data: T) -> Self {
        SpinMutex {
            lock: L::default(),
            data: UnsafeCell::new(data),
        }
    }

    /// Spin until the lock is acquired.
    pub fn lock(&self) -> SpinMutexGuard<'_, T, L> {
        self.lock.acquire();
        SpinMutexGuard { mutex: self }
    }

    pub fn try_lock(&self) -> Option<SpinMutexGuard<'_, T, L>> {
        if self.lock.try_acquire() {
            Some(SpinMutexGuard { mutex: self })
        } else {
            None
        }
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    /// No locking needed, the borrow is exclusive.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: Default, L: RawSpinLock> Default for SpinMutex<T, L> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug, L: RawSpinLock> fmt::Debug for SpinMutex<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_lock() {
            Some(guard) => f.debug_struct("SpinMutex").field("data", &*guard).finish(),
            None => f.debug_struct("SpinMutex").field("data", &"<locked>").finish(),
        }
    }
}

/// Holds the lock until dropped.
pub struct SpinMutexGuard<'a, T, L: RawSpinLock> {
    mutex: &'a SpinMutex<T, L>,
}

impl<T, L: RawSpinLock> Deref for SpinMutexGuard<'_, T, L> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T, L: RawSpinLock> DerefMut for SpinMutexGuard<'_, T, L> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T, L: RawSpinLock> Drop for SpinMutexGuard<'_, T, L> {
    fn drop(&mut self) {
        self.mutex.lock.release();
    }
}
