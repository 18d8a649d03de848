//! Epoch-based guard implementation using crossbeam-epoch.
//!
//! `EpochGuard` is zero-sized. Every list operation pins the calling thread
//! through `Guard::pin`, and unlinked nodes are handed to the global epoch
//! collector, which frees them once every thread pinned at unlink time has
//! unpinned.
//!
//! ```text
//! OrderedList<String, EpochGuard>
//!     │
//!     ├── pin()            -> crossbeam_epoch::pin(), held for the operation
//!     └── defer_destroy()  -> Guard::defer_unchecked on the global collector
//! ```

use crossbeam_epoch::{self as epoch, Guard as CrossbeamGuard};
use strand_core::guard::Guard;

/// Epoch-based memory reclamation guard.
///
/// Unlike `DeferredGuard`, nothing is stored in the collection: pending
/// destructions live in the global collector, so a long-running list does
/// not accumulate retired nodes.
///
#[derive(Clone, Copy, Debug, Default)]
pub struct EpochGuard;

impl EpochGuard {
    pub const fn new() -> Self {
        EpochGuard
    }
}

impl Guard for EpochGuard {
    type ReadGuard = CrossbeamGuard;

    fn pin() -> Self::ReadGuard {
        epoch::pin()
    }

    unsafe fn defer_destroy<N: Send + 'static>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        // Re-entrant pin: callers already hold one for the operation.
        let guard = epoch::pin();
        unsafe {
            guard.defer_unchecked(move || dealloc(node));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    unsafe fn dealloc_counter(ptr: *mut DropCounter) {
        unsafe { drop(Box::from_raw(ptr)) };
    }

    fn collect_until(dropped: &AtomicUsize, expected: usize) {
        for _ in 0..10_000 {
            if dropped.load(Ordering::Relaxed) >= expected {
                return;
            }
            epoch::pin().flush();
        }
    }

    #[test]
    fn test_guard_is_zero_sized() {
        assert_eq!(std::mem::size_of::<EpochGuard>(), 0);
    }

    #[test]
    fn test_deferred_nodes_are_eventually_freed() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let guard = EpochGuard::new();

        for _ in 0..64 {
            let ptr = Box::into_raw(Box::new(DropCounter(Arc::clone(&dropped))));
            unsafe { guard.defer_destroy(ptr, dealloc_counter) };
        }

        collect_until(&dropped, 64);
        assert_eq!(dropped.load(Ordering::Relaxed), 64);
    }

    #[test]
    fn test_pinned_reader_delays_reclamation() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let guard = EpochGuard::default();

        let reader = EpochGuard::pin();
        let ptr = Box::into_raw(Box::new(DropCounter(Arc::clone(&dropped))));
        unsafe { guard.defer_destroy(ptr, dealloc_counter) };

        for _ in 0..100 {
            epoch::pin().flush();
        }
        assert_eq!(dropped.load(Ordering::Relaxed), 0);

        drop(reader);
        collect_until(&dropped, 1);
        assert_eq!(dropped.load(Ordering::Relaxed), 1);
    }
}
