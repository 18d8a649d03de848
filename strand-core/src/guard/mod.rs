//! Guard trait for memory reclamation strategies.
//!
//! A node unlinked from a lock-free list may still be referenced by a thread
//! that loaded it before the unlink. The `Guard` trait abstracts over the
//! strategy that decides when such a node can actually be freed.
//!
//! # Design
//!
//! ```text
//! OrderedList<K, G: Guard>
//!     │
//!     ├── OrderedList<K, EpochGuard>      (production, strand-crossbeam)
//!     └── OrderedList<K, DeferredGuard>   (testing)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use strand_core::OrderedList;
//! use strand_crossbeam::EpochGuard;
//!
//! let list: OrderedList<String, EpochGuard> = OrderedList::new();
//! list.add("foo".to_string());
//! ```

mod deferred_guard;

pub use deferred_guard::DeferredGuard;

/// A memory reclamation guard that protects concurrent access to nodes.
///
/// # Safety Contract
///
/// Implementations must ensure that a node passed to `defer_destroy` is not
/// freed while any thread that was inside a `pin()` region at the time of the
/// call can still reach it.
///
/// Guards are stored in collections and must be `Send + Sync`. The stored
/// guard only schedules destruction; protection of reads is per-operation
/// through `pin()`.
///
pub trait Guard: Sized + Default + Send + Sync {
    /// An active guard that protects node reads for its lifetime.
    ///
    /// For epoch-based guards this holds a pinned `crossbeam_epoch::Guard`.
    /// For deferred guards it is `()`, the collection's stored guard keeps
    /// every retired node alive anyway.
    ///
    type ReadGuard: Sized;

    /// Pin an active read guard.
    ///
    fn pin() -> Self::ReadGuard;

    /// Schedule a node for deferred destruction.
    ///
    /// # Safety
    ///
    /// - `node` must be a valid pointer previously allocated by the collection
    /// - `node` must be unlinked (not reachable from the head by traversal)
    /// - `node` must not be passed to `defer_destroy` again
    /// - `dealloc` must be the correct deallocation function for `node`
    ///
    /// `N: Send + 'static` because the node may be freed on another thread,
    /// after the retiring collection is gone.
    ///
    unsafe fn defer_destroy<N: Send + 'static>(&self, node: *mut N, dealloc: unsafe fn(*mut N));
}
