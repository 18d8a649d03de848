//! Deferred guard implementation for testing.
//!
//! `DeferredGuard` keeps every retired node alive until the guard itself is
//! dropped, which gives tests predictable destruction timing.

#[cfg(debug_assertions)]
use std::collections::HashSet;
use std::sync::Mutex;

use super::Guard;

/// A simple guard that defers all node destruction until the guard is dropped.
///
/// Not suitable for long-running use: memory accumulates until the owning
/// collection is dropped.
///
pub struct DeferredGuard {
    deferred: Mutex<Vec<DeferredNode>>,
    #[cfg(debug_assertions)]
    seen: Mutex<HashSet<usize>>,
}

struct DeferredNode {
    ptr: *mut (),
    dealloc: unsafe fn(*mut ()),
}

// Safety: only the pointer and its deallocation function are stored, and all
// access goes through the Mutex.
unsafe impl Send for DeferredNode {}

impl DeferredGuard {
    /// Create a new deferred guard.
    pub fn new() -> Self {
        DeferredGuard {
            deferred: Mutex::new(Vec::new()),
            #[cfg(debug_assertions)]
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Number of nodes waiting for the guard to drop.
    pub fn pending(&self) -> usize {
        self.deferred.lock().unwrap().len()
    }
}

impl Default for DeferredGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DeferredGuard {
    fn drop(&mut self) {
        let nodes = self.deferred.get_mut().unwrap();

        for node in nodes.drain(..) {
            unsafe {
                (node.dealloc)(node.ptr);
            }
        }
    }
}

impl Guard for DeferredGuard {
    /// Protection is provided by the collection's stored guard.
    type ReadGuard = ();

    fn pin() -> Self::ReadGuard {}

    unsafe fn defer_destroy<N: Send + 'static>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        #[cfg(debug_assertions)]
        {
            let addr = node as usize;
            let mut seen = self.seen.lock().unwrap();
            if !seen.insert(addr) {
                panic!("DUPLICATE defer_destroy at {:#x}", addr);
            }
        }

        let node = DeferredNode {
            ptr: node as *mut (),
            dealloc: unsafe {
                std::mem::transmute::<unsafe fn(*mut N), unsafe fn(*mut ())>(dealloc)
            },
        };
        self.deferred.lock().unwrap().push(node);
    }
}
