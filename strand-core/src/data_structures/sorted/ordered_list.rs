use std::borrow::Borrow;
use std::cmp::Ordering as KeyOrdering;
use std::fmt;
use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use log::{debug, trace};

use crate::data_structures::MarkedPtr;
use crate::data_structures::OrderedSet;
use crate::guard::Guard;

type NodePtr<K> = *mut ListNode<K>;
type Link<K> = MarkedPtr<ListNode<K>>;

//
// Lock-free ordered set of unique keys, based on Harris's 'A Pragmatic
// Implementation of Non-Blocking Linked-Lists' in the variant by Maged Michael.
//
// =============================================================================
// LIST STRUCTURE
// =============================================================================
//
// There is no sentinel node. The head is a plain atomic pointer and acts as the
// link of a phantom predecessor: every algorithm treats "pred == null" as
// "CAS the head".
//
// ┌──────┐    ┌──────┐    ┌──────┐    ┌──────┐
// │ head │───►│ "ab" │───►│ "cd" │───►│ "ef" │───► null
// └──────┘    └──────┘    └──────┘    └──────┘
//
// Each node's `next` word is a MarkedPtr: bit 0 set means the NODE ITSELF is
// logically deleted (a tombstone). The pair {deleted, next} is only ever
// replaced as one word by compare_exchange.
//
// INVARIANTS:
// 1. Keys along the chain are strictly ascending (tombstones included)
// 2. No two live nodes share a key
// 3. A node is unlinked only after it was marked, and is never unmarked
// 4. A marked link is never modified again, so a CAS expecting an unmarked
//    predecessor link fails once the predecessor is marked
//
// =============================================================================
// REMOVE (two phases)
// =============================================================================
//
// Phase 1: LOGICAL DELETE - CAS curr.next {false, succ} -> {true, succ}
// Phase 2: PHYSICAL UNLINK - CAS pred.next {false, curr} -> {false, succ}
//
//          pred ──────► curr ──╳───► succ        (after phase 1)
//          pred ─────────────────────► succ      (after phase 2)
//
// Phase 2 is attempted exactly once. If it loses a race the tombstone stays
// linked and the next find() passing over it unlinks it.
//
// =============================================================================
// RECLAMATION
// =============================================================================
//
// Invariant 4 means each node is unlinked by exactly one successful CAS. The
// thread whose CAS succeeds hands the node to the guard's defer_destroy. Nodes
// still linked when the list drops (tombstones included) are freed by Drop.
//
pub(crate) struct ListNode<K> {
    key: K,
    next: AtomicPtr<ListNode<K>>,
}

impl<K> ListNode<K> {
    fn new(key: K) -> Self {
        ListNode {
            key,
            next: AtomicPtr::new(ptr::null_mut()),
        }
    }

    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    fn key_as<Q>(&self) -> &Q
    where
        K: Borrow<Q>,
        Q: ?Sized,
    {
        self.key.borrow()
    }

    /// Load the {deleted, next} pair (Acquire ordering).
    #[inline]
    fn link(&self) -> Link<K> {
        MarkedPtr::new(self.next.load(Ordering::Acquire))
    }

    /// Store the link of a node that is not yet published.
    #[inline]
    fn set_link(&self, link: Link<K>) {
        self.next.store(link.as_raw(), Ordering::Relaxed)
    }

    /// CAS the whole {deleted, next} pair (AcqRel/Acquire ordering).
    #[inline]
    fn cas_link(&self, expected: Link<K>, new: Link<K>) -> Result<(), Link<K>> {
        self.next
            .compare_exchange(
                expected.as_raw(),
                new.as_raw(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(MarkedPtr::new)
    }

    /// Deallocate a node allocated with `Box::new`.
    ///
    /// # Safety
    /// - Must only be called once per node
    /// - The node must not be accessed after this call
    ///
    unsafe fn dealloc_ptr(ptr: *mut Self) {
        unsafe { drop(Box::from_raw(ptr)) };
    }
}

// The neighbourhood of a key as observed by find().
//
// `pred_link` is the snapshot of pred's link (or of the head when pred is
// null); it is unmarked and points at `curr`. `curr_link` is curr's unmarked
// link snapshot, or null when curr is null.
//
struct Window<K> {
    pred: NodePtr<K>,
    pred_link: Link<K>,
    curr: NodePtr<K>,
    curr_link: Link<K>,
}

/// Lock-free ordered set of unique keys.
///
/// Unlinked nodes are handed to the guard `G`, which may free them later and
/// on another thread. Keys must therefore be `Send + 'static`:
///
/// ```compile_fail
/// use std::rc::Rc;
/// use strand_core::{DeferredGuard, OrderedList};
///
/// let list: OrderedList<Rc<str>, DeferredGuard> = OrderedList::new();
/// list.add(Rc::from("not send"));
/// ```
///
/// ```compile_fail
/// use strand_core::{DeferredGuard, OrderedList};
///
/// let owner = String::from("borrowed");
/// let list: OrderedList<&str, DeferredGuard> = OrderedList::new();
/// list.add(owner.as_str());
/// ```
///
pub struct OrderedList<K, G: Guard> {
    head: AtomicPtr<ListNode<K>>,
    /// Receives every node this list unlinks.
    guard: G,
    _marker: PhantomData<*mut ListNode<K>>,
}

// Keys are moved in from one thread and may be dropped on another (through
// the guard), and are read concurrently by every traversal.
unsafe impl<K: Send + Sync, G: Guard> Send for OrderedList<K, G> {}
unsafe impl<K: Send + Sync, G: Guard> Sync for OrderedList<K, G> {}

impl<K, G> OrderedList<K, G>
where
    K: Ord + Send + 'static,
    G: Guard,
{
    pub fn new() -> Self {
        OrderedList {
            head: AtomicPtr::new(ptr::null_mut()),
            guard: G::default(),
            _marker: PhantomData,
        }
    }

    /// Get the guard that receives unlinked nodes.
    pub fn guard(&self) -> &G {
        &self.guard
    }

    /// Inserts `key` if absent. Returns `false` if a live node with an equal
    /// key is already present. Lock-free.
    ///
    pub fn add(&self, key: K) -> bool {
        let _guard = G::pin();

        // The node is only published by a successful CAS, so one allocation
        // serves every retry.
        let new_node = Box::into_raw(Box::new(ListNode::new(key)));

        loop {
            let key = unsafe { (*new_node).key() };
            let window = self.find(key);

            if let Some(curr) = unsafe { window.curr.as_ref() } {
                if curr.key() == key {
                    unsafe { ListNode::dealloc_ptr(new_node) };
                    return false;
                }
            }

            unsafe { (*new_node).set_link(MarkedPtr::new(window.curr)) };

            let spliced =
                unsafe { self.cas_pred_link(window.pred, window.pred_link, MarkedPtr::new(new_node)) };
            if spliced.is_ok() {
                return true;
            }

            // The predecessor was marked or got a new successor.
            trace!("add: splice lost its race, retrying");
        }
    }

    /// Membership test. Wait-free: never writes, never unlinks, and passes
    /// over tombstones with smaller keys without helping.
    ///
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let _guard = G::pin();
        let mut curr = self.head.load(Ordering::Acquire);

        while let Some(node) = unsafe { curr.as_ref() } {
            let link = node.link();
            match node.key_as::<Q>().cmp(key) {
                KeyOrdering::Less => curr = link.as_ptr(),
                KeyOrdering::Equal => return !link.is_marked(),
                KeyOrdering::Greater => return false,
            }
        }

        false
    }

    /// Removes `key` if a live node holds it. Lock-free.
    ///
    /// Marks the node, then makes one attempt to unlink it. A failed unlink
    /// is not retried: the tombstone is unlinked by a later find().
    ///
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let _guard = G::pin();

        loop {
            let window = self.find(key);

            let Some(curr) = (unsafe { window.curr.as_ref() }) else {
                return false;
            };
            if curr.key_as::<Q>() != key {
                return false;
            }

            // Logical deletion, successor untouched.
            let succ = window.curr_link;
            if curr.cas_link(succ, succ.with_mark(true)).is_err() {
                // Someone inserted right after curr, or marked it first.
                trace!("remove: mark lost its race, retrying");
                continue;
            }

            // Best-effort physical unlink, single attempt.
            match unsafe { self.cas_pred_link(window.pred, window.pred_link, succ) } {
                Ok(()) => unsafe {
                    self.guard.defer_destroy(window.curr, ListNode::dealloc_ptr);
                },
                Err(_) => trace!("remove: unlink lost its race, tombstone left for helpers"),
            }

            return true;
        }
    }

    /// Returns an iterator over clones of the live keys in ascending order.
    ///
    /// The iterator is a weakly consistent snapshot: keys added or removed
    /// concurrently may or may not be observed.
    ///
    pub fn iter(&self) -> Iter<'_, K, G> {
        let guard = G::pin();
        let first = self.first_live(self.head.load(Ordering::Acquire));
        Iter {
            _guard: guard,
            current: first,
            _list: PhantomData,
        }
    }

    /// Collects all live keys into a Vec.
    ///
    pub fn to_vec(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.iter().collect()
    }

    /// Number of live keys. Linear in the list length.
    ///
    pub fn len(&self) -> usize {
        let _guard = G::pin();
        let mut count = 0;
        let mut current = self.first_live(self.head.load(Ordering::Acquire));
        while let Some(node) = unsafe { current.as_ref() } {
            count += 1;
            current = self.first_live(node.link().as_ptr());
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        let _guard = G::pin();
        self.first_live(self.head.load(Ordering::Acquire)).is_null()
    }

    // Core operation: search with cleanup.
    //
    // Returns pred (null for the head) and curr, the first live node whose key
    // is >= `key` (null at the end), unlinking every tombstone on the way.
    // Any failed unlink restarts from the head.
    //
    fn find<Q>(&self, key: &Q) -> Window<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        'retry: loop {
            let mut pred: NodePtr<K> = ptr::null_mut();
            let mut pred_link: Link<K> = MarkedPtr::new(self.head.load(Ordering::Acquire));
            let mut curr = pred_link.as_ptr();

            while let Some(node) = unsafe { curr.as_ref() } {
                let curr_link = node.link();

                if curr_link.is_marked() {
                    // curr is a tombstone: snip it out, keeping pred unmarked.
                    let succ = curr_link.with_mark(false);

                    if unsafe { self.cas_pred_link(pred, pred_link, succ) }.is_err() {
                        // pred was marked or its successor changed.
                        trace!("find: unlink failed, restarting from head");
                        continue 'retry;
                    }

                    unsafe { self.guard.defer_destroy(curr, ListNode::dealloc_ptr) };

                    pred_link = succ;
                    curr = succ.as_ptr();
                    continue;
                }

                if node.key_as::<Q>() >= key {
                    return Window {
                        pred,
                        pred_link,
                        curr,
                        curr_link,
                    };
                }

                pred = curr;
                pred_link = curr_link;
                curr = curr_link.as_ptr();
            }

            return Window {
                pred,
                pred_link,
                curr: ptr::null_mut(),
                curr_link: MarkedPtr::null(),
            };
        }
    }

    /// CAS the link of `pred`, or the head when `pred` is null.
    ///
    /// # Safety
    /// `pred` must be null or a node protected by the caller's pin.
    ///
    #[inline]
    unsafe fn cas_pred_link(
        &self,
        pred: NodePtr<K>,
        expected: Link<K>,
        new: Link<K>,
    ) -> Result<(), Link<K>> {
        match unsafe { pred.as_ref() } {
            Some(pred) => pred.cas_link(expected, new),
            None => self
                .head
                .compare_exchange(
                    expected.as_raw(),
                    new.as_raw(),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .map(|_| ())
                .map_err(MarkedPtr::new),
        }
    }

    // First live node at or after `node`, skipping tombstones without
    // unlinking them.
    //
    fn first_live(&self, mut node: NodePtr<K>) -> NodePtr<K> {
        while let Some(curr) = unsafe { node.as_ref() } {
            let link = curr.link();
            if !link.is_marked() {
                return node;
            }
            node = link.as_ptr();
        }
        ptr::null_mut()
    }

    #[cfg(test)]
    fn physical_len(&self) -> usize {
        let _guard = G::pin();
        let mut count = 0;
        let mut curr = self.head.load(Ordering::Acquire);
        while let Some(node) = unsafe { curr.as_ref() } {
            count += 1;
            curr = node.link().as_ptr();
        }
        count
    }
}

/// Iterator over an `OrderedList`, holding a read guard for its lifetime.
///
pub struct Iter<'a, K, G: Guard> {
    _guard: G::ReadGuard,
    current: NodePtr<K>,
    _list: PhantomData<&'a OrderedList<K, G>>,
}

impl<K, G> Iterator for Iter<'_, K, G>
where
    K: Ord + Clone,
    G: Guard,
{
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        let node = unsafe { self.current.as_ref() }?;

        // Advance to the next live node, skipping tombstones.
        let mut next = node.link().as_ptr();
        while let Some(candidate) = unsafe { next.as_ref() } {
            debug_assert!(
                candidate.key() > node.key(),
                "INVARIANT VIOLATION: list keys are not strictly ascending"
            );
            let link = candidate.link();
            if !link.is_marked() {
                break;
            }
            next = link.as_ptr();
        }
        self.current = next;

        Some(node.key().clone())
    }
}

impl<K, G> OrderedSet<K> for OrderedList<K, G>
where
    K: Ord + Send + 'static,
    G: Guard,
{
    fn add(&self, key: K) -> bool {
        OrderedList::add(self, key)
    }

    fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        OrderedList::contains(self, key)
    }

    fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        OrderedList::remove(self, key)
    }

    fn to_vec(&self) -> Vec<K>
    where
        K: Clone,
    {
        OrderedList::to_vec(self)
    }

    fn len(&self) -> usize {
        OrderedList::len(self)
    }
}

impl<K, G> Default for OrderedList<K, G>
where
    K: Ord + Send + 'static,
    G: Guard,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, G> fmt::Debug for OrderedList<K, G>
where
    K: Ord + Clone + fmt::Debug + Send + 'static,
    G: Guard,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, G: Guard> Drop for OrderedList<K, G> {
    fn drop(&mut self) {
        // Free every node still linked, tombstones included. Unlinked nodes
        // belong to the guard.
        //
        let mut curr = *self.head.get_mut();
        let mut tombstones = 0usize;

        while !curr.is_null() {
            unsafe {
                let link = (*curr).link();
                if link.is_marked() {
                    tombstones += 1;
                }
                ListNode::dealloc_ptr(curr);
                curr = link.as_ptr();
            }
        }

        if tombstones > 0 {
            debug!("ordered list dropped with {} linked tombstone(s)", tombstones);
        }
    }
}

// ============================================================================
// Tests - Unique to OrderedList
// ============================================================================
// Note: Common tests are in common_tests and run from tests/.
