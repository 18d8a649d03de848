use std::borrow::Borrow;

/// A concurrent set of unique, totally ordered keys.
///
/// Every method takes `&self` and may be called from any number of threads
/// at once. Implementations provide membership, insertion and removal only;
/// the snapshot helpers (`to_vec`, `len`) are weakly consistent under
/// concurrent modification.
///
/// ```text
/// OrderedList<String, DeferredGuard>   - Testing: deferred destruction
/// OrderedList<String, EpochGuard>      - Production: epoch-based reclamation
/// ```
///
pub trait OrderedSet<K: Ord> {
    /// Insert a key. Returns `true` if inserted, `false` if already present.
    ///
    fn add(&self, key: K) -> bool;

    /// Check whether a live key equal to `key` is present.
    ///
    fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized;

    /// Remove a key. Returns `true` if a live key was found and removed.
    ///
    fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized;

    /// Collects all live keys in ascending order.
    ///
    fn to_vec(&self) -> Vec<K>
    where
        K: Clone;

    /// Returns the number of live keys.
    ///
    fn len(&self) -> usize;

    /// Check if the set has no live keys.
    ///
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
