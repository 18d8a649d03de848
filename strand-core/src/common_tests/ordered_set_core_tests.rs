//! Sequential correctness tests for OrderedSet implementations.

use std::sync::Arc;
use std::thread;

use crate::data_structures::OrderedSet;

fn key(i: usize) -> String {
    format!("key-{:05}", i)
}

/// Check that the live keys are strictly ascending.
pub fn assert_strictly_ascending<K: Ord + std::fmt::Debug>(keys: &[K]) {
    for pair in keys.windows(2) {
        assert!(
            pair[0] < pair[1],
            "keys out of order: {:?} before {:?}",
            pair[0],
            pair[1]
        );
    }
}

/// Test basic add, contains, and remove
pub fn test_basic_operations<C>(collection: &C)
where
    C: OrderedSet<String>,
{
    // Test add
    assert!(collection.add("m".to_string()));
    assert!(collection.add("x".to_string()));
    assert!(collection.add("c".to_string()));
    assert!(collection.add("p".to_string()));
    assert!(collection.add("a".to_string()));

    // Test contains
    assert!(collection.contains("a"));
    assert!(collection.contains("c"));
    assert!(collection.contains("m"));
    assert!(collection.contains("p"));
    assert!(collection.contains("x"));
    assert!(!collection.contains("b"));
    assert!(!collection.contains("zzz"));
    assert!(!collection.contains(""));

    // Test remove
    assert!(collection.remove("c"));
    assert!(!collection.contains("c"));
    assert!(!collection.remove("c")); // Already removed

    // Verify others still present
    assert!(collection.contains("a"));
    assert!(collection.contains("m"));
    assert!(collection.contains("p"));
    assert!(collection.contains("x"));

    assert_eq!(collection.to_vec(), vec!["a", "m", "p", "x"]);
}

/// Test that a duplicate add is rejected and stores nothing
pub fn test_duplicate_add<C>()
where
    C: OrderedSet<String> + Default,
{
    let collection = C::default();

    assert!(collection.add("foo".to_string()));
    assert!(!collection.add("foo".to_string()));

    assert_eq!(collection.to_vec(), vec!["foo"]);
    assert_eq!(collection.len(), 1);
}

/// Test add, remove, add of the same key
pub fn test_remove_then_readd<C>()
where
    C: OrderedSet<String> + Default,
{
    let collection = C::default();

    assert!(collection.add("foo".to_string()));
    assert!(collection.remove("foo"));
    assert!(!collection.contains("foo"));
    assert!(collection.add("foo".to_string()));
    assert!(collection.contains("foo"));

    assert_eq!(collection.to_vec(), vec!["foo"]);
}

/// Test removing keys that are not there
pub fn test_remove_absent<C>()
where
    C: OrderedSet<String> + Default,
{
    let collection = C::default();

    // Empty
    assert!(!collection.remove("zzz"));
    assert!(collection.is_empty());

    // Non-containing, before, between and after existing keys
    collection.add("b".to_string());
    collection.add("d".to_string());

    assert!(!collection.remove("a"));
    assert!(!collection.remove("c"));
    assert!(!collection.remove("zzz"));

    assert_eq!(collection.to_vec(), vec!["b", "d"]);
}

/// Replays add foo, add bar, add hah, add foo, remove foo, add foo, remove bar
pub fn test_mixed_sequence<C>()
where
    C: OrderedSet<String> + Default,
{
    let collection = C::default();

    assert!(collection.add("foo".to_string()));
    assert!(collection.add("bar".to_string()));
    assert!(collection.add("hah".to_string()));
    assert!(!collection.add("foo".to_string()));
    assert!(collection.remove("foo"));
    assert!(collection.add("foo".to_string()));
    assert!(collection.remove("bar"));

    assert!(!collection.contains("bar"));
    assert_eq!(collection.to_vec(), vec!["foo", "hah"]);
}

/// Test sequential add and remove pattern
pub fn test_sequential_operations<C>()
where
    C: OrderedSet<String> + Default,
{
    let collection = C::default();

    // Insert in reverse to exercise head insertion
    for i in (0..100).rev() {
        assert!(collection.add(key(i)));
    }

    // Verify all exist
    for i in 0..100 {
        assert!(collection.contains(key(i).as_str()), "Missing key: {}", i);
    }

    // Remove even numbers
    for i in (0..100).step_by(2) {
        assert!(collection.remove(key(i).as_str()));
    }

    // Verify removed
    for i in (0..100).step_by(2) {
        assert!(!collection.contains(key(i).as_str()), "Should be removed: {}", i);
    }

    // Verify odd numbers still exist
    for i in (1..100).step_by(2) {
        assert!(collection.contains(key(i).as_str()), "Should still exist: {}", i);
    }

    assert_eq!(collection.len(), 50);
}

/// Test that live keys stay strictly ordered after arbitrary operations
pub fn test_ordering_invariant<C>()
where
    C: OrderedSet<String> + Default,
{
    let collection = C::default();

    // Scrambled insertion order
    for i in 0..200 {
        collection.add(key((i * 37) % 200));
    }
    for i in (0..200).filter(|i| i % 3 == 0) {
        collection.remove(key(i).as_str());
    }
    for i in (0..200).filter(|i| i % 6 == 0) {
        collection.add(key(i));
    }

    let keys = collection.to_vec();
    assert_strictly_ascending(&keys);

    let expected: Vec<String> = (0..200)
        .filter(|i| i % 3 != 0 || i % 6 == 0)
        .map(key)
        .collect();
    assert_eq!(keys, expected);
}

/// Test len and is_empty
pub fn test_len_operations<C>(collection: &C)
where
    C: OrderedSet<String>,
{
    assert_eq!(collection.len(), 0);
    assert!(collection.is_empty());

    collection.add("10".to_string());
    assert_eq!(collection.len(), 1);

    collection.add("20".to_string());
    assert_eq!(collection.len(), 2);

    collection.add("10".to_string()); // Duplicate
    assert_eq!(collection.len(), 2);

    collection.remove("10");
    assert_eq!(collection.len(), 1);

    collection.remove("20");
    assert_eq!(collection.len(), 0);

    collection.remove("30"); // Not found
    assert_eq!(collection.len(), 0);
    assert!(collection.is_empty());
}

/// Test a non-string key type
pub fn test_integer_keys<C>()
where
    C: OrderedSet<u64> + Default,
{
    let collection = C::default();

    for i in [50u64, 10, 40, 20, 30, 0, u64::MAX] {
        assert!(collection.add(i));
    }
    assert!(!collection.add(30));
    assert!(collection.remove(&0));
    assert!(collection.contains(&u64::MAX));

    assert_eq!(collection.to_vec(), vec![10, 20, 30, 40, 50, u64::MAX]);
}

/// Test that each key is reported as inserted exactly once across threads
pub fn test_concurrent_duplicate_add<C>()
where
    C: OrderedSet<String> + Default + Send + Sync + 'static,
{
    let collection = Arc::new(C::default());
    let num_threads = 8;
    let range = 200;

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let collection = Arc::clone(&collection);
            thread::spawn(move || (0..range).filter(|&i| collection.add(key(i))).count())
        })
        .collect();

    let inserted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    // Duplicates rejected: one successful add per key
    assert_eq!(inserted, range);
    assert_eq!(collection.len(), range);
    assert_strictly_ascending(&collection.to_vec());
}
