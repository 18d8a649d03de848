//! Crossbeam-based reclamation for strand collections.
//!
//! This crate provides `EpochGuard`, an implementation of the `Guard` trait
//! using crossbeam-epoch, and the production alias `EpochOrderedList`.
//!
//! # Usage
//!
//! ```
//! use strand_crossbeam::EpochOrderedList;
//!
//! let list: EpochOrderedList<String> = EpochOrderedList::new();
//! assert!(list.add("foo".to_string()));
//! assert!(list.contains("foo"));
//! assert!(list.remove("foo"));
//! ```
//!
//! Retired keys are dropped by the global collector, possibly after the list
//! and on another thread, so keys must be `Send + 'static`:
//!
//! ```compile_fail
//! use strand_crossbeam::EpochOrderedList;
//!
//! let owner = vec!["a".to_string(), "b".to_string()];
//! let list: EpochOrderedList<&str> = EpochOrderedList::new();
//! for key in &owner {
//!     list.add(key.as_str());
//! }
//! ```

pub mod epoch_guard;

pub use epoch_guard::EpochGuard;

/// Ordered list whose unlinked nodes are reclaimed by crossbeam-epoch.
pub type EpochOrderedList<K> = strand_core::OrderedList<K, EpochGuard>;
