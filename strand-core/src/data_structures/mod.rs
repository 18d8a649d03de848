//! Data structures for concurrent collections.
//!
//! # Organization
//!
//! - [`sorted`] - Lock-free sorted collections (OrderedList)
//! - [`internal`] - Internal implementation details (pub(crate))

// Submodules
pub(crate) mod internal;
pub mod sorted;

// Top-level public modules
pub mod ordered_set;

// Re-exports for convenience
pub use ordered_set::OrderedSet;
pub use sorted::OrderedList;

// MarkedPtr stays pub(crate) - truly internal implementation detail
pub(crate) use internal::MarkedPtr;
