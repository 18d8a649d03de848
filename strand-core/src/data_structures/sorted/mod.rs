//! Lock-free sorted collections.

pub mod ordered_list;

pub use ordered_list::{Iter, OrderedList};
