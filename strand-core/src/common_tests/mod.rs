//! Generic test suites shared by the integration tests of every crate.
//!
//! Each suite is parameterized over a trait (`OrderedSet`, `RawSpinLock`) so
//! the same assertions run against every guard and lock implementation.

pub mod ordered_set_core_tests;
