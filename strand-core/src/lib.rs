pub mod common_tests;
pub mod data_structures;
pub mod guard;
pub mod preemptive_synchronization;

// Re-export the main types for convenience
pub use data_structures::{OrderedList, OrderedSet};
pub use guard::{DeferredGuard, Guard};
pub use preemptive_synchronization::{RawSpinLock, SpinMutex, TasLock, TtasLock};

/*

cargo llvm-cov --html

sudo CARGO_PROFILE_RELEASE_DEBUG=true cargo flamegraph --bench lock_benchmark --root --

*/
