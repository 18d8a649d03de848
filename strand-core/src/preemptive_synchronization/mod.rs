pub mod spin_lock;

pub use spin_lock::{RawSpinLock, SpinMutex, SpinMutexGuard, TasLock, TtasLock};
