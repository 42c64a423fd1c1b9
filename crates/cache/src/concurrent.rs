//! Synchronization primitives shared by cache operations

mod key_lock;

pub use key_lock::{KeyLock, KeyLockGuard, LockHandle};
