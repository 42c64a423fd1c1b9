//! Error handling for the cache indirection layer
//!
//! Every error carries a [`RecoveryHint`] describing what an operator or
//! caller can do about it. Nothing in this crate retries on its own.

mod conversions;
mod display;
mod recovery;
mod types;

pub use types::*;
