//! Single-writer async runtime and event stream APIs.
//!
//! Every mutation from every source (packet ingestion, manual entry, edits)
//! is serialized through one task that owns the [`ContactStore`] and its
//! derived views. Callers hold a cloneable [`LogHandle`].
//!
//! [`ContactStore`]: crate::core::store::ContactStore

/// Event stream types emitted by the runtime.
pub mod events;
/// Handle and command loop implementation.
pub mod handle;

pub use events::{DupeNotice, LogEvent};
pub use handle::{AckMode, LogHandle, RuntimeConfig, RuntimeError, spawn_fdlog};
