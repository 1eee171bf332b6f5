//! In-memory authoritative store and derived index views.

/// Dupe and worked-section views plus index aliases.
pub mod indices;
/// Authoritative contact store.
pub mod store;
