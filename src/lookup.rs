//! Callsign lookup collaborator contract.
//!
//! The log never manages lookup networking. It only consumes a result, and
//! a non-empty `error` means "no data".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What a lookup service knows about a callsign.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResult {
    pub grid: String,
    pub name: String,
    pub nickname: String,
    /// Service error text; empty on success.
    pub error: String,
}

impl LookupResult {
    /// `(grid, name)` when the lookup succeeded.
    pub fn usable(self) -> Option<(String, String)> {
        self.error.is_empty().then_some((self.grid, self.name))
    }
}

#[async_trait]
pub trait CallsignLookup: Send + Sync {
    async fn lookup(&self, callsign: &str) -> LookupResult;
}

/// Lookup backed by a fixed table, for tests and offline operation.
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    entries: hashbrown::HashMap<String, LookupResult>,
}

impl StaticLookup {
    pub fn with(mut self, callsign: &str, grid: &str, name: &str) -> Self {
        self.entries.insert(
            callsign.to_ascii_uppercase(),
            LookupResult {
                grid: grid.to_string(),
                name: name.to_string(),
                ..LookupResult::default()
            },
        );
        self
    }
}

#[async_trait]
impl CallsignLookup for StaticLookup {
    async fn lookup(&self, callsign: &str) -> LookupResult {
        self.entries
            .get(callsign.trim().to_ascii_uppercase().as_str())
            .cloned()
            .unwrap_or_else(|| LookupResult {
                error: format!("{callsign} not found"),
                ..LookupResult::default()
            })
    }
}
