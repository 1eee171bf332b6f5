//! Super check partial: known active callsigns matched against a partial
//! entry.
//!
//! The list is a plain text file, one callsign per line. Lines starting
//! with `#` are comments.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Default list file name.
pub const SCP_FILE: &str = "MASTER.SCP";

/// Entries this short or shorter match too much to be useful.
const MIN_PARTIAL: usize = 2;

#[derive(Debug, thiserror::Error)]
#[error("failed to read {path}: {source}")]
pub struct ScpError {
    path: PathBuf,
    #[source]
    source: io::Error,
}

/// Known callsigns in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuperCheck {
    calls: Vec<String>,
}

impl SuperCheck {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScpError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ScpError {
            path: path.to_path_buf(),
            source,
        })?;
        let scp = Self::parse(&text);
        tracing::debug!(path = %path.display(), calls = scp.len(), "loaded super check list");
        Ok(scp)
    }

    pub fn parse(text: &str) -> Self {
        let calls = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_ascii_uppercase)
            .collect();
        Self { calls }
    }

    /// Calls starting with `partial`, once it is longer than two characters.
    pub fn matches(&self, partial: &str) -> Vec<&str> {
        let partial = partial.trim().to_ascii_uppercase();
        if partial.len() <= MIN_PARTIAL {
            return Vec::new();
        }
        self.calls
            .iter()
            .filter(|call| call.starts_with(partial.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}
