//! Runtime event stream payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    engine::Score,
    types::{Band, ContactId, Mode, OpSeq},
};

/// Transient warning that the station selected in the digital-mode client
/// was already worked on the current band and mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DupeNotice {
    pub call: String,
    pub band: Band,
    pub mode: Mode,
}

impl fmt::Display for DupeNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}M {} dupe!", self.call, self.band, self.mode)
    }
}

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    /// A new contact was stored.
    Inserted {
        /// Assigned id.
        id: ContactId,
    },
    /// A contact was replaced by an edit.
    Updated {
        /// Edited contact id.
        id: ContactId,
    },
    /// A contact was deleted.
    Deleted {
        /// Deleted contact id.
        id: ContactId,
    },
    /// The claimed score differs from the last one broadcast.
    ScoreChanged {
        /// New score.
        score: Score,
    },
    /// A status report named a station that would be a dupe.
    PossibleDupe {
        /// The notice now pending.
        notice: DupeNotice,
    },
    /// Persistence has reached at least this op sequence.
    DurableUpTo {
        /// Highest sequence known durable.
        op_seq: OpSeq,
    },
    /// A journal write failed. Memory reflects only what was durable in
    /// [`AckMode::Durable`](super::handle::AckMode::Durable).
    PersistFailed {
        /// Sink error text.
        message: String,
    },
}
