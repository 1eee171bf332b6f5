//! Mutation operation model and persistence wrappers.

use serde::{Deserialize, Serialize};

use crate::{
    contact::Contact,
    types::{ContactId, OpSeq},
};

/// Version number for serialized [`StoredOpEnvelope`] payloads.
pub const OP_FORMAT_VERSION: u16 = 1;

/// Immutable operation appended to the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    /// Insert a fully materialized contact.
    Insert {
        /// Inserted record.
        contact: Contact,
    },
    /// Replace every field of an existing contact.
    Update {
        /// Replacement record; its id names the target.
        contact: Contact,
    },
    /// Remove a contact by id.
    Delete {
        /// Contact id to remove.
        id: ContactId,
    },
}

impl Op {
    /// Contact targeted by this op.
    pub fn contact_id(&self) -> ContactId {
        match self {
            Op::Insert { contact } | Op::Update { contact } => contact.id,
            Op::Delete { id } => *id,
        }
    }
}

/// Journal row metadata plus operation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOp {
    /// Monotonic operation sequence.
    pub seq: OpSeq,
    /// Operation timestamp in milliseconds.
    pub ts_ms: u64,
    /// Operation body.
    pub op: Op,
}

/// Versioned wrapper for stable on-disk payload decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOpEnvelope {
    /// Payload format version.
    pub format_version: u16,
    /// Wrapped operation.
    pub stored: StoredOp,
}

impl StoredOpEnvelope {
    /// Constructs an envelope using [`OP_FORMAT_VERSION`].
    pub fn new(stored: StoredOp) -> Self {
        Self {
            format_version: OP_FORMAT_VERSION,
            stored,
        }
    }
}
