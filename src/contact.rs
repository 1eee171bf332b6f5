//! Contact record, draft, patch, and field validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    core::indices::DupeKey,
    types::{Band, ContactId, Mode},
};

/// Rejection reasons for a contact that would violate the log's field rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Callsign is blank.
    #[error("callsign is empty")]
    EmptyCallsign,
    /// Callsign holds something other than letters, digits and `/`.
    #[error("invalid callsign: {0}")]
    InvalidCallsign(String),
    /// Exchange class is blank.
    #[error("exchange class is empty")]
    EmptyClass,
    /// Exchange class is not alphanumeric.
    #[error("invalid exchange class: {0}")]
    InvalidClass(String),
    /// Exchange section is blank.
    #[error("exchange section is empty")]
    EmptySection,
    /// Exchange section is not alphabetic.
    #[error("invalid exchange section: {0}")]
    InvalidSection(String),
    /// Transmit power must be at least one watt.
    #[error("power must be positive")]
    ZeroPower,
}

/// Stored contact. Only replaced wholesale through an explicit edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Store-assigned identifier.
    pub id: ContactId,
    /// Worked station.
    pub callsign: String,
    /// Received class, e.g. `2A`.
    pub exchange_class: String,
    /// Received section, e.g. `EMA`.
    pub exchange_section: String,
    /// Contact time, second precision.
    pub timestamp: DateTime<Utc>,
    /// Dial frequency in hertz, `0` when unknown.
    pub frequency_hz: u64,
    /// Band.
    pub band: Band,
    /// Normalized mode.
    pub mode: Mode,
    /// Transmit power in watts.
    pub power_watts: u32,
    /// Maidenhead locator of the worked station, empty when unknown.
    pub grid: String,
    /// Operator name, empty when unknown.
    pub operator_name: String,
}

impl Contact {
    pub(crate) fn from_draft(id: ContactId, draft: ContactDraft) -> Self {
        Self {
            id,
            callsign: draft.callsign,
            exchange_class: draft.exchange_class,
            exchange_section: draft.exchange_section,
            timestamp: draft.timestamp,
            frequency_hz: draft.frequency_hz,
            band: draft.band,
            mode: draft.mode,
            power_watts: draft.power_watts,
            grid: draft.grid,
            operator_name: draft.operator_name,
        }
    }

    /// Key used for duplicate detection.
    pub fn dupe_key(&self) -> DupeKey {
        DupeKey::new(&self.callsign, self.band, self.mode)
    }

    /// Re-checks field rules on an already materialized record.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(
            &self.callsign,
            &self.exchange_class,
            &self.exchange_section,
            self.power_watts,
        )
    }
}

/// Everything needed to log a contact except its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDraft {
    /// Worked station.
    pub callsign: String,
    /// Received class.
    pub exchange_class: String,
    /// Received section.
    pub exchange_section: String,
    /// Contact time.
    pub timestamp: DateTime<Utc>,
    /// Dial frequency in hertz, `0` when unknown.
    pub frequency_hz: u64,
    /// Band.
    pub band: Band,
    /// Normalized mode.
    pub mode: Mode,
    /// Transmit power in watts.
    pub power_watts: u32,
    /// Maidenhead locator, empty when unknown.
    pub grid: String,
    /// Operator name, empty when unknown.
    pub operator_name: String,
}

impl ContactDraft {
    /// Trims every text field and upper-cases callsign, exchange and grid.
    /// Grid and name are reduced to printable ASCII.
    pub fn normalized(mut self) -> Self {
        self.callsign = self.callsign.trim().to_ascii_uppercase();
        self.exchange_class = self.exchange_class.trim().to_ascii_uppercase();
        self.exchange_section = self.exchange_section.trim().to_ascii_uppercase();
        self.grid = normalize_grid(&self.grid);
        self.operator_name = ascii_text(&self.operator_name);
        self
    }

    /// Checks the field rules a stored contact must satisfy.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(
            &self.callsign,
            &self.exchange_class,
            &self.exchange_section,
            self.power_watts,
        )
    }

    /// True when either location field still needs a lookup.
    pub fn needs_lookup(&self) -> bool {
        self.grid.is_empty() || self.operator_name.is_empty()
    }
}

/// Printable ASCII only, trimmed. Export files are ASCII.
pub(crate) fn ascii_text(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect::<String>()
        .trim()
        .to_string()
}

fn normalize_grid(grid: &str) -> String {
    ascii_text(grid).to_ascii_uppercase()
}

fn validate_fields(
    callsign: &str,
    class: &str,
    section: &str,
    power_watts: u32,
) -> Result<(), ValidationError> {
    if callsign.is_empty() {
        return Err(ValidationError::EmptyCallsign);
    }
    if !callsign
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '/')
    {
        return Err(ValidationError::InvalidCallsign(callsign.to_string()));
    }
    if class.is_empty() {
        return Err(ValidationError::EmptyClass);
    }
    if !class
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(ValidationError::InvalidClass(class.to_string()));
    }
    if section.is_empty() {
        return Err(ValidationError::EmptySection);
    }
    if !section.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidSection(section.to_string()));
    }
    if power_watts == 0 {
        return Err(ValidationError::ZeroPower);
    }
    Ok(())
}

/// Sparse edit where each `Some` field overwrites the record value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactPatch {
    /// Replacement callsign.
    pub callsign: Option<String>,
    /// Replacement class.
    pub exchange_class: Option<String>,
    /// Replacement section.
    pub exchange_section: Option<String>,
    /// Replacement timestamp.
    pub timestamp: Option<DateTime<Utc>>,
    /// Replacement frequency.
    pub frequency_hz: Option<u64>,
    /// Replacement band.
    pub band: Option<Band>,
    /// Replacement mode.
    pub mode: Option<Mode>,
    /// Replacement power.
    pub power_watts: Option<u32>,
    /// Replacement grid.
    pub grid: Option<String>,
    /// Replacement operator name.
    pub operator_name: Option<String>,
}

impl ContactPatch {
    /// Returns true when no fields are set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies this patch in place, normalizing text the same way drafts are.
    pub fn apply_to(&self, rec: &mut Contact) {
        if let Some(v) = &self.callsign {
            rec.callsign = v.trim().to_ascii_uppercase();
        }
        if let Some(v) = &self.exchange_class {
            rec.exchange_class = v.trim().to_ascii_uppercase();
        }
        if let Some(v) = &self.exchange_section {
            rec.exchange_section = v.trim().to_ascii_uppercase();
        }
        if let Some(v) = self.timestamp {
            rec.timestamp = v;
        }
        if let Some(v) = self.frequency_hz {
            rec.frequency_hz = v;
        }
        if let Some(v) = self.band {
            rec.band = v;
        }
        if let Some(v) = self.mode {
            rec.mode = v;
        }
        if let Some(v) = self.power_watts {
            rec.power_watts = v;
        }
        if let Some(v) = &self.grid {
            rec.grid = normalize_grid(v);
        }
        if let Some(v) = &self.operator_name {
            rec.operator_name = ascii_text(v);
        }
    }
}
