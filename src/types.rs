//! Shared primitive IDs and contest-related enums.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Monotonic contact identifier. Never reused, even after deletion.
pub type ContactId = u64;
/// Monotonic operation sequence number.
pub type OpSeq = u64;

/// Contest band, in the fixed order the log reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Band {
    /// 160 meters.
    #[serde(rename = "160")]
    B160,
    /// 80 meters.
    #[serde(rename = "80")]
    B80,
    /// 60 meters.
    #[serde(rename = "60")]
    B60,
    /// 40 meters.
    #[serde(rename = "40")]
    B40,
    /// 20 meters.
    #[serde(rename = "20")]
    B20,
    /// 15 meters.
    #[serde(rename = "15")]
    B15,
    /// 10 meters.
    #[serde(rename = "10")]
    B10,
    /// 6 meters.
    #[serde(rename = "6")]
    B6,
    /// 2 meters.
    #[serde(rename = "2")]
    B2,
}

impl Band {
    /// Every band in reporting order.
    pub const ALL: [Band; 9] = [
        Band::B160,
        Band::B80,
        Band::B60,
        Band::B40,
        Band::B20,
        Band::B15,
        Band::B10,
        Band::B6,
        Band::B2,
    ];

    /// Band label in meters without the unit suffix, e.g. `"40"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Band::B160 => "160",
            Band::B80 => "80",
            Band::B60 => "60",
            Band::B40 => "40",
            Band::B20 => "20",
            Band::B15 => "15",
            Band::B10 => "10",
            Band::B6 => "6",
            Band::B2 => "2",
        }
    }

    /// Maps a frequency in hertz to its band, if it falls inside one.
    pub fn from_freq(hz: u64) -> Option<Band> {
        let band = match hz {
            1_800_000..=2_000_000 => Band::B160,
            3_500_000..=4_000_000 => Band::B80,
            5_330_000..=5_406_000 => Band::B60,
            7_000_000..=7_300_000 => Band::B40,
            14_000_000..=14_350_000 => Band::B20,
            21_000_000..=21_450_000 => Band::B15,
            28_000_000..=29_700_000 => Band::B10,
            50_000_000..=54_000_000 => Band::B6,
            144_000_000..=148_000_000 => Band::B2,
            _ => return None,
        };
        Some(band)
    }

    /// Parses `"20"`, `"20m"` or `"20M"`.
    pub fn from_label(label: &str) -> Option<Band> {
        let trimmed = label.trim();
        let meters = trimmed
            .strip_suffix('M')
            .or_else(|| trimmed.strip_suffix('m'))
            .unwrap_or(trimmed);
        Band::ALL.into_iter().find(|b| b.as_str() == meters)
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Band {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Band::from_label(s).ok_or_else(|| format!("unknown band: {s}"))
    }
}

/// Normalized emission mode. `DI` covers every digital sub-mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mode {
    /// Continuous wave.
    CW,
    /// Phone (SSB, FM, AM).
    PH,
    /// Any digital mode.
    DI,
}

impl Mode {
    /// Every mode in tally order.
    pub const ALL: [Mode; 3] = [Mode::CW, Mode::DI, Mode::PH];

    /// Two-letter log label.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::CW => "CW",
            Mode::PH => "PH",
            Mode::DI => "DI",
        }
    }

    /// Normalizes a mode string as reported by a rig.
    pub fn from_rig_mode(rig_mode: &str) -> Mode {
        match rig_mode.trim().to_ascii_uppercase().as_str() {
            "CW" | "CWR" => Mode::CW,
            "USB" | "LSB" | "FM" | "AM" => Mode::PH,
            _ => Mode::DI,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CW" => Ok(Mode::CW),
            "PH" => Ok(Mode::PH),
            "DI" => Ok(Mode::DI),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_from_freq_edges() {
        assert_eq!(Band::from_freq(7_074_000), Some(Band::B40));
        assert_eq!(Band::from_freq(14_250_000), Some(Band::B20));
        assert_eq!(Band::from_freq(144_174_000), Some(Band::B2));
        assert_eq!(Band::from_freq(10_136_000), None);
        assert_eq!(Band::from_freq(0), None);
    }

    #[test]
    fn band_labels_parse_with_or_without_suffix() {
        assert_eq!(Band::from_label("20M"), Some(Band::B20));
        assert_eq!(Band::from_label("160m"), Some(Band::B160));
        assert_eq!(Band::from_label("6"), Some(Band::B6));
        assert_eq!(Band::from_label("30M"), None);
    }

    #[test]
    fn rig_modes_normalize() {
        assert_eq!(Mode::from_rig_mode("CWR"), Mode::CW);
        assert_eq!(Mode::from_rig_mode("lsb"), Mode::PH);
        assert_eq!(Mode::from_rig_mode("FM"), Mode::PH);
        assert_eq!(Mode::from_rig_mode("PKTUSB"), Mode::DI);
        assert_eq!(Mode::from_rig_mode("FT8"), Mode::DI);
    }

    #[test]
    fn serde_uses_labels() {
        assert_eq!(serde_json::to_string(&Band::B40).expect("ser"), "\"40\"");
        assert_eq!(serde_json::to_string(&Mode::DI).expect("ser"), "\"DI\"");
        let b: Band = serde_json::from_str("\"2\"").expect("de");
        assert_eq!(b, Band::B2);
    }
}
