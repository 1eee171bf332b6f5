use std::fmt;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::{config::PowerThresholds, contact::Contact, types::Mode};

/// Entry power category reported in the Cabrillo header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerCategory {
    Qrp,
    Low,
    High,
}

impl PowerCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            PowerCategory::Qrp => "QRP",
            PowerCategory::Low => "LOW",
            PowerCategory::High => "HIGH",
        }
    }
}

impl fmt::Display for PowerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claimed score for a contact snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub cw_count: usize,
    pub phone_count: usize,
    pub digital_count: usize,
    /// Distinct `(band, mode)` pairs worked.
    pub band_mode_mults: usize,
    /// No contact exceeded its mode's QRP ceiling.
    pub qrp: bool,
    /// At least one contact exceeded the high-power limit.
    pub highpower: bool,
    pub basic_score: u64,
    pub multiplier: u64,
    pub final_score: u64,
    pub power_category: PowerCategory,
}

impl Default for Score {
    fn default() -> Self {
        compute_score(std::iter::empty(), &PowerThresholds::default())
    }
}

/// Scores a contact snapshot.
///
/// `qrp` and `highpower` are evaluated independently over every contact;
/// the multiplier then checks `qrp` first. An empty log is QRP.
pub fn compute_score<'a>(
    contacts: impl IntoIterator<Item = &'a Contact>,
    thresholds: &PowerThresholds,
) -> Score {
    let mut cw_count = 0;
    let mut phone_count = 0;
    let mut digital_count = 0;
    let mut over_qrp = false;
    let mut highpower = false;
    let mut pairs = HashSet::new();

    for c in contacts {
        match c.mode {
            Mode::CW => cw_count += 1,
            Mode::PH => phone_count += 1,
            Mode::DI => digital_count += 1,
        }
        if c.power_watts > thresholds.qrp_ceiling(c.mode) {
            over_qrp = true;
        }
        if c.power_watts > thresholds.high_power_watts {
            highpower = true;
        }
        pairs.insert((c.band, c.mode));
    }

    let qrp = !over_qrp;
    let basic_score = (cw_count * 2 + phone_count + digital_count * 2) as u64;
    let (multiplier, power_category) = if qrp {
        (5, PowerCategory::Qrp)
    } else if !highpower {
        (2, PowerCategory::Low)
    } else {
        (1, PowerCategory::High)
    };

    Score {
        cw_count,
        phone_count,
        digital_count,
        band_mode_mults: pairs.len(),
        qrp,
        highpower,
        basic_score,
        multiplier,
        final_score: basic_score * multiplier,
        power_category,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::types::Band;

    fn contact(id: u64, band: Band, mode: Mode, power: u32) -> Contact {
        Contact {
            id,
            callsign: format!("K{id}ABC"),
            exchange_class: "1D".to_string(),
            exchange_section: "CT".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 6, 22, 18, 0, 0).unwrap(),
            frequency_hz: 0,
            band,
            mode,
            power_watts: power,
            grid: String::new(),
            operator_name: String::new(),
        }
    }

    #[test]
    fn qrp_log_gets_five_times() {
        let log = vec![
            contact(1, Band::B40, Mode::CW, 5),
            contact(2, Band::B40, Mode::CW, 5),
            contact(3, Band::B20, Mode::CW, 5),
            contact(4, Band::B20, Mode::PH, 10),
            contact(5, Band::B20, Mode::PH, 10),
            contact(6, Band::B20, Mode::DI, 10),
        ];
        let score = compute_score(&log, &PowerThresholds::default());
        assert_eq!(score.basic_score, 10);
        assert!(score.qrp);
        assert!(!score.highpower);
        assert_eq!(score.multiplier, 5);
        assert_eq!(score.final_score, 50);
        assert_eq!(score.band_mode_mults, 4);
        assert_eq!(score.power_category, PowerCategory::Qrp);
    }

    #[test]
    fn cw_above_five_watts_is_not_qrp() {
        let log = vec![
            contact(1, Band::B40, Mode::CW, 6),
            contact(2, Band::B40, Mode::PH, 10),
        ];
        let score = compute_score(&log, &PowerThresholds::default());
        assert!(!score.qrp);
        assert!(!score.highpower);
        assert_eq!(score.multiplier, 2);
        assert_eq!(score.final_score, 6);
        assert_eq!(score.power_category, PowerCategory::Low);
    }

    #[test]
    fn any_contact_over_limit_is_high_power() {
        let log = vec![
            contact(1, Band::B40, Mode::CW, 100),
            contact(2, Band::B20, Mode::DI, 150),
        ];
        let score = compute_score(&log, &PowerThresholds::default());
        assert!(score.highpower);
        assert_eq!(score.multiplier, 1);
        assert_eq!(score.final_score, 4);
        assert_eq!(score.power_category.to_string(), "HIGH");
    }

    #[test]
    fn empty_log_scores_zero() {
        let score = Score::default();
        assert_eq!(score.final_score, 0);
        assert!(score.qrp);
        assert_eq!(score.band_mode_mults, 0);
    }

    #[test]
    fn custom_thresholds_are_honored() {
        let log = vec![contact(1, Band::B40, Mode::CW, 20)];
        let thresholds = PowerThresholds {
            cw_qrp_watts: 25,
            ..PowerThresholds::default()
        };
        assert!(compute_score(&log, &thresholds).qrp);
    }
}
