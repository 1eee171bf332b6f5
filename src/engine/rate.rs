use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::contact::Contact;

/// Recent contact counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QsoRate {
    pub last_15_minutes: usize,
    pub last_hour: usize,
}

/// Counts contacts at or after `now - window` for both windows. Contacts
/// stamped in the future count too.
pub fn qso_rate<'a>(contacts: impl IntoIterator<Item = &'a Contact>, now: DateTime<Utc>) -> QsoRate {
    let quarter = now - Duration::minutes(15);
    let hour = now - Duration::hours(1);
    let mut rate = QsoRate::default();
    for c in contacts {
        if c.timestamp >= quarter {
            rate.last_15_minutes += 1;
        }
        if c.timestamp >= hour {
            rate.last_hour += 1;
        }
    }
    rate
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::types::{Band, Mode};

    fn at(id: u64, minute: u32) -> Contact {
        Contact {
            id,
            callsign: "W1AW".to_string(),
            exchange_class: "1D".to_string(),
            exchange_section: "CT".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 6, 22, 18, minute, 0).unwrap(),
            frequency_hz: 0,
            band: Band::B40,
            mode: Mode::CW,
            power_watts: 5,
            grid: String::new(),
            operator_name: String::new(),
        }
    }

    #[test]
    fn windows_are_inclusive() {
        let log = vec![at(1, 0), at(2, 44), at(3, 45), at(4, 59)];
        let now = Utc.with_ymd_and_hms(2024, 6, 22, 19, 0, 0).unwrap();
        assert_eq!(
            qso_rate(&log, now),
            QsoRate { last_15_minutes: 2, last_hour: 4 }
        );
        let later = now + Duration::minutes(1);
        assert_eq!(qso_rate(&log, later).last_hour, 3);
    }
}
