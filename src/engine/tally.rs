use std::fmt::Write as _;

use hashbrown::HashMap;

use crate::{
    contact::Contact,
    types::{Band, Mode},
};

/// Count and highest power for one band/mode cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeTally {
    pub count: usize,
    pub max_power: u32,
}

/// One band's tally, columns in [`Mode::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandTally {
    pub band: Band,
    pub modes: [ModeTally; 3],
}

impl BandTally {
    pub fn mode(&self, mode: Mode) -> ModeTally {
        Mode::ALL
            .iter()
            .position(|m| *m == mode)
            .map(|i| self.modes[i])
            .unwrap_or_default()
    }
}

/// Per-band tally for bands with at least one contact, in band order.
pub fn band_mode_tally<'a>(contacts: impl IntoIterator<Item = &'a Contact>) -> Vec<BandTally> {
    let mut cells: HashMap<(Band, Mode), ModeTally> = HashMap::new();
    for c in contacts {
        let cell = cells.entry((c.band, c.mode)).or_default();
        cell.count += 1;
        cell.max_power = cell.max_power.max(c.power_watts);
    }

    Band::ALL
        .into_iter()
        .filter(|band| Mode::ALL.iter().any(|mode| cells.contains_key(&(*band, *mode))))
        .map(|band| BandTally {
            band,
            modes: Mode::ALL.map(|mode| cells.get(&(band, mode)).copied().unwrap_or_default()),
        })
        .collect()
}

const RULE_WIDTH: usize = 60;

/// Renders the tally as the tab-separated statistics sheet, CRLF lines.
pub fn render_statistics(tally: &[BandTally]) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    let mut out = String::new();
    out.push_str("\t\tCW\tPWR\tDI\tPWR\tPH\tPWR\r\n");
    out.push_str(&rule);
    out.push_str("\r\n");
    for row in tally {
        let _ = write!(out, "Band:\t{}", row.band);
        for cell in &row.modes {
            let _ = write!(out, "\t{}\t{}", cell.count, cell.max_power);
        }
        out.push_str("\r\n");
        out.push_str(&rule);
        out.push_str("\r\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn contact(id: u64, band: Band, mode: Mode, power: u32) -> Contact {
        Contact {
            id,
            callsign: "W1AW".to_string(),
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
    fn tally_counts_and_keeps_max_power() {
        let log = vec![
            contact(1, Band::B20, Mode::PH, 100),
            contact(2, Band::B40, Mode::CW, 5),
            contact(3, Band::B40, Mode::CW, 20),
            contact(4, Band::B40, Mode::DI, 10),
        ];
        let tally = band_mode_tally(&log);
        assert_eq!(tally.len(), 2);
        assert_eq!(tally[0].band, Band::B40);
        assert_eq!(tally[0].mode(Mode::CW), ModeTally { count: 2, max_power: 20 });
        assert_eq!(tally[0].mode(Mode::PH), ModeTally::default());
        assert_eq!(tally[1].band, Band::B20);
        assert_eq!(tally[1].mode(Mode::PH).count, 1);
    }

    #[test]
    fn statistics_layout() {
        let log = vec![contact(1, Band::B40, Mode::CW, 5), contact(2, Band::B40, Mode::PH, 100)];
        let text = render_statistics(&band_mode_tally(&log));
        let rule = "-".repeat(60);
        let expected = format!(
            "\t\tCW\tPWR\tDI\tPWR\tPH\tPWR\r\n{rule}\r\nBand:\t40\t1\t5\t0\t0\t1\t100\r\n{rule}\r\n"
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn empty_log_renders_header_only() {
        let text = render_statistics(&band_mode_tally(std::iter::empty()));
        assert_eq!(text.lines().count(), 2);
    }
}
