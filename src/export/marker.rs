//! xplanet marker file: one `lat lon ""` line per distinct worked grid.

use std::fmt::Write as _;

use hashbrown::HashSet;

use crate::{contact::Contact, geo};

/// Marker file name inside the export directory.
pub const MARKER_FILE: &str = "xplanet-markers.txt";

const LAST_COLOR: &str = "color=Orange";

/// Renders the marker list. Grids are taken in contact order, first
/// occurrence wins; grids that do not decode are skipped. The last marker is
/// highlighted.
pub fn write_markers<'a>(contacts: impl IntoIterator<Item = &'a Contact>) -> String {
    let mut seen = HashSet::new();
    let mut points = Vec::new();
    for c in contacts {
        let grid = c.grid.trim().to_ascii_uppercase();
        if grid.len() < 2 || !seen.insert(grid.clone()) {
            continue;
        }
        if let Some(point) = geo::decode(&grid) {
            points.push(point);
        }
    }

    let mut out = String::new();
    let last = points.len().saturating_sub(1);
    for (i, (lat, lon)) in points.into_iter().enumerate() {
        let color = if i == last { LAST_COLOR } else { "" };
        let _ = write!(out, "{lat:?} {lon:?} \"\" {color}\r\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::types::{Band, Mode};

    fn contact(id: u64, grid: &str) -> Contact {
        Contact {
            id,
            callsign: "W1AW".to_string(),
            exchange_class: "2A".to_string(),
            exchange_section: "CT".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 6, 22, 18, 5, 0).unwrap(),
            frequency_hz: 0,
            band: Band::B20,
            mode: Mode::DI,
            power_watts: 5,
            grid: grid.to_string(),
            operator_name: String::new(),
        }
    }

    #[test]
    fn distinct_grids_with_last_highlighted() {
        let log = [
            contact(1, "FN31"),
            contact(2, ""),
            contact(3, "fn31"),
            contact(4, "CM87"),
            contact(5, "ZZ00"),
        ];
        assert_eq!(
            write_markers(&log),
            "41.0 -74.0 \"\" \r\n37.0 -124.0 \"\" color=Orange\r\n"
        );
    }

    #[test]
    fn no_grids_no_markers() {
        assert_eq!(write_markers(&[contact(1, ""), contact(2, "F")]), "");
    }
}
