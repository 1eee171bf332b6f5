use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::{
    contact::ContactDraft,
    types::{Band, Mode},
};

use super::{ProtocolError, TagMap};

/// Contest id a logged-ADIF packet must carry to become a contact.
pub const FIELD_DAY_CONTEST_ID: &str = "ARRL-FIELD-DAY";

/// Per-session inputs to contact assembly that the packet does not carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRules {
    /// Required `CONTEST_ID` value, compared case-insensitively.
    pub contest_id: String,
    /// Power logged for packet-sourced contacts.
    pub default_power: u32,
}

impl Default for IngestRules {
    fn default() -> Self {
        Self {
            contest_id: FIELD_DAY_CONTEST_ID.to_string(),
            default_power: 5,
        }
    }
}

/// Assembles a draft from logged-ADIF tags.
///
/// Returns `Ok(None)` when the packet belongs to another contest; that is a
/// silent ignore, not a failure. Missing or malformed required tags fail the
/// whole packet. The draft always has mode `DI` and may still need a grid or
/// name lookup.
pub fn contact_from_tags(
    tags: &TagMap,
    rules: &IngestRules,
) -> Result<Option<ContactDraft>, ProtocolError> {
    match tags.get("CONTEST_ID") {
        Some(id) if id.eq_ignore_ascii_case(&rules.contest_id) => {}
        _ => return Ok(None),
    }

    let callsign = tags.require("CALL")?;
    let timestamp = parse_timestamp(tags.require("QSO_DATE")?, tags.require("TIME_ON")?)?;
    let frequency_hz = parse_freq_mhz(tags.require("FREQ")?)?;
    let band = match tags.get("BAND") {
        Some(label) => Band::from_label(label).ok_or_else(|| ProtocolError::BadValue {
            tag: "BAND",
            value: label.to_string(),
        })?,
        None => Band::from_freq(frequency_hz).ok_or_else(|| ProtocolError::BadValue {
            tag: "FREQ",
            value: frequency_hz.to_string(),
        })?,
    };
    let (exchange_class, exchange_section) = split_exchange(tags.require("SRX_STRING")?)?;

    let draft = ContactDraft {
        callsign: callsign.to_string(),
        exchange_class,
        exchange_section,
        timestamp,
        frequency_hz,
        band,
        mode: Mode::DI,
        power_watts: rules.default_power,
        grid: tags.get("GRIDSQUARE").unwrap_or_default().to_string(),
        operator_name: tags.get("NAME").unwrap_or_default().to_string(),
    };
    Ok(Some(draft.normalized()))
}

/// `YYYYMMDD` plus `HHMMSS` or `HHMM`, interpreted as UTC.
fn parse_timestamp(date: &str, time: &str) -> Result<DateTime<Utc>, ProtocolError> {
    let day = NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| ProtocolError::BadValue {
        tag: "QSO_DATE",
        value: date.to_string(),
    })?;
    let fmt = if time.len() == 4 { "%H%M" } else { "%H%M%S" };
    let clock = NaiveTime::parse_from_str(time, fmt).map_err(|_| ProtocolError::BadValue {
        tag: "TIME_ON",
        value: time.to_string(),
    })?;
    Ok(day.and_time(clock).and_utc())
}

/// MHz decimal to whole hertz, rounded.
fn parse_freq_mhz(value: &str) -> Result<u64, ProtocolError> {
    let bad = || ProtocolError::BadValue {
        tag: "FREQ",
        value: value.to_string(),
    };
    let mhz: f64 = value.parse().map_err(|_| bad())?;
    if !mhz.is_finite() || mhz < 0.0 {
        return Err(bad());
    }
    Ok((mhz * 1_000_000.0).round() as u64)
}

/// `"<class> <section>"`, exactly two tokens separated by one space.
fn split_exchange(srx: &str) -> Result<(String, String), ProtocolError> {
    match srx.split(' ').collect::<Vec<_>>().as_slice() {
        [class, section] if !class.is_empty() && !section.is_empty() => {
            Ok((class.to_string(), section.to_string()))
        }
        _ => Err(ProtocolError::MalformedExchange(srx.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::packet::tags::parse_record;

    const LOGGED: &str = "<call:5>K1ABC <gridsquare:4>FN42 <mode:3>FT8 <rst_sent:3>-10 \
        <qso_date:8>20240622 <time_on:6>183015 <band:3>20m <freq:9>14.074512 \
        <contest_id:14>ARRL-FIELD-DAY <srx_string:5>3a ma <EOR>";

    fn rules() -> IngestRules {
        IngestRules {
            default_power: 100,
            ..IngestRules::default()
        }
    }

    #[test]
    fn assembles_draft_from_logged_packet() {
        let tags = parse_record(LOGGED).expect("tags");
        let draft = contact_from_tags(&tags, &rules()).expect("ok").expect("draft");
        assert_eq!(draft.callsign, "K1ABC");
        assert_eq!(draft.exchange_class, "3A");
        assert_eq!(draft.exchange_section, "MA");
        assert_eq!(
            draft.timestamp,
            Utc.with_ymd_and_hms(2024, 6, 22, 18, 30, 15).unwrap()
        );
        assert_eq!(draft.frequency_hz, 14_074_512);
        assert_eq!(draft.band, Band::B20);
        assert_eq!(draft.mode, Mode::DI);
        assert_eq!(draft.power_watts, 100);
        assert_eq!(draft.grid, "FN42");
        assert_eq!(draft.operator_name, "");
        assert!(draft.needs_lookup());
    }

    #[test]
    fn other_contests_are_ignored() {
        let text = LOGGED.replace("ARRL-FIELD-DAY", "CQ-WW-RTTY");
        let tags = parse_record(&text).expect("tags");
        assert_eq!(contact_from_tags(&tags, &rules()), Ok(None));

        let mut no_id = parse_record(LOGGED).expect("tags");
        no_id = TagMap::from_iter(no_id.iter().filter(|(k, _)| *k != "CONTEST_ID"));
        assert_eq!(contact_from_tags(&no_id, &rules()), Ok(None));
    }

    #[test]
    fn malformed_exchange_drops_packet() {
        for srx in ["3A", "3A  MA", "3A MA X", " 3A"] {
            let text = LOGGED.replace("<srx_string:5>3a ma", &format!("<srx_string:{}>{srx}", srx.len()));
            let tags = parse_record(&text).expect("tags");
            assert!(
                matches!(contact_from_tags(&tags, &rules()), Err(ProtocolError::MalformedExchange(_))),
                "{srx:?}"
            );
        }
    }

    #[test]
    fn missing_required_tag_drops_packet() {
        let text = LOGGED.replace("<freq:9>14.074512 ", "");
        let tags = parse_record(&text).expect("tags");
        assert_eq!(
            contact_from_tags(&tags, &rules()),
            Err(ProtocolError::MissingTag("FREQ"))
        );
    }

    #[test]
    fn band_falls_back_to_frequency_and_short_time_is_accepted() {
        let text = LOGGED
            .replace("<band:3>20m ", "")
            .replace("<time_on:6>183015", "<time_on:4>1830");
        let tags = parse_record(&text).expect("tags");
        let draft = contact_from_tags(&tags, &rules()).expect("ok").expect("draft");
        assert_eq!(draft.band, Band::B20);
        assert_eq!(
            draft.timestamp,
            Utc.with_ymd_and_hms(2024, 6, 22, 18, 30, 0).unwrap()
        );
    }
}
