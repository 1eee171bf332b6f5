//! ADIF text generation and re-reading.

use std::fmt::Write as _;

use crate::{
    config::Preferences,
    contact::{Contact, ascii_text},
    packet::{
        ProtocolError,
        ingest::FIELD_DAY_CONTEST_ID,
        tags::{TagMap, Token, Tokens},
    },
    sections::SectionCatalog,
    types::Mode,
};

use super::freq::{effective_khz, format_mhz};

/// Fixed export file name.
pub const ADIF_FILE: &str = "FieldDay.adi";

const ADIF_VERSION: &str = "2.2.0";
const COMMENT: &str = "ARRL-FD";

struct Field {
    name: &'static str,
    data_type: Option<&'static str>,
    value: String,
}

impl Field {
    fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            data_type: None,
            value: value.into(),
        }
    }

    /// Free text from the packet or a lookup; only printable ASCII is kept so
    /// the length header counts characters.
    fn text(name: &'static str, value: &str) -> Self {
        Self::new(name, ascii_text(value))
    }

    fn write_to(&self, out: &mut String) {
        let _ = match self.data_type {
            Some(t) => write!(out, "<{}:{}:{}>{}", self.name, self.value.len(), t, self.value),
            None => write!(out, "<{}:{}>{}", self.name, self.value.len(), self.value),
        };
    }
}

fn adif_mode(mode: Mode) -> &'static str {
    match mode {
        Mode::CW => "CW",
        Mode::PH => "SSB",
        Mode::DI => "FT8",
    }
}

/// Signal report sent and received.
pub(crate) fn rst(mode: Mode) -> &'static str {
    match mode {
        Mode::CW => "599",
        _ => "59",
    }
}

fn record_fields(
    c: &Contact,
    prefs: &Preferences,
    catalog: &SectionCatalog,
    contest_id: bool,
) -> Vec<Field> {
    let rst = rst(c.mode);
    let mut fields = vec![
        Field {
            name: "QSO_DATE",
            data_type: Some("d"),
            value: c.timestamp.format("%Y%m%d").to_string(),
        },
        Field::new("TIME_ON", c.timestamp.format("%H%M").to_string()),
        Field::new("CALL", c.callsign.as_str()),
        Field::new("MODE", adif_mode(c.mode)),
        Field::new("BAND", format!("{}M", c.band)),
        Field::new("FREQ", format_mhz(effective_khz(c.frequency_hz, c.band, c.mode))),
        Field::new("RST_SENT", rst),
        Field::new("RST_RCVD", rst),
        Field::new("STX_STRING", prefs.own_exchange()),
        Field::new(
            "SRX_STRING",
            format!("{} {}", c.exchange_class, c.exchange_section),
        ),
        Field::new("ARRL_SECT", c.exchange_section.as_str()),
        Field::new("CLASS", c.exchange_class.as_str()),
    ];
    if let Some(state) = catalog.state_for(&c.exchange_section) {
        fields.push(Field::new("STATE", state));
    }
    let grid = Field::text("GRIDSQUARE", &c.grid);
    if !grid.value.is_empty() {
        fields.push(grid);
    }
    let name = Field::text("NAME", &c.operator_name);
    if !name.value.is_empty() {
        fields.push(name);
    }
    if contest_id {
        fields.push(Field::new("CONTEST_ID", FIELD_DAY_CONTEST_ID));
    }
    fields.push(Field::new("COMMENT", COMMENT));
    fields
}

/// Full ADIF file: two-line header, then one field per CRLF line per
/// record, `<EOR>`, and a blank line. Contacts are written in the order
/// given.
pub fn write_adif<'a>(
    contacts: impl IntoIterator<Item = &'a Contact>,
    prefs: &Preferences,
    catalog: &SectionCatalog,
) -> String {
    let mut out = String::new();
    let _ = write!(out, "<ADIF_VER:{}>{}\r\n", ADIF_VERSION.len(), ADIF_VERSION);
    out.push_str("<EOH>\r\n");
    for c in contacts {
        for field in record_fields(c, prefs, catalog, false) {
            field.write_to(&mut out);
            out.push_str("\r\n");
        }
        out.push_str("<EOR>\r\n\r\n");
    }
    out
}

/// One record on a single line, carrying `CONTEST_ID`, for remote sync.
pub fn remote_record(c: &Contact, prefs: &Preferences, catalog: &SectionCatalog) -> String {
    let mut out = String::new();
    for field in record_fields(c, prefs, catalog, true) {
        field.write_to(&mut out);
    }
    out.push_str("<EOR>");
    out
}

/// Re-reads ADIF text into one tag map per record. Header fields before
/// `<EOH>` are skipped; a trailing record without `<EOR>` is dropped.
pub fn parse_records(text: &str) -> Result<Vec<TagMap>, ProtocolError> {
    let has_header = text.to_ascii_uppercase().contains("<EOH>");
    let mut in_header = has_header;
    let mut records = Vec::new();
    let mut current = TagMap::default();
    for token in Tokens::new(text) {
        match token? {
            Token::EndOfHeader => {
                in_header = false;
                current = TagMap::default();
            }
            Token::Field { .. } if in_header => {}
            Token::Field { name, value } => current.insert(name, value),
            Token::EndOfRecord => records.push(std::mem::take(&mut current)),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::types::Band;

    fn prefs() -> Preferences {
        Preferences {
            mycall: "K6GTE".to_string(),
            myclass: "1B".to_string(),
            mysection: "ORG".to_string(),
            ..Preferences::default()
        }
    }

    fn contact() -> Contact {
        Contact {
            id: 1,
            callsign: "W1AW".to_string(),
            exchange_class: "2A".to_string(),
            exchange_section: "CT".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 6, 22, 18, 5, 33).unwrap(),
            frequency_hz: 7_030_250,
            band: Band::B40,
            mode: Mode::CW,
            power_watts: 5,
            grid: "FN31".to_string(),
            operator_name: String::new(),
        }
    }

    #[test]
    fn record_layout_is_exact() {
        let text = write_adif([&contact()], &prefs(), SectionCatalog::global());
        let expected = "<ADIF_VER:5>2.2.0\r\n<EOH>\r\n\
            <QSO_DATE:8:d>20240622\r\n\
            <TIME_ON:4>1805\r\n\
            <CALL:4>W1AW\r\n\
            <MODE:2>CW\r\n\
            <BAND:3>40M\r\n\
            <FREQ:5>7.030\r\n\
            <RST_SENT:3>599\r\n\
            <RST_RCVD:3>599\r\n\
            <STX_STRING:6>1B ORG\r\n\
            <SRX_STRING:5>2A CT\r\n\
            <ARRL_SECT:2>CT\r\n\
            <CLASS:2>2A\r\n\
            <STATE:2>CT\r\n\
            <GRIDSQUARE:4>FN31\r\n\
            <COMMENT:7>ARRL-FD\r\n\
            <EOR>\r\n\r\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn digital_and_phone_modes_remap_and_unknown_frequency_is_nominal() {
        let mut c = contact();
        c.mode = Mode::DI;
        c.frequency_hz = 0;
        c.grid.clear();
        c.exchange_section = "DX".to_string();
        let text = write_adif([&c], &prefs(), SectionCatalog::global());
        assert!(text.contains("<MODE:3>FT8\r\n"));
        assert!(text.contains("<FREQ:5>7.040\r\n"));
        assert!(text.contains("<RST_SENT:2>59\r\n"));
        assert!(!text.contains("<STATE:"));
        assert!(!text.contains("<GRIDSQUARE:"));

        c.mode = Mode::PH;
        let text = write_adif([&c], &prefs(), SectionCatalog::global());
        assert!(text.contains("<MODE:3>SSB\r\n"));
    }

    #[test]
    fn non_ascii_free_text_never_reaches_the_file() {
        let mut c = contact();
        c.operator_name = "Jos\u{e9}".to_string();
        c.grid = "FN31\u{2013}".to_string();
        let text = write_adif([&c], &prefs(), SectionCatalog::global());
        assert!(text.is_ascii());
        assert!(text.contains("<NAME:3>Jos\r\n"));
        assert!(text.contains("<GRIDSQUARE:4>FN31\r\n"));

        let records = parse_records(&text).expect("parse");
        assert_eq!(records[0].get("NAME"), Some("Jos"));
        assert_eq!(records[0].get("COMMENT"), Some("ARRL-FD"));

        c.operator_name = "\u{c5}\u{f8}".to_string();
        let text = write_adif([&c], &prefs(), SectionCatalog::global());
        assert!(!text.contains("<NAME:"));
    }

    #[test]
    fn remote_record_is_one_line_with_contest_id() {
        let line = remote_record(&contact(), &prefs(), SectionCatalog::global());
        assert!(!line.contains('\n'));
        assert!(line.ends_with("<CONTEST_ID:14>ARRL-FIELD-DAY<COMMENT:7>ARRL-FD<EOR>"));
        assert!(line.starts_with("<QSO_DATE:8:d>20240622<TIME_ON:4>1805<CALL:4>W1AW"));
    }

    #[test]
    fn parse_records_skips_header() {
        let text = write_adif([&contact(), &contact()], &prefs(), SectionCatalog::global());
        let records = parse_records(&text).expect("parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("CALL"), Some("W1AW"));
        assert_eq!(records[0].get("ADIF_VER"), None);
        assert_eq!(records[1].get("SRX_STRING"), Some("2A CT"));
    }
}
