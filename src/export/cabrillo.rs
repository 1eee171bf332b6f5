use std::fmt::Write as _;

use crate::{config::Preferences, contact::Contact, engine::Score, types::Mode};

use super::freq::effective_khz;

const CREATED_BY: &str = "fdlog Field Day Logger";

/// `<MYCALL>.log`, upper-cased.
pub fn cabrillo_file_name(prefs: &Preferences) -> String {
    format!("{}.log", prefs.mycall.trim().to_ascii_uppercase())
}

fn cabrillo_mode(mode: Mode) -> &'static str {
    match mode {
        Mode::CW => "CW",
        Mode::PH => "PH",
        Mode::DI => "DG",
    }
}

/// Full Cabrillo 3.0 log. `contacts` must already be in chronological
/// order; `score` supplies the power category and claimed score.
pub fn write_cabrillo<'a>(
    contacts: impl IntoIterator<Item = &'a Contact>,
    prefs: &Preferences,
    score: &Score,
) -> String {
    let mut out = String::new();
    let mut line = |s: &str| {
        out.push_str(s);
        out.push_str("\r\n");
    };
    line("START-OF-LOG: 3.0");
    line(&format!("CREATED-BY: {CREATED_BY}"));
    line("CONTEST: ARRL-FD");
    line(&format!("CALLSIGN: {}", prefs.mycall));
    line("LOCATION:");
    line(&format!("ARRL-SECTION: {}", prefs.mysection));
    line(&format!("CATEGORY: {}", prefs.myclass));
    line(&format!("CATEGORY-POWER: {}", score.power_category));
    line(&format!("CLAIMED-SCORE: {}", score.final_score));
    line(&format!("OPERATORS: {}", prefs.mycall));
    for blank in [
        "NAME",
        "ADDRESS",
        "ADDRESS-CITY",
        "ADDRESS-STATE",
        "ADDRESS-POSTALCODE",
        "ADDRESS-COUNTRY",
        "EMAIL",
    ] {
        line(&format!("{blank}: "));
    }

    for c in contacts {
        let khz = effective_khz(c.frequency_hz, c.band, c.mode);
        let mut qso = String::new();
        let _ = write!(
            qso,
            "QSO: {:>6} {} {} {} {} {} {} {} {} {}",
            khz,
            cabrillo_mode(c.mode),
            c.timestamp.format("%Y-%m-%d"),
            c.timestamp.format("%H%M"),
            prefs.mycall,
            prefs.myclass,
            prefs.mysection,
            c.callsign,
            c.exchange_class,
            c.exchange_section,
        );
        line(&qso);
    }
    line("END-OF-LOG:");
    out
}
