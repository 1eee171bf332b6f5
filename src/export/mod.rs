//! Submission file generation.
//!
//! Writers are pure functions of an ordered contact slice and the operator
//! preferences, so generating twice from an unchanged log yields identical
//! bytes. [`export_all`] writes every file and reports each outcome
//! separately; one failed file never stops the others.

/// ADIF writer, remote-sync record, and re-reader.
pub mod adif;
/// Cabrillo writer.
pub mod cabrillo;
/// Nominal frequencies and frequency formatting.
pub mod freq;
/// xplanet marker file.
pub mod marker;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{
    config::Preferences,
    contact::Contact,
    engine::{band_mode_tally, compute_score, render_statistics},
    sections::SectionCatalog,
};

pub use adif::{ADIF_FILE, parse_records, remote_record, write_adif};
pub use cabrillo::{cabrillo_file_name, write_cabrillo};
pub use marker::{MARKER_FILE, write_markers};

/// Band/mode statistics file name.
pub const STATISTICS_FILE: &str = "Statistics.txt";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("operator callsign is not set")]
    MissingCallsign,
}

/// Outcome of one file in an [`export_all`] run.
#[derive(Debug)]
pub struct ExportOutcome {
    pub file: String,
    pub result: Result<PathBuf, ExportError>,
}

impl ExportOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Writes the ADIF log, Cabrillo log, statistics sheet and marker file into
/// `dir`.
///
/// `contacts` must be in chronological order.
pub fn export_all(
    dir: impl AsRef<Path>,
    contacts: &[Contact],
    prefs: &Preferences,
    catalog: &SectionCatalog,
) -> Vec<ExportOutcome> {
    let dir = dir.as_ref();
    let score = compute_score(contacts, &prefs.power_thresholds);

    let adif = write_adif(contacts, prefs, catalog);
    let mut outcomes = vec![write_file(dir, ADIF_FILE, &adif)];

    let cabrillo = if prefs.mycall.trim().is_empty() {
        ExportOutcome {
            file: cabrillo_file_name(prefs),
            result: Err(ExportError::MissingCallsign),
        }
    } else {
        let text = write_cabrillo(contacts, prefs, &score);
        write_file(dir, &cabrillo_file_name(prefs), &text)
    };
    outcomes.push(cabrillo);

    let stats = render_statistics(&band_mode_tally(contacts));
    outcomes.push(write_file(dir, STATISTICS_FILE, &stats));
    outcomes.push(write_file(dir, MARKER_FILE, &write_markers(contacts)));

    for outcome in &outcomes {
        match &outcome.result {
            Ok(path) => tracing::info!(path = %path.display(), "export written"),
            Err(err) => tracing::error!(file = %outcome.file, error = %err, "export failed"),
        }
    }
    outcomes
}

fn write_file(dir: &Path, name: &str, text: &str) -> ExportOutcome {
    let path = dir.join(name);
    let result = fs::write(&path, text.as_bytes())
        .map(|_| path.clone())
        .map_err(|source| ExportError::Io { path, source });
    ExportOutcome {
        file: name.to_string(),
        result,
    }
}
