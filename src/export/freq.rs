use crate::types::{Band, Mode};

/// Typical operating frequency in kHz for a band and mode, used when a
/// contact was logged without a frequency.
pub fn nominal_khz(band: Band, mode: Mode) -> u64 {
    let (cw, di, ph) = match band {
        Band::B160 => (1830, 1805, 1840),
        Band::B80 => (3530, 3559, 3970),
        Band::B60 => (5332, 5373, 5405),
        Band::B40 => (7030, 7040, 7250),
        Band::B20 => (14030, 14070, 14250),
        Band::B15 => (21065, 21070, 21200),
        Band::B10 => (28065, 28070, 28400),
        Band::B6 => (50030, 50300, 50125),
        Band::B2 => (144030, 144144, 144250),
    };
    match mode {
        Mode::CW => cw,
        Mode::DI => di,
        Mode::PH => ph,
    }
}

/// Frequency in whole kHz, falling back to [`nominal_khz`] when unknown.
pub fn effective_khz(frequency_hz: u64, band: Band, mode: Mode) -> u64 {
    match frequency_hz / 1000 {
        0 => nominal_khz(band, mode),
        khz => khz,
    }
}

/// MHz with exactly three decimals, e.g. `7.074`.
pub fn format_mhz(khz: u64) -> String {
    format!("{}.{:03}", khz / 1000, khz % 1000)
}
