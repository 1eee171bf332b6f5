//! Pure computations over a contact snapshot: score, tally and rate.

/// Recent QSO rate.
pub mod rate;
/// Points, power flags and multiplier.
pub mod score;
/// Per-band, per-mode counts and power.
pub mod tally;

pub use rate::{QsoRate, qso_rate};
pub use score::{PowerCategory, Score, compute_score};
pub use tally::{BandTally, ModeTally, band_mode_tally, render_statistics};
