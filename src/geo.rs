//! Maidenhead locator geodesy.
//!
//! Locators decode to the south-west corner of their field and square, and
//! to the center of their subsquare, matching the convention contest
//! loggers use for distance and bearing display.
//!
//! ```
//! use fdlog::geo;
//!
//! assert_eq!(geo::distance("FN31", "FN20"), 202);
//! assert_eq!(geo::bearing("FN31", "FN20"), 237);
//! ```

/// Mean earth radius in kilometers used for great-circle distance.
pub const EARTH_RADIUS_KM: f64 = 6372.8;

/// Distance and initial bearing from the station to a worked grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreatCirclePath {
    pub km: i64,
    pub degrees: i64,
}

/// Decodes a 2, 4, 6 or 8 character locator into `(lat, lon)` degrees.
///
/// Anything else (too short, too long, odd length, characters outside the
/// field/square/subsquare alphabets) yields `(0.0, 0.0)`.
pub fn grid_to_latlon(grid: &str) -> (f64, f64) {
    decode(grid).unwrap_or((0.0, 0.0))
}

/// Like [`grid_to_latlon`], but `None` for anything that is not a locator.
pub fn decode(grid: &str) -> Option<(f64, f64)> {
    let grid = grid.trim().to_ascii_uppercase();
    let b = grid.as_bytes();
    let len = b.len();
    if !(2..=8).contains(&len) || len % 2 != 0 {
        return None;
    }

    let field = |c: u8| (b'A'..=b'R').contains(&c);
    let digit = |c: u8| c.is_ascii_digit();
    let subsquare = |c: u8| (b'A'..=b'X').contains(&c);

    if !field(b[0]) || !field(b[1]) {
        return None;
    }
    let mut lon = f64::from(b[0] - b'A') * 20.0 - 180.0;
    let mut lat = f64::from(b[1] - b'A') * 10.0 - 90.0;

    if len >= 4 {
        if !digit(b[2]) || !digit(b[3]) {
            return None;
        }
        lon += f64::from(b[2] - b'0') * 2.0;
        lat += f64::from(b[3] - b'0');
    }

    if len >= 6 {
        if !subsquare(b[4]) || !subsquare(b[5]) {
            return None;
        }
        lon += f64::from(b[4] - b'A') / 12.0 + 1.0 / 24.0;
        lat += f64::from(b[5] - b'A') / 24.0 + 1.0 / 48.0;
    }

    if len == 8 {
        if !digit(b[6]) || !digit(b[7]) {
            return None;
        }
        lon += f64::from(b[6] - b'0') * 5.0 / 600.0;
        lat += f64::from(b[7] - b'0') * 2.5 / 600.0;
    }

    Some((lat, lon))
}

/// Great-circle distance in kilometers between two points in degrees.
pub fn haversine(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (lon1, lat1, lon2, lat2) = (
        lon1.to_radians(),
        lat1.to_radians(),
        lon2.to_radians(),
        lat2.to_radians(),
    );
    let dlon = lon2 - lon1;
    let dlat = lat2 - lat1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * a.sqrt().asin() * EARTH_RADIUS_KM
}

/// Distance in whole kilometers between two locators.
pub fn distance(grid1: &str, grid2: &str) -> i64 {
    let (lat1, lon1) = grid_to_latlon(grid1);
    let (lat2, lon2) = grid_to_latlon(grid2);
    haversine(lon1, lat1, lon2, lat2).round() as i64
}

/// Initial bearing in whole degrees `[0, 360)` from `grid1` toward `grid2`.
pub fn bearing(grid1: &str, grid2: &str) -> i64 {
    let (lat1, lon1) = grid_to_latlon(grid1);
    let (lat2, lon2) = grid_to_latlon(grid2);
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );
    let dlon = lon2 - lon1;
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let mut brng = y.atan2(x).to_degrees();
    if brng < 0.0 {
        brng += 360.0;
    }
    // 359.6 rounds up to the full circle.
    (brng.round() as i64) % 360
}

/// Path from `from` to `to`, or `None` when either side is not a locator.
pub fn path(from: &str, to: &str) -> Option<GreatCirclePath> {
    decode(from)?;
    decode(to)?;
    Some(GreatCirclePath {
        km: distance(from, to),
        degrees: bearing(from, to),
    })
}
