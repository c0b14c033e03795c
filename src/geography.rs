/// Geographic helpers shared by the analysis routines: hemisphere from
/// latitude, longitude frame conversion and great-circle distance.

use std::fmt;

/// Mean Earth radius used for great-circle distances, in metres.
pub const EARTH_MEAN_RADIUS_M: f64 = 6_371_008.8;

// ---------------------------------------------------------------------------
// Hemisphere
// ---------------------------------------------------------------------------

/// Ordered so that `North < South`, which makes mode tie-breaks pick the
/// northern hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Hemisphere {
    North,
    South,
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hemisphere::North => write!(f, "N"),
            Hemisphere::South => write!(f, "S"),
        }
    }
}

/// `lat >= 0` is northern. The equator counts as north; NaN as south.
pub fn hemisphere(lat: f64) -> Hemisphere {
    if lat >= 0.0 {
        Hemisphere::North
    } else {
        Hemisphere::South
    }
}

pub fn hemispheres(lat: &[f64]) -> Vec<Hemisphere> {
    lat.iter().map(|&l| hemisphere(l)).collect()
}

// ---------------------------------------------------------------------------
// Longitude frames
// ---------------------------------------------------------------------------

/// Maps a longitude into [0, 360).
pub fn lon_to_0_360(lon: f64) -> f64 {
    lon.rem_euclid(360.0)
}

/// Maps a longitude given in [0, 360) into [-180, 180]; values already
/// at or below 180 are left alone.
pub fn lon_to_pm180(lon: f64) -> f64 {
    if lon > 180.0 { lon - 360.0 } else { lon }
}

// ---------------------------------------------------------------------------
// Distance
// ---------------------------------------------------------------------------

/// Great-circle distance in metres between two (lat, lon) points in degrees.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_MEAN_RADIUS_M * a.sqrt().asin()
}
