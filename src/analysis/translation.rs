//! Translation speed along tracks.
//!
//! Speeds are attached to the midpoint of each consecutive pair of
//! observations in a track, so a track with `n` points yields `n - 1`
//! speeds and a single-point track yields none.

use chrono::NaiveDateTime;

use crate::geography::{haversine_distance, lon_to_pm180};
use crate::model::TrackSet;

/// Translation speed between two consecutive observations, located at
/// their midpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationSpeed {
    pub track_id: String,
    pub time: NaiveDateTime,
    /// Midpoint longitude in the [-180, 180] frame.
    pub lon: f64,
    pub lat: f64,
    /// Metres per second. Infinite if both points share a timestamp.
    pub speed_m_s: f64,
}

/// Computes translation speeds for every track.
///
/// Works on a copy sorted by (track_id, time); the caller's set is left
/// untouched. Results are ordered by track id, then time.
pub fn translation_speed(tracks: &TrackSet) -> Vec<TranslationSpeed> {
    let sorted = tracks.sorted_by_track_and_time();
    let lon: Vec<f64> = sorted.lon.iter().map(|&l| lon_to_pm180(l)).collect();

    let mut speeds = Vec::with_capacity(sorted.len().saturating_sub(1));
    for i in 1..sorted.len() {
        let p = i - 1;
        if sorted.track_id[p] != sorted.track_id[i] {
            continue;
        }

        let dt = (sorted.time[i] - sorted.time[p]).num_milliseconds() as f64 / 1000.0;
        let dx = haversine_distance(sorted.lat[p], lon[p], sorted.lat[i], lon[i]);

        speeds.push(TranslationSpeed {
            track_id: sorted.track_id[p].clone(),
            time: sorted.time[p] + (sorted.time[i] - sorted.time[p]) / 2,
            lon: (lon[p] + lon[i]) / 2.0,
            lat: (sorted.lat[p] + sorted.lat[i]) / 2.0,
            speed_m_s: dx / dt,
        });
    }

    speeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geography::EARTH_MEAN_RADIUS_M;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 9, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_one_degree_per_hour() {
        let tracks = TrackSet::new(
            vec!["t".into(), "t".into()],
            vec![at(0), at(1)],
            vec![300.0, 300.0],
            vec![20.0, 21.0],
        )
        .unwrap();

        let v = translation_speed(&tracks);
        assert_eq!(v.len(), 1);
        let expected = EARTH_MEAN_RADIUS_M * 1f64.to_radians() / 3600.0;
        assert_relative_eq!(v[0].speed_m_s, expected, max_relative = 1e-9);
        assert_relative_eq!(v[0].speed_m_s, 30.89, epsilon = 0.01);
        assert_eq!(v[0].lon, -60.0);
        assert_eq!(v[0].lat, 20.5);
        assert_eq!(v[0].time, at(0) + chrono::Duration::minutes(30));
    }

    #[test]
    fn test_pairs_never_span_two_tracks() {
        let tracks = TrackSet::new(
            vec!["b".into(), "a".into(), "b".into(), "a".into(), "c".into()],
            vec![at(6), at(0), at(0), at(6), at(0)],
            vec![10.0, 20.0, 10.0, 20.0, 30.0],
            vec![1.0, 2.0, 0.0, 3.0, 4.0],
        )
        .unwrap();

        let v = translation_speed(&tracks);
        let ids: Vec<&str> = v.iter().map(|s| s.track_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(v.iter().all(|s| s.speed_m_s > 0.0));
        // Sorting happened on a copy.
        assert_eq!(tracks.track_id[0], "b");
    }

    #[test]
    fn test_empty_tracks_give_no_speeds() {
        assert!(translation_speed(&TrackSet::default()).is_empty());
    }
}
