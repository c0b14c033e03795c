//! Season assignment.
//!
//! Every point of a track gets the same season label, derived from the
//! track's most frequent hemisphere, year and month. Using per-track modes
//! keeps a storm that crosses the equator or a season boundary under one
//! label.
//!
//! Northern-hemisphere seasons are calendar years. Southern-hemisphere
//! seasons run July to June:
//! - `Short`: July n-1 .. June n is season `n`.
//! - `Long`: July n-1 .. June n is season `"(n-1)n"`, e.g. `"20192020"`.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime};
use serde::Deserialize;

use crate::analysis::groupings::{group_by_track, mode};
use crate::geography::{hemisphere, Hemisphere};
use crate::logging::{self, Component};
use crate::model::{TrackError, TrackSet};

/// Naming convention for southern-hemisphere seasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonConvention {
    Short,
    #[default]
    Long,
}

impl FromStr for SeasonConvention {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(SeasonConvention::Short),
            "long" => Ok(SeasonConvention::Long),
            _ => Err(TrackError::UnsupportedOption {
                option: "season convention",
                value: s.to_string(),
            }),
        }
    }
}

/// A season label. `Short` seasons are plain years; `Long` seasons are
/// strings so southern seasons can span two years.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Season {
    Short(i32),
    Long(String),
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Short(year) => write!(f, "{}", year),
            Season::Long(label) => write!(f, "{}", label),
        }
    }
}

/// Season label from a track's modal hemisphere, year and month.
pub fn season_for(hemi: Hemisphere, year: i32, month: u32, convention: SeasonConvention) -> Season {
    match (convention, hemi) {
        (SeasonConvention::Short, Hemisphere::North) => Season::Short(year),
        (SeasonConvention::Short, Hemisphere::South) => {
            if month >= 7 {
                Season::Short(year + 1)
            } else {
                Season::Short(year)
            }
        }
        (SeasonConvention::Long, Hemisphere::North) => Season::Long(year.to_string()),
        (SeasonConvention::Long, Hemisphere::South) => {
            if month >= 7 {
                Season::Long(format!("{}{}", year, year + 1))
            } else {
                Season::Long(format!("{}{}", year - 1, year))
            }
        }
    }
}

/// Assigns one season per observation.
///
/// `track_id`, `lat` and `time` are parallel columns. Empty input gives an
/// empty result. Modal ties resolve to the smallest value (north before
/// south, earliest year, earliest month).
pub fn assign_seasons<S: AsRef<str>>(
    track_id: &[S],
    lat: &[f64],
    time: &[NaiveDateTime],
    convention: SeasonConvention,
) -> Result<Vec<Season>, TrackError> {
    let n = track_id.len();
    for (column, len) in [("lat", lat.len()), ("time", time.len())] {
        if len != n {
            return Err(TrackError::LengthMismatch {
                column: column.to_string(),
                expected: n,
                found: len,
            });
        }
    }

    let groups = group_by_track(track_id);
    let mut seasons: Vec<Option<Season>> = vec![None; n];

    for (id, rows) in &groups {
        let hemi = mode(rows.iter().map(|&i| hemisphere(lat[i])));
        let year = mode(rows.iter().map(|&i| time[i].year()));
        let month = mode(rows.iter().map(|&i| time[i].month()));

        // Groups are never empty, so the modes always exist.
        let (Some(hemi), Some(year), Some(month)) = (hemi, year, month) else {
            continue;
        };

        let season = season_for(hemi, year, month, convention);
        logging::debug(
            Component::Season,
            Some(id.as_str()),
            &format!("hemisphere {} year {} month {} -> season {}", hemi, year, month, season),
        );

        for &i in rows {
            seasons[i] = Some(season.clone());
        }
    }

    Ok(seasons.into_iter().flatten().collect())
}

/// `assign_seasons` over a track set's own columns.
pub fn assign_track_seasons(
    tracks: &TrackSet,
    convention: SeasonConvention,
) -> Result<Vec<Season>, TrackError> {
    assign_seasons(&tracks.track_id, &tracks.lat, &tracks.time, convention)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
