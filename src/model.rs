/// Core data types for cyclone track analysis.
///
/// This module defines the shared track table imported by all other modules.
/// A `TrackSet` is columnar: every column is a `Vec` of the same length, one
/// entry per observation (record). Analysis routines borrow a `TrackSet`
/// and return new owned structures; nothing here is mutated in place by
/// the diagnostics.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Column holding the track identifier.
pub const COL_TRACK_ID: &str = "track_id";

/// Column holding the observation time.
pub const COL_TIME: &str = "time";

/// Longitude column, degrees east.
pub const COL_LON: &str = "lon";

/// Latitude column, degrees north.
pub const COL_LAT: &str = "lat";

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// A numeric per-observation column with optional unit metadata.
///
/// `units` is a free-form string as found in the source data ("m s-1",
/// "hPa", "knots", ...). Category and energy routines consult it to convert
/// to their expected unit before thresholding.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub values: Vec<f64>,
    pub units: Option<String>,
}

impl Variable {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, units: None }
    }

    pub fn with_units(values: Vec<f64>, units: &str) -> Self {
        Self {
            values,
            units: Some(units.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Track table
// ---------------------------------------------------------------------------

/// A table of track observations, one row per (track_id, time).
///
/// Rows belonging to one track need not be contiguous or sorted; routines
/// that depend on order (translation speed, duration) work on a sorted copy
/// obtained from `sorted_by_track_and_time`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackSet {
    pub track_id: Vec<String>,
    pub time: Vec<NaiveDateTime>,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    /// Numeric columns other than lon/lat, keyed by lower-case name.
    pub variables: BTreeMap<String, Variable>,
    /// Non-numeric columns kept verbatim (basin names, storm names, ...).
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl TrackSet {
    /// Builds a track set from its four required columns.
    ///
    /// All columns must share the length of `track_id`.
    pub fn new(
        track_id: Vec<String>,
        time: Vec<NaiveDateTime>,
        lon: Vec<f64>,
        lat: Vec<f64>,
    ) -> Result<Self, TrackError> {
        let expected = track_id.len();
        check_len(COL_TIME, expected, time.len())?;
        check_len(COL_LON, expected, lon.len())?;
        check_len(COL_LAT, expected, lat.len())?;

        Ok(Self {
            track_id,
            time,
            lon,
            lat,
            variables: BTreeMap::new(),
            attributes: BTreeMap::new(),
        })
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.track_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.track_id.is_empty()
    }

    /// Adds (or replaces) a numeric variable.
    pub fn with_variable(mut self, name: &str, variable: Variable) -> Result<Self, TrackError> {
        check_len(name, self.len(), variable.values.len())?;
        self.variables.insert(name.to_string(), variable);
        Ok(self)
    }

    /// Adds (or replaces) a string attribute column.
    pub fn with_attribute(mut self, name: &str, values: Vec<String>) -> Result<Self, TrackError> {
        check_len(name, self.len(), values.len())?;
        self.attributes.insert(name.to_string(), values);
        Ok(self)
    }

    /// Looks up a numeric variable by name.
    pub fn variable(&self, name: &str) -> Result<&Variable, TrackError> {
        self.variables
            .get(name)
            .ok_or_else(|| TrackError::MissingColumn(name.to_string()))
    }

    /// Distinct track identifiers in order of first appearance.
    pub fn track_ids(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.track_id
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .map(|id| id.as_str())
            .collect()
    }

    /// Row indices of each track, in order of first appearance.
    pub fn groups(&self) -> Vec<(String, Vec<usize>)> {
        crate::analysis::groupings::group_by_track(&self.track_id)
    }

    /// New track set holding only the given rows, in the given order.
    ///
    /// Indices must be in bounds.
    pub fn select_rows(&self, rows: &[usize]) -> TrackSet {
        let pick_f64 = |col: &[f64]| rows.iter().map(|&i| col[i]).collect::<Vec<_>>();

        TrackSet {
            track_id: rows.iter().map(|&i| self.track_id[i].clone()).collect(),
            time: rows.iter().map(|&i| self.time[i]).collect(),
            lon: pick_f64(&self.lon),
            lat: pick_f64(&self.lat),
            variables: self
                .variables
                .iter()
                .map(|(name, var)| {
                    let picked = Variable {
                        values: pick_f64(&var.values),
                        units: var.units.clone(),
                    };
                    (name.clone(), picked)
                })
                .collect(),
            attributes: self
                .attributes
                .iter()
                .map(|(name, col)| {
                    let picked = rows.iter().map(|&i| col[i].clone()).collect();
                    (name.clone(), picked)
                })
                .collect(),
        }
    }

    /// Copy of the table sorted by track id, then time. The sort is stable,
    /// so duplicate timestamps keep their original relative order.
    pub fn sorted_by_track_and_time(&self) -> TrackSet {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| {
            self.track_id[a]
                .cmp(&self.track_id[b])
                .then(self.time[a].cmp(&self.time[b]))
        });
        self.select_rows(&order)
    }
}

fn check_len(column: &str, expected: usize, found: usize) -> Result<(), TrackError> {
    if expected == found {
        Ok(())
    } else {
        Err(TrackError::LengthMismatch {
            column: column.to_string(),
            expected,
            found,
        })
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when loading or analysing track data.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    /// An option value outside its closed set (season convention,
    /// pressure convention, ...).
    #[error("unsupported {option}: '{value}'")]
    UnsupportedOption { option: &'static str, value: String },

    /// A density method other than histogram or kde.
    #[error("method '{0}' not implemented, use 'histogram' or 'kde'")]
    UnsupportedMethod(String),

    /// A required column is absent from the input.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// Parallel columns disagree in length.
    #[error("column '{column}' has {found} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    /// A cell could not be interpreted (bad timestamp, bad number).
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// An argument outside its valid domain (non-positive bin size,
    /// empty sample for KDE, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Cropping was requested on a grid without any positive cell.
    #[error("density grid contains no non-zero cell to crop to")]
    EmptyGrid,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<toml::de::Error> for TrackError {
    fn from(err: toml::de::Error) -> Self {
        TrackError::Config(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
