/// CSV track loader
///
/// Reads a table with one row per observation into a `TrackSet`. Headers
/// are trimmed and lower-cased, so "Track_ID" and " track_id" both match.
///
/// Required columns: `track_id`, `lon` (or `longitude`), `lat` (or
/// `latitude`). Time comes from `iso_time`, else `time`, else the split
/// `year`/`month`/`day`/`hour` columns (`hour` may be absent, meaning 00Z).
///
/// Every other column is kept: numeric when each non-empty cell parses as
/// a float (empty cells become NaN), otherwise verbatim as strings.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use ::csv::{ReaderBuilder, StringRecord, Trim};

use crate::logging::{self, Component};
use crate::model::{TrackError, TrackSet, Variable, COL_LAT, COL_LON, COL_TIME, COL_TRACK_ID};
use crate::time::{compose_time, parse_time};

const COL_ISO_TIME: &str = "iso_time";
const SPLIT_TIME_COLUMNS: [&str; 4] = ["year", "month", "day", "hour"];

/// Loads a track CSV from disk.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<TrackSet, TrackError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let tracks = read_tracks(BufReader::new(file))?;

    logging::info(
        Component::Ingest,
        None,
        &format!(
            "Loaded {} points in {} tracks from {}",
            tracks.len(),
            tracks.track_ids().len(),
            path.display()
        ),
    );
    Ok(tracks)
}

/// Reads a track CSV from any reader.
pub fn read_tracks<R: Read>(reader: R) -> Result<TrackSet, TrackError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(true)
        .from_reader(reader);

    let headers = canonical_headers(reader.headers()?)?;
    let records = reader.records().collect::<Result<Vec<StringRecord>, _>>()?;

    let column = |name: &str| headers.iter().position(|h| h == name);
    let required = |name: &str| column(name).ok_or_else(|| TrackError::MissingColumn(name.to_string()));

    let id_col = required(COL_TRACK_ID)?;
    let lon_col = required(COL_LON)?;
    let lat_col = required(COL_LAT)?;
    let time_source = TimeSource::detect(&headers)?;

    let mut track_id = Vec::with_capacity(records.len());
    let mut time = Vec::with_capacity(records.len());
    let mut lon = Vec::with_capacity(records.len());
    let mut lat = Vec::with_capacity(records.len());

    for (row, record) in records.iter().enumerate() {
        let line = row + 1;
        let cell = |col: usize| record.get(col).unwrap_or("");

        track_id.push(cell(id_col).to_string());

        let x = parse_number(cell(lon_col), COL_LON, line)?;
        lon.push(if x < 0.0 { x + 360.0 } else { x });
        lat.push(parse_number(cell(lat_col), COL_LAT, line)?);

        time.push(time_source.read(record, line)?);
    }

    let mut tracks = TrackSet::new(track_id, time, lon, lat)?;

    let consumed = |i: usize| i == id_col || i == lon_col || i == lat_col || time_source.uses(i);
    for (i, name) in headers.iter().enumerate().filter(|(i, _)| !consumed(*i)) {
        let cells: Vec<&str> = records.iter().map(|r| r.get(i).unwrap_or("")).collect();
        tracks = match numeric_column(&cells) {
            Some(values) => tracks.with_variable(name, Variable::new(values))?,
            None => tracks.with_attribute(name, cells.iter().map(|s| s.to_string()).collect())?,
        };
    }

    Ok(tracks)
}

/// Lower-cases headers and applies the lon/lat aliases. A name appearing
/// twice after aliasing is rejected.
fn canonical_headers(raw: &StringRecord) -> Result<Vec<String>, TrackError> {
    let mut headers: Vec<String> = Vec::with_capacity(raw.len());
    for h in raw.iter() {
        let name = match h.trim().to_lowercase().as_str() {
            "longitude" => COL_LON.to_string(),
            "latitude" => COL_LAT.to_string(),
            other => other.to_string(),
        };
        if headers.contains(&name) {
            return Err(TrackError::InvalidArgument(format!("duplicate column '{}'", name)));
        }
        headers.push(name);
    }
    Ok(headers)
}

enum TimeSource {
    Single(usize),
    Split {
        year: usize,
        month: usize,
        day: usize,
        hour: Option<usize>,
    },
}

impl TimeSource {
    fn detect(headers: &[String]) -> Result<Self, TrackError> {
        let column = |name: &str| headers.iter().position(|h| h == name);

        if let Some(i) = column(COL_ISO_TIME).or_else(|| column(COL_TIME)) {
            return Ok(TimeSource::Single(i));
        }

        let [year, month, day, hour] = SPLIT_TIME_COLUMNS.map(column);
        match (year, month, day) {
            (Some(year), Some(month), Some(day)) => Ok(TimeSource::Split { year, month, day, hour }),
            _ => Err(TrackError::MissingColumn(format!(
                "{} (or {}, or year/month/day[/hour])",
                COL_TIME, COL_ISO_TIME
            ))),
        }
    }

    fn uses(&self, col: usize) -> bool {
        match *self {
            TimeSource::Single(i) => i == col,
            TimeSource::Split { year, month, day, hour } => {
                col == year || col == month || col == day || hour == Some(col)
            }
        }
    }

    fn read(&self, record: &StringRecord, line: usize) -> Result<chrono::NaiveDateTime, TrackError> {
        let cell = |col: usize| record.get(col).unwrap_or("");
        let parse_err = |message: String| TrackError::Parse { line, message };

        match *self {
            TimeSource::Single(i) => parse_time(cell(i)).map_err(parse_err),
            TimeSource::Split { year, month, day, hour } => {
                let year = parse_whole(cell(year), "year", line)?;
                let month = parse_whole(cell(month), "month", line)?;
                let day = parse_whole(cell(day), "day", line)?;
                let hour = match hour {
                    Some(h) => parse_whole(cell(h), "hour", line)?,
                    None => 0,
                };
                let (month, day, hour) = (
                    u32::try_from(month).map_err(|_| parse_err(format!("invalid month {}", month)))?,
                    u32::try_from(day).map_err(|_| parse_err(format!("invalid day {}", day)))?,
                    u32::try_from(hour).map_err(|_| parse_err(format!("invalid hour {}", hour)))?,
                );
                compose_time(year, month, day, hour).map_err(parse_err)
            }
        }
    }
}

fn parse_number(raw: &str, column: &str, line: usize) -> Result<f64, TrackError> {
    raw.parse::<f64>().map_err(|_| TrackError::Parse {
        line,
        message: format!("{} value '{}' is not a number", column, raw),
    })
}

/// Integer calendar field; "1980" and "1980.0" are both accepted.
fn parse_whole(raw: &str, column: &str, line: usize) -> Result<i32, TrackError> {
    let bad = || TrackError::Parse {
        line,
        message: format!("{} value '{}' is not a whole number", column, raw),
    };

    if let Ok(v) = raw.parse::<i32>() {
        return Ok(v);
    }
    let v = raw.parse::<f64>().map_err(|_| bad())?;
    if v.is_finite() && v.fract() == 0.0 && v.abs() <= i32::MAX as f64 {
        Ok(v as i32)
    } else {
        Err(bad())
    }
}

/// Parses a column as floats, or `None` if any non-empty cell is not a
/// number. A column with no non-empty cell stays a string attribute.
fn numeric_column(cells: &[&str]) -> Option<Vec<f64>> {
    if cells.iter().all(|c| c.is_empty()) {
        return None;
    }
    cells
        .iter()
        .map(|c| if c.is_empty() { Some(f64::NAN) } else { c.parse::<f64>().ok() })
        .collect()
}
