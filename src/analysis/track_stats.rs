//! Per-point and per-track statistics.
//!
//! Accumulated cyclone energy (ACE), pressure-based ACE (PACE), track
//! duration, genesis and extremum points, and a serialisable per-track
//! summary. Per-track results are keyed by track id in a `BTreeMap` so
//! their order is stable across runs.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDateTime;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::analysis::season::{assign_track_seasons, SeasonConvention};
use crate::category::pressure::to_hpa;
use crate::category::units::WindUnit;
use crate::category::wind::resolve_wind_unit;
use crate::logging::{self, Component};
use crate::model::{TrackError, TrackSet};

/// Reference environmental pressure (hPa) for the pressure-wind relation.
pub const REFERENCE_PRESSURE_HPA: f64 = 1010.0;

/// ACE scaling: knots² to 10⁴ kt².
const ACE_SCALE: f64 = 1e-4;

// ---------------------------------------------------------------------------
// ACE
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AceOptions {
    /// Points with wind below this (knots) contribute nothing.
    pub threshold_knots: f64,
    /// Unit of wind values without their own metadata; `None` means m s⁻¹.
    pub wind_units: Option<String>,
}

impl Default for AceOptions {
    fn default() -> Self {
        Self {
            threshold_knots: 34.0,
            wind_units: None,
        }
    }
}

/// ACE contribution of each point: `1e-4 · v²` with `v` in knots, zero below
/// the threshold or where wind is missing.
pub fn ace_by_point(wind: &[f64], options: &AceOptions) -> Vec<f64> {
    let unit = resolve_wind_unit(options.wind_units.as_deref(), Component::Stats);
    wind.iter()
        .map(|&w| point_ace(unit.convert(w, WindUnit::Knots), options.threshold_knots))
        .collect()
}

fn point_ace(knots: f64, threshold_knots: f64) -> f64 {
    if knots.is_nan() || knots < threshold_knots {
        0.0
    } else {
        ACE_SCALE * knots * knots
    }
}

/// Total ACE per track from the named wind variable. The variable's own
/// units take precedence over `options.wind_units`.
pub fn ace_by_track(
    tracks: &TrackSet,
    wind_var: &str,
    options: &AceOptions,
) -> Result<BTreeMap<String, f64>, TrackError> {
    let wind = tracks.variable(wind_var)?;
    let effective = AceOptions {
        wind_units: wind.units.clone().or_else(|| options.wind_units.clone()),
        ..options.clone()
    };
    let per_point = ace_by_point(&wind.values, &effective);
    Ok(sum_by_track(tracks, &per_point))
}

fn sum_by_track(tracks: &TrackSet, per_point: &[f64]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for (id, value) in tracks.track_id.iter().zip(per_point) {
        *totals.entry(id.clone()).or_insert(0.0) += value;
    }
    totals
}

// ---------------------------------------------------------------------------
// PACE
// ---------------------------------------------------------------------------

/// Quadratic pressure-wind relationship
/// `wind = c0 + c1·dp + c2·dp²` with `dp = 1010 - pressure` (hPa).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureWindModel {
    pub coefficients: [f64; 3],
}

impl PressureWindModel {
    /// Least-squares fit on paired pressure (hPa) and wind samples.
    ///
    /// Pairs with a NaN on either side are ignored; at least three usable
    /// pairs are needed.
    pub fn fit(pressure_hpa: &[f64], wind: &[f64]) -> Result<Self, TrackError> {
        if pressure_hpa.len() != wind.len() {
            return Err(TrackError::LengthMismatch {
                column: "wind".to_string(),
                expected: pressure_hpa.len(),
                found: wind.len(),
            });
        }

        let mut ata = Matrix3::<f64>::zeros();
        let mut aty = Vector3::<f64>::zeros();
        let mut used = 0usize;

        for (&p, &w) in pressure_hpa.iter().zip(wind) {
            if p.is_nan() || w.is_nan() {
                continue;
            }
            let dp = REFERENCE_PRESSURE_HPA - p;
            let row = Vector3::new(1.0, dp, dp * dp);
            ata += row * row.transpose();
            aty += row * w;
            used += 1;
        }

        if used < 3 {
            return Err(TrackError::InvalidArgument(format!(
                "pressure-wind fit needs at least 3 paired values, got {}",
                used
            )));
        }

        let c = ata.lu().solve(&aty).ok_or_else(|| {
            TrackError::InvalidArgument("pressure-wind fit is singular".to_string())
        })?;

        Ok(Self {
            coefficients: [c[0], c[1], c[2]],
        })
    }

    /// Modelled wind for a pressure in hPa.
    pub fn predict(&self, pressure_hpa: f64) -> f64 {
        let dp = REFERENCE_PRESSURE_HPA - pressure_hpa;
        let [c0, c1, c2] = self.coefficients;
        c0 + c1 * dp + c2 * dp * dp
    }
}

/// Where PACE gets its pressure-wind relationship from.
#[derive(Debug, Clone, Copy)]
pub enum WindSource<'a> {
    /// Fit a fresh model against these wind values.
    Fit(&'a [f64]),
    /// Reuse an existing model.
    Model(&'a PressureWindModel),
}

/// PACE per point: ACE of the wind implied by pressure.
///
/// Returns the per-point values and the model used, so a fit on one dataset
/// can be applied to another.
pub fn pace_by_point(
    pressure_hpa: &[f64],
    source: WindSource<'_>,
    options: &AceOptions,
) -> Result<(Vec<f64>, PressureWindModel), TrackError> {
    let model = match source {
        WindSource::Fit(wind) => PressureWindModel::fit(pressure_hpa, wind)?,
        WindSource::Model(model) => *model,
    };

    let modelled: Vec<f64> = pressure_hpa.iter().map(|&p| model.predict(p)).collect();
    Ok((ace_by_point(&modelled, options), model))
}

/// Total PACE per track. Pressure is converted to hPa from its units (or
/// guessed when unlabelled). With `WindSource::Fit` the wind slice must be
/// parallel to the track set.
pub fn pace_by_track(
    tracks: &TrackSet,
    pressure_var: &str,
    source: WindSource<'_>,
    options: &AceOptions,
) -> Result<(BTreeMap<String, f64>, PressureWindModel), TrackError> {
    let pressure = tracks.variable(pressure_var)?;
    let hpa = to_hpa(&pressure.values, pressure.units.as_deref(), Component::Stats);
    let (per_point, model) = pace_by_point(&hpa, source, options)?;
    Ok((sum_by_track(tracks, &per_point), model))
}

// ---------------------------------------------------------------------------
// Duration, genesis, extrema
// ---------------------------------------------------------------------------

/// Hours between each track's first and last observation.
pub fn duration(tracks: &TrackSet) -> BTreeMap<String, f64> {
    tracks
        .groups()
        .into_iter()
        .map(|(id, rows)| {
            let first = rows.iter().map(|&i| tracks.time[i]).min();
            let last = rows.iter().map(|&i| tracks.time[i]).max();
            let hours = match (first, last) {
                (Some(a), Some(b)) => (b - a).num_seconds() as f64 / 3600.0,
                _ => 0.0,
            };
            (id, hours)
        })
        .collect()
}

/// Earliest observation of each track, one row per track ordered by id.
pub fn genesis_points(tracks: &TrackSet) -> TrackSet {
    let mut picks: Vec<(String, usize)> = tracks
        .groups()
        .into_iter()
        .filter_map(|(id, rows)| {
            rows.iter()
                .copied()
                .min_by_key(|&i| tracks.time[i])
                .map(|i| (id, i))
        })
        .collect();
    picks.sort();
    let rows: Vec<usize> = picks.into_iter().map(|(_, i)| i).collect();
    tracks.select_rows(&rows)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Max,
    Min,
}

impl FromStr for Extremum {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max" => Ok(Extremum::Max),
            "min" => Ok(Extremum::Min),
            _ => Err(TrackError::UnsupportedOption {
                option: "extremum",
                value: s.to_string(),
            }),
        }
    }
}

/// Row at which each track reaches the max/min of `var`, ordered by id.
///
/// NaN values are skipped; ties keep the earliest row; tracks with no
/// finite value are left out.
pub fn extremum_points(tracks: &TrackSet, var: &str, extremum: Extremum) -> Result<TrackSet, TrackError> {
    let values = &tracks.variable(var)?.values;

    let mut picks: Vec<(String, usize)> = Vec::new();
    for (id, rows) in tracks.groups() {
        let mut best: Option<usize> = None;
        for &i in &rows {
            let v = values[i];
            if v.is_nan() {
                continue;
            }
            let better = match best {
                None => true,
                Some(b) => match extremum {
                    Extremum::Max => v > values[b],
                    Extremum::Min => v < values[b],
                },
            };
            if better {
                best = Some(i);
            }
        }
        match best {
            Some(i) => picks.push((id, i)),
            None => logging::debug(
                Component::Stats,
                Some(id.as_str()),
                &format!("no finite {} values", var),
            ),
        }
    }

    picks.sort();
    let rows: Vec<usize> = picks.into_iter().map(|(_, i)| i).collect();
    Ok(tracks.select_rows(&rows))
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Scalar description of one track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSummary {
    pub track_id: String,
    pub season: String,
    pub points: usize,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_hours: f64,
    pub max_wind: Option<f64>,
    /// Minimum pressure in hPa.
    pub min_pressure: Option<f64>,
    pub ace: Option<f64>,
}

/// One summary per track, ordered by track id.
///
/// Wind and pressure variables are optional; their fields stay `None` when
/// not requested.
pub fn summarize(
    tracks: &TrackSet,
    wind_var: Option<&str>,
    pressure_var: Option<&str>,
    convention: SeasonConvention,
    options: &AceOptions,
) -> Result<Vec<TrackSummary>, TrackError> {
    let seasons = assign_track_seasons(tracks, convention)?;
    let wind = wind_var.map(|name| tracks.variable(name)).transpose()?;
    let ace = wind_var
        .map(|name| ace_by_track(tracks, name, options))
        .transpose()?;
    let pressure_hpa = pressure_var
        .map(|name| {
            tracks
                .variable(name)
                .map(|p| to_hpa(&p.values, p.units.as_deref(), Component::Stats))
        })
        .transpose()?;

    let mut summaries = Vec::new();
    for (id, rows) in tracks.groups() {
        let (Some(start), Some(end)) = (
            rows.iter().map(|&i| tracks.time[i]).min(),
            rows.iter().map(|&i| tracks.time[i]).max(),
        ) else {
            continue;
        };

        let max_wind = wind.map(|w| finite_fold(rows.iter().map(|&i| w.values[i]), f64::max));
        let min_pressure = pressure_hpa
            .as_ref()
            .map(|p| finite_fold(rows.iter().map(|&i| p[i]), f64::min));

        summaries.push(TrackSummary {
            season: seasons[rows[0]].to_string(),
            points: rows.len(),
            start,
            end,
            duration_hours: (end - start).num_seconds() as f64 / 3600.0,
            max_wind: max_wind.flatten(),
            min_pressure: min_pressure.flatten(),
            ace: ace.as_ref().and_then(|totals| totals.get(&id).copied()),
            track_id: id,
        });
    }

    summaries.sort_by(|a, b| a.track_id.cmp(&b.track_id));
    logging::info(
        Component::Stats,
        None,
        &format!("summarized {} tracks", summaries.len()),
    );
    Ok(summaries)
}

fn finite_fold(values: impl Iterator<Item = f64>, f: fn(f64, f64) -> f64) -> Option<f64> {
    values.filter(|v| !v.is_nan()).reduce(f)
}

/// Pretty-printed JSON array of summaries.
pub fn summaries_to_json(summaries: &[TrackSummary]) -> Result<String, TrackError> {
    Ok(serde_json::to_string_pretty(summaries)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
