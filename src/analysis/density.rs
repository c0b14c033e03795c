//! Track density maps.
//!
//! Turns a scatter of (lon, lat) observations into a regular lat/lon grid
//! of densities, either by counting points per cell and dividing by the
//! cell's spherical area, or by a Gaussian kernel density estimate on the
//! sphere's angular coordinates.

use std::str::FromStr;

use ndarray::{s, Array2, Axis};
use serde::Deserialize;

use crate::logging::{self, Component};
use crate::model::TrackError;

/// Earth radius used for cell areas, in metres.
pub const EARTH_AVG_RADIUS_M: f64 = 6_371_008.7714;

/// Spatial dimensions of the KDE sample (lat, lon).
const KDE_DIMENSIONS: f64 = 2.0;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DensityMethod {
    /// Point counts per cell divided by the cell area (points per m²).
    #[default]
    Histogram,
    /// Gaussian kernel density on (lat, lon) in radians.
    Kde,
}

impl FromStr for DensityMethod {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "histogram" => Ok(DensityMethod::Histogram),
            "kde" => Ok(DensityMethod::Kde),
            _ => Err(TrackError::UnsupportedMethod(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DensityOptions {
    pub method: DensityMethod,
    /// Cell size in degrees, both axes.
    pub bin_size: f64,
    /// `None` picks (-180, 180) if any longitude is negative, else (0, 360).
    pub lon_range: Option<(f64, f64)>,
    pub lat_range: (f64, f64),
    /// Trim the result to the bounding box of non-zero cells.
    pub crop: bool,
    /// KDE bandwidth in radians; `None` uses Scott's rule.
    pub bandwidth: Option<f64>,
}

impl Default for DensityOptions {
    fn default() -> Self {
        Self {
            method: DensityMethod::Histogram,
            bin_size: 5.0,
            lon_range: None,
            lat_range: (-90.0, 90.0),
            crop: false,
            bandwidth: None,
        }
    }
}

impl DensityOptions {
    /// Rejects option combinations that cannot produce a grid.
    pub fn validate(&self) -> Result<(), TrackError> {
        if !self.bin_size.is_finite() || self.bin_size <= 0.0 {
            return Err(TrackError::InvalidArgument(format!(
                "bin_size must be a positive number, got {}",
                self.bin_size
            )));
        }
        check_range("lat_range", self.lat_range)?;
        if let Some(range) = self.lon_range {
            check_range("lon_range", range)?;
        }
        if let Some(bw) = self.bandwidth {
            if !bw.is_finite() || bw <= 0.0 {
                return Err(TrackError::InvalidArgument(format!(
                    "bandwidth must be a positive number, got {}",
                    bw
                )));
            }
        }
        Ok(())
    }
}

fn check_range(name: &str, (lo, hi): (f64, f64)) -> Result<(), TrackError> {
    if lo.is_finite() && hi.is_finite() && lo < hi {
        Ok(())
    } else {
        Err(TrackError::InvalidArgument(format!(
            "{} must be increasing, got ({}, {})",
            name, lo, hi
        )))
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Density values on a regular grid.
///
/// `values` has one row per latitude centre and one column per longitude
/// centre. Centres are increasing and exactly `bin_size` apart.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub values: Array2<f64>,
    pub bin_size: f64,
}

impl DensityGrid {
    /// Spherical area of each cell in m², same shape as `values`.
    pub fn cell_areas(&self) -> Array2<f64> {
        let half = self.bin_size / 2.0;
        let to_edges = |centres: &[f64]| -> Vec<f64> {
            centres
                .iter()
                .map(|c| c - half)
                .chain(centres.last().map(|c| c + half))
                .collect()
        };
        cell_areas(&to_edges(&self.lon), &to_edges(&self.lat))
    }

    /// Sum of density times cell area. For a histogram grid this recovers
    /// the number of points that fell inside the domain.
    pub fn integrate(&self) -> f64 {
        (&self.values * &self.cell_areas()).sum()
    }
}

// ---------------------------------------------------------------------------
// Density
// ---------------------------------------------------------------------------

/// Computes a track density grid from parallel longitude and latitude
/// columns.
///
/// The inputs are only read; longitude frame detection works on the values
/// as given.
pub fn density(lon: &[f64], lat: &[f64], options: &DensityOptions) -> Result<DensityGrid, TrackError> {
    if lon.len() != lat.len() {
        return Err(TrackError::LengthMismatch {
            column: "lat".to_string(),
            expected: lon.len(),
            found: lat.len(),
        });
    }
    options.validate()?;

    let lon_range = options
        .lon_range
        .unwrap_or_else(|| default_lon_range(lon));

    let x_edge = edges(lon_range, options.bin_size);
    let y_edge = edges(options.lat_range, options.bin_size);
    let x_mid = midpoints(&x_edge);
    let y_mid = midpoints(&y_edge);

    let values = match options.method {
        DensityMethod::Histogram => {
            let counts = histogram2d(lon, lat, &x_edge, &y_edge);
            counts / &cell_areas(&x_edge, &y_edge)
        }
        DensityMethod::Kde => kde(lon, lat, &x_mid, &y_mid, options.bandwidth)?,
    };

    logging::debug(
        Component::Density,
        None,
        &format!(
            "{:?} density over {} points on a {}x{} grid",
            options.method,
            lon.len(),
            y_mid.len(),
            x_mid.len()
        ),
    );

    let grid = DensityGrid {
        lon: x_mid,
        lat: y_mid,
        values,
        bin_size: options.bin_size,
    };

    if options.crop {
        crop(&grid)
    } else {
        Ok(grid)
    }
}

/// Global longitude frame matching the data.
pub fn default_lon_range(lon: &[f64]) -> (f64, f64) {
    if lon.iter().any(|&x| x < 0.0) {
        (-180.0, 180.0)
    } else {
        (0.0, 360.0)
    }
}

/// Bin edges `start, start + bin, ...` reaching at least `stop`. When the
/// span is not a whole number of bins the last edge overshoots `stop`.
pub fn edges((start, stop): (f64, f64), bin_size: f64) -> Vec<f64> {
    let span = (stop - start) / bin_size + 1.0;
    // Tolerance keeps an exact multiple from gaining a spurious edge.
    let n = (span - 1e-9).ceil().max(2.0) as usize;
    (0..n).map(|i| start + i as f64 * bin_size).collect()
}

fn midpoints(edges: &[f64]) -> Vec<f64> {
    edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
}

/// Index of the bin holding `v`: bins are `[e_i, e_{i+1})` except the last,
/// which also holds its right edge.
fn bin_index(v: f64, edges: &[f64]) -> Option<usize> {
    let n_bins = edges.len() - 1;
    let (first, last) = (edges[0], edges[n_bins]);
    if !v.is_finite() || v < first || v > last {
        return None;
    }
    if v == last {
        return Some(n_bins - 1);
    }
    // partition_point gives the first edge strictly greater than v.
    let upper = edges.partition_point(|&e| e <= v);
    Some(upper.saturating_sub(1).min(n_bins - 1))
}

/// Point counts per cell, rows by latitude bin, columns by longitude bin.
fn histogram2d(lon: &[f64], lat: &[f64], x_edge: &[f64], y_edge: &[f64]) -> Array2<f64> {
    let mut counts = Array2::<f64>::zeros((y_edge.len() - 1, x_edge.len() - 1));
    for (&x, &y) in lon.iter().zip(lat) {
        if let (Some(col), Some(row)) = (bin_index(x, x_edge), bin_index(y, y_edge)) {
            counts[[row, col]] += 1.0;
        }
    }
    counts
}

/// Area of each cell on the sphere: `R² · Δ(sin φ) · Δλ`.
fn cell_areas(x_edge: &[f64], y_edge: &[f64]) -> Array2<f64> {
    let r2 = EARTH_AVG_RADIUS_M * EARTH_AVG_RADIUS_M;
    let dsin: Vec<f64> = y_edge
        .windows(2)
        .map(|w| w[1].to_radians().sin() - w[0].to_radians().sin())
        .collect();
    let dlon: Vec<f64> = x_edge
        .windows(2)
        .map(|w| w[1].to_radians() - w[0].to_radians())
        .collect();

    Array2::from_shape_fn((dsin.len(), dlon.len()), |(i, j)| r2 * dsin[i] * dlon[j])
}

/// Scott's rule bandwidth for `n` samples in `d` dimensions.
pub fn scott_bandwidth(n: usize, d: f64) -> f64 {
    (n as f64).powf(-1.0 / (d + 4.0))
}

/// Gaussian KDE evaluated at every cell centre.
///
/// Samples and evaluation points are (lat, lon) in radians with a
/// Euclidean metric. Densities are accumulated as log-densities with a
/// log-sum-exp and exponentiated at the end.
fn kde(
    lon: &[f64],
    lat: &[f64],
    x_mid: &[f64],
    y_mid: &[f64],
    bandwidth: Option<f64>,
) -> Result<Array2<f64>, TrackError> {
    let samples: Vec<(f64, f64)> = lat
        .iter()
        .zip(lon)
        .filter(|(y, x)| y.is_finite() && x.is_finite())
        .map(|(y, x)| (y.to_radians(), x.to_radians()))
        .collect();

    if samples.is_empty() {
        return Err(TrackError::InvalidArgument(
            "kernel density estimation needs at least one finite point".to_string(),
        ));
    }

    let n = samples.len();
    let h = bandwidth.unwrap_or_else(|| scott_bandwidth(n, KDE_DIMENSIONS));
    let two_h2 = 2.0 * h * h;
    let log_norm = (n as f64).ln() + (std::f64::consts::PI * two_h2).ln();

    let mut exponents = vec![0.0; n];
    let values = Array2::from_shape_fn((y_mid.len(), x_mid.len()), |(i, j)| {
        let (gy, gx) = (y_mid[i].to_radians(), x_mid[j].to_radians());
        for (e, &(sy, sx)) in exponents.iter_mut().zip(&samples) {
            let d2 = (gy - sy).powi(2) + (gx - sx).powi(2);
            *e = -d2 / two_h2;
        }
        (log_sum_exp(&exponents) - log_norm).exp()
    });

    Ok(values)
}

fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

/// Trims a grid to the rows and columns between the first and last
/// positive cell along each axis.
///
/// Fails with `TrackError::EmptyGrid` when nothing is positive.
pub fn crop(grid: &DensityGrid) -> Result<DensityGrid, TrackError> {
    let has_data = grid.values.mapv(|v| v > 0.0);
    let rows: Vec<usize> = has_data
        .axis_iter(Axis(0))
        .enumerate()
        .filter(|(_, row)| row.iter().any(|&b| b))
        .map(|(i, _)| i)
        .collect();
    let cols: Vec<usize> = has_data
        .axis_iter(Axis(1))
        .enumerate()
        .filter(|(_, col)| col.iter().any(|&b| b))
        .map(|(j, _)| j)
        .collect();

    let (Some(&r0), Some(&r1), Some(&c0), Some(&c1)) =
        (rows.first(), rows.last(), cols.first(), cols.last())
    else {
        return Err(TrackError::EmptyGrid);
    };

    Ok(DensityGrid {
        lon: grid.lon[c0..=c1].to_vec(),
        lat: grid.lat[r0..=r1].to_vec(),
        values: grid.values.slice(s![r0..=r1, c0..=c1]).to_owned(),
        bin_size: grid.bin_size,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_method_parsing_is_closed() {
        assert_eq!("histogram".parse::<DensityMethod>().unwrap(), DensityMethod::Histogram);
        assert_eq!("KDE".parse::<DensityMethod>().unwrap(), DensityMethod::Kde);
        match "foo".parse::<DensityMethod>() {
            Err(TrackError::UnsupportedMethod(m)) => assert_eq!(m, "foo"),
            other => panic!("expected UnsupportedMethod, got {:?}", other),
        }
    }

    #[test]
    fn test_default_lon_range_follows_sign_of_data() {
        assert_eq!(default_lon_range(&[10.0, 200.0]), (0.0, 360.0));
        assert_eq!(default_lon_range(&[10.0, -20.0]), (-180.0, 180.0));
        assert_eq!(default_lon_range(&[]), (0.0, 360.0));
    }

    #[test]
    fn test_edge_counts_cover_the_range() {
        assert_eq!(edges((-90.0, 90.0), 5.0).len(), 37);
        assert_eq!(edges((0.0, 360.0), 5.0).len(), 73);
        // Non-divisible span: the last edge overshoots the stop.
        let e = edges((0.0, 10.0), 3.0);
        assert_eq!(e, vec![0.0, 3.0, 6.0, 9.0, 12.0]);
    }

    #[test]
    fn test_centres_are_increasing_and_evenly_spaced() {
        let options = DensityOptions {
            bin_size: 2.5,
            ..DensityOptions::default()
        };
        let grid = density(&[100.0, 120.0], &[10.0, 20.0], &options).unwrap();
        for axis in [&grid.lon, &grid.lat] {
            for w in axis.windows(2) {
                assert!(w[1] > w[0]);
                assert_abs_diff_eq!(w[1] - w[0], 2.5, epsilon = 1e-9);
            }
        }
        assert_eq!(grid.lat.first().copied(), Some(-88.75));
        assert_eq!(grid.lon.first().copied(), Some(1.25));
        assert_eq!(grid.values.dim(), (72, 144));
    }

    #[test]
    fn test_histogram_places_points_in_expected_cells() {
        let grid = density(&[2.0, 3.0, 12.0], &[1.0, 4.9, -7.0], &DensityOptions::default()).unwrap();
        // lat 0..5 is row 18, lon 0..5 is column 0.
        let area = grid.cell_areas();
        assert_relative_eq!(grid.values[[18, 0]] * area[[18, 0]], 2.0, max_relative = 1e-12);
        // lat -10..-5 is row 16, lon 10..15 is column 2.
        assert_relative_eq!(grid.values[[16, 2]] * area[[16, 2]], 1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_histogram_integrates_to_point_count() {
        let lon = [5.0, 45.0, 90.0, 180.0, 270.0, 359.0, 0.0, 360.0];
        let lat = [-89.0, -45.0, 0.0, 10.0, 45.0, 89.9, 90.0, -90.0];
        let grid = density(&lon, &lat, &DensityOptions::default()).unwrap();
        assert_relative_eq!(grid.integrate(), lon.len() as f64, max_relative = 1e-9);
    }

    #[test]
    fn test_points_outside_domain_are_ignored() {
        let options = DensityOptions {
            lon_range: Some((100.0, 180.0)),
            lat_range: (0.0, 40.0),
            ..DensityOptions::default()
        };
        let grid = density(&[120.0, 50.0, 130.0], &[15.0, 15.0, -5.0], &options).unwrap();
        assert_relative_eq!(grid.integrate(), 1.0, max_relative = 1e-9);
    }

    #[test]
    fn test_cell_area_shrinks_towards_pole() {
        let grid = density(&[1.0], &[1.0], &DensityOptions::default()).unwrap();
        let area = grid.cell_areas();
        assert!(area[[18, 0]] > area[[35, 0]]);
        // Whole-sphere area from the cells.
        let total = 4.0 * std::f64::consts::PI * EARTH_AVG_RADIUS_M.powi(2);
        assert_relative_eq!(area.sum(), total, max_relative = 1e-9);
    }

    #[test]
    fn test_kde_peaks_at_the_cluster() {
        let lon = [150.0, 151.0, 149.0, 150.5];
        let lat = [-20.0, -21.0, -19.0, -20.5];
        let options = DensityOptions {
            method: DensityMethod::Kde,
            bandwidth: Some(0.05),
            ..DensityOptions::default()
        };
        let grid = density(&lon, &lat, &options).unwrap();
        let (mut best, mut best_at) = (f64::MIN, (0, 0));
        for ((i, j), &v) in grid.values.indexed_iter() {
            if v > best {
                best = v;
                best_at = (i, j);
            }
        }
        assert!((grid.lat[best_at.0] - (-20.0)).abs() <= 2.5);
        assert!((grid.lon[best_at.1] - 150.0).abs() <= 2.5);
        assert!(grid.values.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_kde_single_point_matches_gaussian() {
        let h = 0.1;
        let options = DensityOptions {
            method: DensityMethod::Kde,
            bandwidth: Some(h),
            ..DensityOptions::default()
        };
        let grid = density(&[2.5], &[2.5], &options).unwrap();
        // Point sits exactly on the centre of row 18, column 0.
        let peak = 1.0 / (2.0 * std::f64::consts::PI * h * h);
        assert_relative_eq!(grid.values[[18, 0]], peak, max_relative = 1e-12);
    }

    #[test]
    fn test_scott_bandwidth() {
        assert_relative_eq!(scott_bandwidth(64, 2.0), 0.5, max_relative = 1e-12);
    }

    #[test]
    fn test_kde_without_points_is_invalid() {
        let options = DensityOptions {
            method: DensityMethod::Kde,
            ..DensityOptions::default()
        };
        assert!(matches!(
            density(&[], &[], &options),
            Err(TrackError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_invalid_options_rejected_before_computing() {
        let bad_bin = DensityOptions {
            bin_size: 0.0,
            ..DensityOptions::default()
        };
        assert!(matches!(density(&[1.0], &[1.0], &bad_bin), Err(TrackError::InvalidArgument(_))));

        let bad_range = DensityOptions {
            lat_range: (10.0, -10.0),
            ..DensityOptions::default()
        };
        assert!(matches!(density(&[1.0], &[1.0], &bad_range), Err(TrackError::InvalidArgument(_))));

        assert!(matches!(
            density(&[1.0, 2.0], &[1.0], &DensityOptions::default()),
            Err(TrackError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_crop_returns_exact_sub_block() {
        let mut values = Array2::<f64>::zeros((8, 6));
        values[[2, 3]] = 1.0;
        values[[5, 4]] = 2.0;
        values[[3, 3]] = 0.5;
        let grid = DensityGrid {
            lon: (0..6).map(|j| j as f64).collect(),
            lat: (0..8).map(|i| i as f64).collect(),
            values,
            bin_size: 1.0,
        };

        let cropped = crop(&grid).unwrap();
        assert_eq!(cropped.lat, vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(cropped.lon, vec![3.0, 4.0]);
        assert_eq!(cropped.values, grid.values.slice(s![2..6, 3..5]).to_owned());
    }

    #[test]
    fn test_crop_of_empty_grid_is_an_error() {
        let options = DensityOptions {
            lon_range: Some((0.0, 20.0)),
            lat_range: (0.0, 20.0),
            crop: true,
            ..DensityOptions::default()
        };
        assert!(matches!(density(&[], &[], &options), Err(TrackError::EmptyGrid)));
    }

    #[test]
    fn test_density_does_not_touch_inputs() {
        let lon = vec![-10.0, 350.0];
        let lat = vec![0.0, 0.0];
        let _ = density(&lon, &lat, &DensityOptions::default()).unwrap();
        assert_eq!(lon, vec![-10.0, 350.0]);
    }
}
