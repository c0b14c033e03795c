//! Intensity categories for track points.
//!
//! - `wind`: Saffir-Simpson category from maximum wind.
//! - `pressure`: category from minimum sea-level pressure
//!   (Klotzbach or Simpson thresholds).
//! - `units`: wind/pressure unit parsing and conversion.
//!
//! Categories are `Option<i8>`: -1 for tropical depression, 0 for tropical
//! storm, 1-5 for hurricane categories, `None` where the input is NaN.

pub mod pressure;
pub mod units;
pub mod wind;

pub use pressure::{pressure_category, PressureConvention};
pub use wind::saffir_simpson_category;

/// Category for `value` given ascending upper bounds and their labels.
///
/// `value < bounds[i]` picks `labels[i]` for the first such `i`; anything at
/// or above the last bound gets `above`.
pub(crate) fn classify(value: f64, bounds: &[f64], labels: &[i8], above: i8) -> Option<i8> {
    if value.is_nan() {
        return None;
    }
    bounds
        .iter()
        .zip(labels)
        .find(|(bound, _)| value < **bound)
        .map(|(_, &label)| label)
        .or(Some(above))
}
