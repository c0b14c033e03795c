//! Pressure-based intensity categories.
//!
//! Minimum sea-level pressure tracks intensity well and is available for
//! model output where 10 m winds are unreliable. Two threshold sets are
//! supported: Klotzbach et al. (2020) and the original Simpson scale.

use std::str::FromStr;

use serde::Deserialize;

use super::classify;
use super::units::PressureUnit;
use crate::logging::{self, Component};
use crate::model::{TrackError, Variable};

/// Minimum above which an unlabelled pressure series is taken to be in Pa.
const PA_DETECTION_THRESHOLD: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureConvention {
    #[default]
    #[serde(alias = "Klotzbach")]
    Klotzbach,
    #[serde(alias = "Simpson")]
    Simpson,
}

impl PressureConvention {
    /// Upper bounds in hPa of categories 5 down to 0; at or above the last
    /// bound is -1.
    fn bounds_hpa(self) -> [f64; 6] {
        match self {
            PressureConvention::Klotzbach => [925.0, 945.0, 960.0, 975.0, 990.0, 1005.0],
            PressureConvention::Simpson => [920.0, 945.0, 965.0, 970.0, 980.0, 990.0],
        }
    }
}

impl FromStr for PressureConvention {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "klotzbach" => Ok(PressureConvention::Klotzbach),
            "simpson" => Ok(PressureConvention::Simpson),
            _ => Err(TrackError::UnsupportedOption {
                option: "pressure convention",
                value: s.to_string(),
            }),
        }
    }
}

const PRESSURE_LABELS: [i8; 6] = [5, 4, 3, 2, 1, 0];

/// Pressure category per sea-level pressure value.
///
/// With `slp_units` given, values are converted to hPa. Without units (or
/// with an unrecognised unit) a series whose minimum exceeds 10000 is
/// assumed to be in Pa; a warning is logged and the values are divided
/// by 100.
pub fn pressure_category(
    slp: &[f64],
    convention: PressureConvention,
    slp_units: Option<&str>,
) -> Vec<Option<i8>> {
    let hpa = to_hpa(slp, slp_units, Component::Category);
    let bounds = convention.bounds_hpa();

    hpa.iter()
        .map(|&p| classify(p, &bounds, &PRESSURE_LABELS, -1))
        .collect()
}

/// Pressure category using the variable's own unit metadata.
pub fn pressure_category_of(slp: &Variable, convention: PressureConvention) -> Vec<Option<i8>> {
    pressure_category(&slp.values, convention, slp.units.as_deref())
}

/// Converts a pressure series to hPa, guessing Pa vs hPa when unlabelled.
pub(crate) fn to_hpa(slp: &[f64], slp_units: Option<&str>, component: Component) -> Vec<f64> {
    let parsed = slp_units.map(|raw| raw.parse::<PressureUnit>());

    let unit = match parsed {
        Some(Ok(unit)) => unit,
        other => {
            if let Some(Err(reason)) = other {
                logging::warn(component, None, &reason);
            }
            guess_pressure_unit(slp, component)
        }
    };

    let factor = unit.to_hpa_factor();
    slp.iter().map(|&p| p * factor).collect()
}

fn guess_pressure_unit(slp: &[f64], component: Component) -> PressureUnit {
    let min = slp
        .iter()
        .copied()
        .filter(|p| !p.is_nan())
        .fold(f64::INFINITY, f64::min);

    if min.is_finite() && min > PA_DETECTION_THRESHOLD {
        logging::log_unit_assumption(
            component,
            "pressure",
            "Pa",
            "values exceed 10000, converting to hPa",
        );
        PressureUnit::Pascal
    } else {
        PressureUnit::Hectopascal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cats(slp: &[f64], convention: PressureConvention) -> Vec<i8> {
        pressure_category(slp, convention, Some("hPa"))
            .into_iter()
            .map(|c| c.expect("finite input has a category"))
            .collect()
    }

    #[test]
    fn test_klotzbach_boundaries() {
        let slp = [900.0, 925.0, 944.9, 945.0, 959.9, 960.0, 975.0, 989.9, 1004.9, 1005.0, 1015.0];
        assert_eq!(
            cats(&slp, PressureConvention::Klotzbach),
            vec![5, 4, 4, 3, 3, 2, 1, 1, 0, -1, -1]
        );
    }

    #[test]
    fn test_simpson_boundaries() {
        let slp = [915.0, 930.0, 950.0, 967.0, 975.0, 985.0, 995.0];
        assert_eq!(
            cats(&slp, PressureConvention::Simpson),
            vec![5, 4, 3, 2, 1, 0, -1]
        );
    }

    #[test]
    fn test_unlabelled_pascals_are_detected() {
        let pa = [95_000.0, 100_000.0, 101_000.0];
        let hpa = [950.0, 1000.0, 1010.0];
        assert_eq!(
            pressure_category(&pa, PressureConvention::Klotzbach, None),
            pressure_category(&hpa, PressureConvention::Klotzbach, Some("hPa"))
        );
    }

    #[test]
    fn test_labelled_units_are_trusted() {
        // Labelled hPa is taken at face value even when the numbers look like Pa.
        let slp = [100_000.0, 101_000.0];
        assert_eq!(
            pressure_category(&slp, PressureConvention::Klotzbach, Some("hPa")),
            vec![Some(-1); 2]
        );
        assert_eq!(
            pressure_category(&[93.0], PressureConvention::Klotzbach, Some("kPa")),
            vec![Some(4)]
        );
    }

    #[test]
    fn test_convention_parsing() {
        assert_eq!("Simpson".parse::<PressureConvention>().unwrap(), PressureConvention::Simpson);
        assert!(matches!(
            "saffir".parse::<PressureConvention>(),
            Err(TrackError::UnsupportedOption { .. })
        ));
    }

    #[test]
    fn test_nan_pressure_has_no_category() {
        assert_eq!(
            pressure_category(&[f64::NAN, 1000.0], PressureConvention::Simpson, None),
            vec![None, Some(-1)]
        );
    }
}
