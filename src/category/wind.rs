//! Saffir-Simpson hurricane wind scale.

use super::classify;
use super::units::WindUnit;
use crate::logging::{self, Component};
use crate::model::Variable;

/// Upper bounds (m s⁻¹) of categories -1 through 4; 70 m s⁻¹ and above is 5.
const SSHS_BOUNDS_MS: [f64; 6] = [18.0, 33.0, 42.0, 49.0, 58.0, 70.0];
const SSHS_LABELS: [i8; 6] = [-1, 0, 1, 2, 3, 4];

/// Saffir-Simpson category per wind value.
///
/// `wind_units` defaults to m s⁻¹. An unrecognised unit logs a warning and
/// m s⁻¹ is assumed.
pub fn saffir_simpson_category(wind: &[f64], wind_units: Option<&str>) -> Vec<Option<i8>> {
    let unit = resolve_wind_unit(wind_units, Component::Category);
    let factor = unit.to_ms_factor();

    wind.iter()
        .map(|&w| classify(w * factor, &SSHS_BOUNDS_MS, &SSHS_LABELS, 5))
        .collect()
}

/// Saffir-Simpson category using the variable's own unit metadata.
pub fn saffir_simpson_category_of(wind: &Variable) -> Vec<Option<i8>> {
    saffir_simpson_category(&wind.values, wind.units.as_deref())
}

/// Parses a wind unit, falling back to m s⁻¹ with a warning.
pub(crate) fn resolve_wind_unit(units: Option<&str>, component: Component) -> WindUnit {
    match units {
        None => WindUnit::MetersPerSecond,
        Some(raw) => raw.parse::<WindUnit>().unwrap_or_else(|reason| {
            logging::log_unit_assumption(component, "wind", "m s-1", &reason);
            WindUnit::MetersPerSecond
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_boundaries_in_ms() {
        let wind = [0.0, 17.9, 18.0, 32.9, 33.0, 41.9, 42.0, 48.9, 49.0, 57.9, 58.0, 69.9, 70.0, 95.0];
        let expected = [-1, -1, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5];
        let cats = saffir_simpson_category(&wind, None);
        assert_eq!(cats, expected.iter().map(|&c| Some(c)).collect::<Vec<_>>());
    }

    #[test]
    fn test_nan_wind_has_no_category() {
        assert_eq!(saffir_simpson_category(&[f64::NAN, 20.0], None), vec![None, Some(0)]);
    }

    #[test]
    fn test_units_rescale_before_thresholding() {
        let wind = [15.0, 20.0, 25.0];
        assert_eq!(saffir_simpson_category(&wind, Some("cm s-1")), vec![Some(-1); 3]);
        assert_eq!(saffir_simpson_category(&wind, Some("km s-1")), vec![Some(5); 3]);
        // 100 knots is about 51 m/s.
        assert_eq!(saffir_simpson_category(&[100.0], Some("knots")), vec![Some(3)]);
    }

    #[test]
    fn test_explicit_ms_matches_default() {
        let wind = [10.0, 35.0, 60.0];
        assert_eq!(
            saffir_simpson_category(&wind, Some("m s-1")),
            saffir_simpson_category(&wind, None)
        );
    }

    #[test]
    fn test_unknown_unit_falls_back_to_ms() {
        let wind = [35.0];
        assert_eq!(saffir_simpson_category(&wind, Some("cubits")), vec![Some(1)]);
    }

    #[test]
    fn test_variable_units_are_consulted() {
        let var = Variable::with_units(vec![30.0], "km s-1");
        assert_eq!(saffir_simpson_category_of(&var), vec![Some(5)]);
    }
}
