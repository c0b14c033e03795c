/// Wind and pressure units.
///
/// Track files label units loosely ("m s-1", "m/s", "m s**-1", "kt",
/// "knots", ...). These parsers accept the common spellings; anything else
/// is left to the caller, which logs a warning and falls back to a default.

use std::str::FromStr;

/// Metres per second in one knot.
pub const MS_PER_KNOT: f64 = 0.514_444;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindUnit {
    MetersPerSecond,
    CentimetersPerSecond,
    KilometersPerSecond,
    KilometersPerHour,
    Knots,
    MilesPerHour,
}

impl WindUnit {
    /// Multiplier taking a value in this unit to m s⁻¹.
    pub fn to_ms_factor(self) -> f64 {
        match self {
            WindUnit::MetersPerSecond => 1.0,
            WindUnit::CentimetersPerSecond => 0.01,
            WindUnit::KilometersPerSecond => 1000.0,
            WindUnit::KilometersPerHour => 1000.0 / 3600.0,
            WindUnit::Knots => MS_PER_KNOT,
            WindUnit::MilesPerHour => 0.447_04,
        }
    }

    pub fn convert(self, value: f64, to: WindUnit) -> f64 {
        if self == to {
            return value;
        }
        value * self.to_ms_factor() / to.to_ms_factor()
    }
}

impl FromStr for WindUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        let unit = match key.as_str() {
            "ms-1" | "m/s" | "ms**-1" | "ms^-1" | "m.s-1" | "mps" | "meterpersecond" | "meters/second" => {
                WindUnit::MetersPerSecond
            }
            "cms-1" | "cm/s" | "cms**-1" | "cms^-1" => WindUnit::CentimetersPerSecond,
            "kms-1" | "km/s" | "kms**-1" | "kms^-1" => WindUnit::KilometersPerSecond,
            "kmh-1" | "km/h" | "kmh**-1" | "kph" | "kmph" => WindUnit::KilometersPerHour,
            "kt" | "kts" | "knot" | "knots" => WindUnit::Knots,
            "mph" | "mih-1" | "mi/h" => WindUnit::MilesPerHour,
            _ => return Err(format!("unrecognized wind unit '{}'", s)),
        };
        Ok(unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureUnit {
    Pascal,
    Hectopascal,
    Kilopascal,
}

impl PressureUnit {
    /// Multiplier taking a value in this unit to hPa.
    pub fn to_hpa_factor(self) -> f64 {
        match self {
            PressureUnit::Pascal => 0.01,
            PressureUnit::Hectopascal => 1.0,
            PressureUnit::Kilopascal => 10.0,
        }
    }
}

impl FromStr for PressureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = match normalize(s).as_str() {
            "pa" | "pascal" | "pascals" => PressureUnit::Pascal,
            "hpa" | "mb" | "mbar" | "millibar" | "millibars" | "hectopascal" => PressureUnit::Hectopascal,
            "kpa" | "kilopascal" => PressureUnit::Kilopascal,
            _ => return Err(format!("unrecognized pressure unit '{}'", s)),
        };
        Ok(unit)
    }
}

/// Lower-cases and strips whitespace so "m s-1", "M S-1" and "ms-1" agree.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}
