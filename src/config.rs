/// Analysis configuration
///
/// A TOML file with optional `[season]`, `[density]`, `[category]`, `[ace]`
/// and `[logging]` sections. Missing sections and keys take their defaults,
/// so an empty file is a valid configuration.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::analysis::density::{DensityMethod, DensityOptions};
use crate::analysis::season::SeasonConvention;
use crate::analysis::track_stats::AceOptions;
use crate::category::pressure::PressureConvention;
use crate::logging::{self, Component, LogLevel};
use crate::model::TrackError;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub season: SeasonConfig,
    pub density: DensityConfig,
    pub category: CategoryConfig,
    pub ace: AceOptions,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SeasonConfig {
    pub convention: SeasonConvention,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    pub method: DensityMethod,
    /// Degrees.
    pub bin_size: f64,
    pub lat_range: (f64, f64),
    pub lon_range: Option<(f64, f64)>,
    pub crop: bool,
    /// Radians; Scott's rule when absent.
    pub bandwidth: Option<f64>,
}

impl Default for DensityConfig {
    fn default() -> Self {
        let defaults = DensityOptions::default();
        Self {
            method: defaults.method,
            bin_size: defaults.bin_size,
            lat_range: defaults.lat_range,
            lon_range: defaults.lon_range,
            crop: defaults.crop,
            bandwidth: defaults.bandwidth,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    pub pressure_convention: PressureConvention,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
            timestamps: false,
        }
    }
}

impl AnalysisConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, TrackError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TrackError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;

        logging::debug(
            Component::Config,
            None,
            &format!("Loaded analysis configuration from {}", path.display()),
        );
        Ok(config)
    }

    /// Density options from the `[density]` section, validated.
    pub fn density_options(&self) -> Result<DensityOptions, TrackError> {
        let d = &self.density;
        let options = DensityOptions {
            method: d.method,
            bin_size: d.bin_size,
            lon_range: d.lon_range,
            lat_range: d.lat_range,
            crop: d.crop,
            bandwidth: d.bandwidth,
        };
        options.validate()?;
        Ok(options)
    }

    /// Installs the global logger from the `[logging]` section.
    pub fn init_logging(&self) {
        let l = &self.logging;
        logging::init_logger(l.level, l.file.as_deref(), l.timestamps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AnalysisConfig::from_toml_str("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.season.convention, SeasonConvention::Long);
        assert_eq!(config.density.bin_size, 5.0);
        assert_eq!(config.ace.threshold_knots, 34.0);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.density_options().unwrap(), DensityOptions::default());
    }

    #[test]
    fn test_full_file() {
        let text = r#"
[season]
convention = "short"

[density]
method = "kde"
bin_size = 2.5
lat_range = [-60.0, 0.0]
lon_range = [-180.0, 180.0]
crop = true
bandwidth = 0.1

[category]
pressure_convention = "simpson"

[ace]
threshold_knots = 35.0
wind_units = "knots"

[logging]
level = "warning"
timestamps = true
"#;
        let config = AnalysisConfig::from_toml_str(text).unwrap();
        assert_eq!(config.season.convention, SeasonConvention::Short);
        assert_eq!(config.category.pressure_convention, PressureConvention::Simpson);
        assert_eq!(config.ace.wind_units.as_deref(), Some("knots"));
        assert_eq!(config.logging.level, LogLevel::Warning);

        let options = config.density_options().unwrap();
        assert_eq!(options.method, DensityMethod::Kde);
        assert_eq!(options.lat_range, (-60.0, 0.0));
        assert_eq!(options.lon_range, Some((-180.0, 180.0)));
        assert!(options.crop);
        assert_eq!(options.bandwidth, Some(0.1));
    }

    #[test]
    fn test_bad_convention_is_config_error() {
        let result = AnalysisConfig::from_toml_str("[season]\nconvention = \"medium\"\n");
        assert!(matches!(result, Err(TrackError::Config(_))), "got {:?}", result);
    }

    #[test]
    fn test_bad_method_is_config_error() {
        let result = AnalysisConfig::from_toml_str("[density]\nmethod = \"voronoi\"\n");
        assert!(matches!(result, Err(TrackError::Config(_))));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result = AnalysisConfig::from_toml_str("[plotting]\ncmap = \"viridis\"\n");
        assert!(matches!(result, Err(TrackError::Config(_))));
    }

    #[test]
    fn test_invalid_bin_size_fails_validation() {
        let config = AnalysisConfig::from_toml_str("[density]\nbin_size = 0.0\n").unwrap();
        assert!(matches!(
            config.density_options(),
            Err(TrackError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[density]\nbin_size = 10.0").unwrap();

        let config = AnalysisConfig::load(file.path()).unwrap();
        assert_eq!(config.density.bin_size, 10.0);
        assert_eq!(config.density.method, DensityMethod::Histogram);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        assert!(matches!(
            AnalysisConfig::load("/nonexistent/analysis.toml"),
            Err(TrackError::Io(_))
        ));
    }
}
