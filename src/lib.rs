//! Tropical-cyclone track analysis.
//!
//! Loads track files into a columnar `TrackSet` and derives diagnostics from
//! it: season labels, density maps, intensity categories, accumulated
//! cyclone energy and translation speed.
//!
//! Modules:
//! - `model`: shared track table, variables and error type.
//! - `ingest`: CSV track loading.
//! - `analysis`: season assignment, density, track statistics.
//! - `category`: Saffir-Simpson and pressure-based categories.
//! - `config`: TOML analysis configuration.
//! - `logging`: leveled console/file logging.

pub mod analysis;
pub mod category;
pub mod config;
pub mod geography;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod time;

pub use analysis::density::{density, DensityGrid, DensityMethod, DensityOptions};
pub use analysis::season::{assign_seasons, assign_track_seasons, Season, SeasonConvention};
pub use config::AnalysisConfig;
pub use ingest::csv::{load_csv, read_tracks};
pub use model::{TrackError, TrackSet, Variable};
