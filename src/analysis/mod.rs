/// Track diagnostics.
///
/// Every routine here borrows its input and returns freshly owned results;
/// none of them mutates a caller's `TrackSet`.
///
/// Submodules:
/// - `groupings`: per-track row grouping and modal values.
/// - `season`: hemisphere-aware season labels.
/// - `density`: histogram / KDE track density grids.
/// - `track_stats`: ACE, PACE, duration, genesis and extremum points.
/// - `translation`: translation speed between consecutive points.

pub mod density;
pub mod groupings;
pub mod season;
pub mod track_stats;
pub mod translation;
