/// Track file loading.
///
/// - `csv`: comma-separated track tables (IBTrACS-style exports and
///   TempestExtremes StitchNodes output converted to CSV).

pub mod csv;
