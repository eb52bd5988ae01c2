//! Defines the two independent data sources the crate extracts features from.

use std::fmt;

/// Identifies which gridded product a pipeline run reads.
///
/// The two sources never share state: each run resolves its own grid, keeps its
/// own aggregator and writes its own output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Satellite Aerosol Optical Depth swaths (e.g. MOSDAC HDF5 granules).
    /// Pixel geometry can shift between passes, so the grid is resolved per file.
    Aod,
    /// MERRA-2 hourly single-level reanalysis. The grid is fixed and resolved once.
    Merra2,
}

impl SourceKind {
    /// Name of the CSV file the Feature Writer produces for this source.
    pub fn output_file_name(&self) -> &'static str {
        match self {
            SourceKind::Aod => "aod_daily_features.csv",
            SourceKind::Merra2 => "merra_daily_features.csv",
        }
    }

    pub(crate) fn default_extensions(&self) -> Vec<String> {
        let extensions: &[&str] = match self {
            SourceKind::Aod => &["h5"],
            SourceKind::Merra2 => &["nc4"],
        };
        extensions.iter().map(|e| e.to_string()).collect()
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Aod => write!(f, "AOD"),
            SourceKind::Merra2 => write!(f, "MERRA-2"),
        }
    }
}
