use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Failed to read ground-truth directory '{0}'")]
    ReadDir(PathBuf, #[source] std::io::Error),

    #[error("Expected {expected} ground-truth sites to map to coordinates, found {found}: {sites:?}")]
    CountMismatch {
        expected: usize,
        found: usize,
        sites: Vec<String>,
    },

    #[error("No sites configured")]
    NoSites,

    #[error("Site '{0}' is listed more than once")]
    DuplicateSite(String),

    #[error("Site '{site}' has an invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate {
        site: String,
        latitude: f64,
        longitude: f64,
    },
}
