use crate::grid::error::GridError;
use crate::reader::error::ReaderError;
use std::path::PathBuf;
use thiserror::Error;

/// Reasons a single source file could not be turned into observations.
/// All of them are absorbed per file by the pipelines.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Reader(#[from] ReaderError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("Unrecognized time units {1:?} in '{0}'")]
    TimeUnits(PathBuf, Option<String>),

    #[error("Could not read the modification time of '{0}'")]
    Timestamp(PathBuf, #[source] std::io::Error),

    #[error("Time value {value} in '{path}' is out of range")]
    TimeOutOfRange { path: PathBuf, value: f64 },

    #[error("None of the requested variables are present in '{0}'")]
    NoVariables(PathBuf),

    #[error("The reference grid has not been resolved")]
    GridNotResolved,
}
