use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("Grid file '{0}' not found")]
    NotFound(PathBuf),

    #[error("Failed to probe the format of '{0}'")]
    Probe(PathBuf, #[source] std::io::Error),

    #[error("Unsupported grid file format: '{0}'")]
    UnsupportedFormat(PathBuf),

    #[error("Failed to open grid file '{0}'")]
    Open(PathBuf, #[source] netcdf::Error),

    #[error("Variable '{variable}' not found in '{path}'")]
    MissingVariable { path: PathBuf, variable: String },

    #[error("Failed to read variable '{variable}' from '{path}'")]
    Read {
        path: PathBuf,
        variable: String,
        #[source]
        source: netcdf::Error,
    },

    #[error("Hyperslab {start:?}+{count:?} is outside '{variable}' with shape {shape:?}")]
    OutOfBounds {
        variable: String,
        shape: Vec<usize>,
        start: Vec<usize>,
        count: Vec<usize>,
    },

    #[error("Variable '{variable}' holds {found} values but its dimensions require {expected}")]
    LengthMismatch {
        variable: String,
        expected: usize,
        found: usize,
    },
}
