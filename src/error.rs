use crate::pipeline::error::ExtractError;
use crate::reader::error::ReaderError;
use crate::sites::error::SiteError;
use crate::types::source::SourceKind;
use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error(transparent)]
    Sites(#[from] SiteError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Reader(#[from] ReaderError),

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error("Failed to list input directory '{0}'")]
    ReadDir(PathBuf, #[source] std::io::Error),

    #[error("No {kind} input files found in '{dir}'")]
    NoInputFiles { kind: SourceKind, dir: PathBuf },

    #[error("No {0} file yielded a usable grid")]
    NoUsableGrid(SourceKind),

    #[error("No usable {kind} observations were extracted")]
    NoObservations { kind: SourceKind },

    #[error("None of the requested variables {requested:?} were found in any file")]
    NoVariables { requested: Vec<String> },

    #[error("Failed to write CSV file '{0}'")]
    CsvWriteIo(PathBuf, #[source] std::io::Error),

    #[error("Failed to serialize CSV file '{0}'")]
    CsvWritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed to read config file '{0}'")]
    ConfigRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    ConfigParse(PathBuf, #[source] serde_json::Error),
}
