mod config;
mod error;
mod features;
mod grid;
mod pipeline;
mod reader;
mod sites;
mod types;
mod utils;

pub use config::{RunConfig, CONFIG_ENV_VAR, DEFAULT_COORDINATES};
pub use error::FeatureError;
pub use features::*;

pub use grid::coordinates::{CoordinateArray, Grid, GridShape};
pub use grid::error::GridError;
pub use grid::layout::{Orientation, ValueLayout};
pub use grid::locate_cell::{GridLocator, ResolvedCell};

pub use pipeline::aggregate::{daily_mean, deduplicate, TemporalAggregator};
pub use pipeline::aod::AodExtractor;
pub use pipeline::error::ExtractError;
pub use pipeline::merra::Merra2Extractor;
pub use pipeline::timestamp::{timestamp_from_filename, TimeUnit, TimeUnits};
pub use pipeline::values::ValueDecoder;
pub use pipeline::writer::DailyFeatures;
pub use pipeline::FileExtraction;

pub use reader::{
    DefaultOpener, Dimension, FileFormat, GridFile, Hdf5GridFile, Hyperslab, MemoryAttribute,
    MemoryGridFile, MemoryOpener, NetcdfGridFile, OpenGridFile, ReaderError, VariableInfo,
    VariableQuery,
};

pub use sites::error::SiteError;
pub use sites::site_list::{Site, SiteList};

pub use types::grid_cell::GridCell;
pub use types::observation::{DailyFeatureRow, Observation};
pub use types::source::SourceKind;

pub use utils::{file_modified_utc, list_files_with_extensions};
