//! Per-source extraction and the aggregation/writing stages shared by both sources.

pub mod aggregate;
pub mod aod;
pub mod error;
pub mod merra;
pub mod timestamp;
pub mod values;
pub mod writer;

use crate::grid::coordinates::{CoordinateArray, Grid};
use crate::pipeline::error::ExtractError;
use crate::reader::{GridFile, VariableInfo, VariableQuery};
use crate::types::observation::Observation;

/// What one source file contributed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileExtraction {
    /// One per site per timestamp in the file; values aligned with the pipeline's columns.
    pub observations: Vec<Observation>,
    /// Requested variables found in this file.
    pub variables_present: Vec<String>,
    /// Requested variables absent from this file.
    pub skipped_variables: Vec<String>,
}

pub(crate) fn latitude_query() -> VariableQuery {
    VariableQuery::exact(["Latitude", "lat"]).or_containing(["lat"])
}

pub(crate) fn longitude_query() -> VariableQuery {
    VariableQuery::exact(["Longitude", "lon"]).or_containing(["lon"])
}

/// Locates both coordinate variables without reading them.
pub(crate) fn coordinate_variables(
    file: &dyn GridFile,
) -> Result<(VariableInfo, VariableInfo), ExtractError> {
    let lat = file.require(&latitude_query())?;
    let lon = file.require(&longitude_query())?;
    Ok((lat, lon))
}

/// Reads the coordinate arrays of `file` into a normalized grid.
pub(crate) fn read_grid(file: &dyn GridFile) -> Result<Grid, ExtractError> {
    let (lat, lon) = coordinate_variables(file)?;
    grid_from_variables(file, lat, lon)
}

pub(crate) fn grid_from_variables(
    file: &dyn GridFile,
    lat: VariableInfo,
    lon: VariableInfo,
) -> Result<Grid, ExtractError> {
    let lat_values = file.read_all(&lat)?;
    let lon_values = file.read_all(&lon)?;
    let grid = Grid::from_coordinates(
        CoordinateArray::new(lat_values, lat.dimensions),
        CoordinateArray::new(lon_values, lon.dimensions),
    )?;
    Ok(grid)
}
