//! Satellite AOD granules: one timestamp per file, grid resolved per file.

use crate::grid::coordinates::GridShape;
use crate::grid::layout::ValueLayout;
use crate::grid::locate_cell::GridLocator;
use crate::pipeline::error::ExtractError;
use crate::pipeline::timestamp::timestamp_from_filename;
use crate::pipeline::values::ValueDecoder;
use crate::pipeline::{coordinate_variables, grid_from_variables, FileExtraction};
use crate::reader::{GridFile, VariableQuery};
use crate::sites::site_list::SiteList;
use crate::types::observation::Observation;
use crate::utils::file_modified_utc;
use chrono::{DateTime, Utc};
use log::debug;
use std::path::Path;

pub struct AodExtractor<'a> {
    sites: &'a SiteList,
    variable: String,
    query: VariableQuery,
}

impl<'a> AodExtractor<'a> {
    pub fn new(sites: &'a SiteList, variable: &str) -> Self {
        Self {
            sites,
            variable: variable.to_string(),
            query: VariableQuery::exact([variable]).or_containing([variable.to_lowercase()]),
        }
    }

    /// Output column name.
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Extracts one value per site from a granule.
    ///
    /// Missing coordinates, a missing AOD array or an unusable grid fail the whole
    /// file; the caller skips it. Shapes are checked before any coordinate is read.
    pub fn extract_file(&self, file: &dyn GridFile) -> Result<FileExtraction, ExtractError> {
        let value_var = file.require(&self.query)?;
        let (lat, lon) = coordinate_variables(file)?;
        let shape = GridShape::from_dimensions(&lat.dimensions, &lon.dimensions)?;
        let layout = ValueLayout::detect(&value_var.dimensions, &shape, None)?;
        let grid = grid_from_variables(file, lat, lon)?;
        let locator = GridLocator::new(&grid)?;
        let timestamp = granule_timestamp(file.path())?;
        let decoder = ValueDecoder::for_variable(file, &value_var);

        let mut observations = Vec::with_capacity(self.sites.len());
        for cell in locator.resolve(self.sites) {
            let raw = file.read(&value_var, &layout.cell_slab(cell.row, cell.col))?;
            let value = raw.first().and_then(|v| decoder.decode(*v));
            observations.push(Observation::new(cell.site, timestamp, vec![value]));
        }

        Ok(FileExtraction {
            observations,
            variables_present: vec![self.variable.clone()],
            skipped_variables: Vec::new(),
        })
    }
}

/// Filename token if present, otherwise the file's modification time.
fn granule_timestamp(path: &Path) -> Result<DateTime<Utc>, ExtractError> {
    if let Some(ts) = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(timestamp_from_filename)
    {
        return Ok(ts);
    }
    debug!(
        "No date token in '{}', falling back to its modification time",
        path.display()
    );
    file_modified_utc(path).map_err(|e| ExtractError::Timestamp(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::error::GridError;
    use crate::reader::{MemoryGridFile, ReaderError};
    use crate::sites::site_list::Site;
    use chrono::TimeZone;

    fn sites() -> SiteList {
        SiteList::from_sites(vec![
            Site::new("S1", 10.0, 80.0),
            Site::new("S2", 11.0, 81.0),
        ])
        .unwrap()
    }

    fn swath(name: &str) -> MemoryGridFile {
        // 2x2 swath, AOD stored transposed relative to the coordinates.
        MemoryGridFile::new(name)
            .with_variable(
                "/Geolocation/Latitude",
                &[("row", 2), ("col", 2)],
                vec![10.0, 10.0, 11.0, 11.0],
            )
            .with_variable(
                "/Geolocation/Longitude",
                &[("row", 2), ("col", 2)],
                vec![80.0, 81.0, 80.0, 81.0],
            )
            .with_variable("/Data/AOD", &[("col", 2), ("row", 2)], vec![0.1, 0.3, 0.2, 0.4])
            .with_attribute("/Data/AOD", "_FillValue", -999.0)
    }

    #[test]
    fn test_extracts_nearest_pixel_per_site() -> Result<(), ExtractError> {
        let sites = sites();
        let extractor = AodExtractor::new(&sites, "AOD");
        let result = extractor.extract_file(&swath("3RIMG_01JUL2023_1000_L2B_AOD.h5"))?;

        let expected_ts = Utc.with_ymd_and_hms(2023, 7, 1, 10, 0, 0).unwrap();
        assert_eq!(
            result.observations,
            vec![
                Observation::new("S1", expected_ts, vec![Some(0.1)]),
                Observation::new("S2", expected_ts, vec![Some(0.4)]),
            ]
        );
        assert_eq!(result.variables_present, ["AOD"]);
        Ok(())
    }

    #[test]
    fn test_fill_value_becomes_missing() -> Result<(), ExtractError> {
        let sites = sites();
        let file = swath("3RIMG_01JUL2023_1000.h5").with_variable(
            "/Data/AOD",
            &[("row", 2), ("col", 2)],
            vec![-999.0, 0.5, 0.5, 0.5],
        )
        .with_attribute("/Data/AOD", "_FillValue", -999.0);
        let result = AodExtractor::new(&sites, "AOD").extract_file(&file)?;
        assert_eq!(result.observations[0].values, vec![None]);
        assert!(result.observations[0].is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_aod_fails_the_file() {
        let sites = sites();
        let file = MemoryGridFile::new("3RIMG_01JUL2023_1000.h5")
            .with_variable("Latitude", &[("y", 1)], vec![10.0])
            .with_variable("Longitude", &[("x", 1)], vec![80.0]);
        let result = AodExtractor::new(&sites, "AOD").extract_file(&file);
        assert!(matches!(
            result,
            Err(ExtractError::Reader(ReaderError::MissingVariable { .. }))
        ));
    }

    #[test]
    fn test_flat_pixel_swath_fails_the_file() {
        let sites = sites();
        let file = MemoryGridFile::new("3RIMG_01JUL2023_1000.h5")
            .with_variable("Latitude", &[("pixel", 3)], vec![10.0, 10.5, 11.0])
            .with_variable("Longitude", &[("pixel", 3)], vec![80.0, 80.5, 81.0])
            .with_variable("AOD", &[("pixel", 3)], vec![0.1, 0.2, 0.3]);
        let result = AodExtractor::new(&sites, "AOD").extract_file(&file);
        assert!(matches!(
            result,
            Err(ExtractError::Grid(GridError::UnsupportedShape { .. }))
        ));
    }

    #[test]
    fn test_value_shape_is_checked_before_the_grid() {
        let sites = sites();
        let file = swath("3RIMG_01JUL2023_1000.h5").with_variable(
            "/Data/AOD",
            &[("row", 3), ("col", 2)],
            vec![0.1; 6],
        );
        let result = AodExtractor::new(&sites, "AOD").extract_file(&file);
        assert!(matches!(
            result,
            Err(ExtractError::Grid(GridError::ValueShape { .. }))
        ));
    }

    #[test]
    fn test_modification_time_fallback() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("granule_without_date.h5");
        std::fs::write(&path, b"")?;

        let ts = granule_timestamp(&path)?;
        assert_eq!(ts, file_modified_utc(&path)?);

        let missing = granule_timestamp(&dir.path().join("gone.h5"));
        assert!(matches!(missing, Err(ExtractError::Timestamp(_, _))));
        Ok(())
    }
}
