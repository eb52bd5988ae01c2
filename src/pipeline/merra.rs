//! MERRA-2 reanalysis files: fixed grid resolved once, hourly time axis per file.

use crate::grid::coordinates::GridShape;
use crate::grid::error::GridError;
use crate::grid::layout::ValueLayout;
use crate::grid::locate_cell::{GridLocator, ResolvedCell};
use crate::pipeline::error::ExtractError;
use crate::pipeline::timestamp::TimeUnits;
use crate::pipeline::values::ValueDecoder;
use crate::pipeline::{coordinate_variables, read_grid, FileExtraction};
use crate::reader::{GridFile, VariableQuery};
use crate::sites::site_list::SiteList;
use crate::types::observation::Observation;
use chrono::{DateTime, Utc};
use log::{info, warn};

#[derive(Debug, Clone)]
struct ReferenceGrid {
    shape: GridShape,
    cells: Vec<ResolvedCell>,
}

pub struct Merra2Extractor<'a> {
    sites: &'a SiteList,
    variables: Vec<String>,
    reference: Option<ReferenceGrid>,
}

impl<'a> Merra2Extractor<'a> {
    pub fn new(sites: &'a SiteList, variables: Vec<String>) -> Self {
        Self {
            sites,
            variables,
            reference: None,
        }
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn is_resolved(&self) -> bool {
        self.reference.is_some()
    }

    /// Resolved cells of the reference grid, empty before [`Self::resolve_grid`] succeeds.
    pub fn resolved_cells(&self) -> &[ResolvedCell] {
        self.reference
            .as_ref()
            .map(|r| r.cells.as_slice())
            .unwrap_or_default()
    }

    /// Resolves every site against the grid of `file`; the result is reused for all later files.
    pub fn resolve_grid(&mut self, file: &dyn GridFile) -> Result<(), ExtractError> {
        let grid = read_grid(file)?;
        let locator = GridLocator::new(&grid)?;
        let cells = locator.resolve(self.sites);
        info!(
            "Resolved {} sites on the {}x{} MERRA-2 grid of '{}'",
            cells.len(),
            grid.shape().rows,
            grid.shape().cols,
            file.path().display()
        );
        self.reference = Some(ReferenceGrid {
            shape: grid.shape().clone(),
            cells,
        });
        Ok(())
    }

    /// Reads a single-cell time series per site for each requested variable present.
    ///
    /// A missing variable is recorded in `skipped_variables`. The file fails when its
    /// grid shape differs from the reference, its time axis cannot be decoded, or no
    /// requested variable is present.
    pub fn extract_file(&self, file: &dyn GridFile) -> Result<FileExtraction, ExtractError> {
        let reference = self.reference.as_ref().ok_or(ExtractError::GridNotResolved)?;
        let path = file.path().to_path_buf();

        let (lat, lon) = coordinate_variables(file)?;
        let shape = GridShape::from_dimensions(&lat.dimensions, &lon.dimensions)?;
        if shape.dims() != reference.shape.dims() {
            return Err(GridError::ShapeChanged {
                expected: reference.shape.dims(),
                found: shape.dims(),
            }
            .into());
        }

        let time_var = file.require(&VariableQuery::exact(["time"]))?;
        let units_attr = file.attribute_str(&time_var, "units");
        let units = units_attr
            .as_deref()
            .and_then(TimeUnits::parse)
            .ok_or_else(|| ExtractError::TimeUnits(path.clone(), units_attr.clone()))?;
        let timestamps = file
            .read_all(&time_var)?
            .into_iter()
            .map(|value| {
                units.to_utc(value).ok_or_else(|| ExtractError::TimeOutOfRange {
                    path: path.clone(),
                    value,
                })
            })
            .collect::<Result<Vec<DateTime<Utc>>, _>>()?;
        let time_dim = time_var
            .dimensions
            .first()
            .map_or("time", |d| d.name.as_str());
        let nt = timestamps.len();

        // observations[site * nt + t], values aligned with self.variables
        let mut observations: Vec<Observation> = reference
            .cells
            .iter()
            .flat_map(|cell| {
                timestamps.iter().map(move |ts| {
                    Observation::new(cell.site.clone(), *ts, vec![None; self.variables.len()])
                })
            })
            .collect();

        let mut present = Vec::new();
        let mut skipped = Vec::new();
        for (v, name) in self.variables.iter().enumerate() {
            let Some(var) = file.find_variable(&VariableQuery::exact([name.as_str()])) else {
                info!(
                    "'{}' has no {} variable, skipping it for this file",
                    path.display(),
                    name
                );
                skipped.push(name.clone());
                continue;
            };
            let layout = match ValueLayout::detect(&var.dimensions, &shape, Some(time_dim)) {
                Ok(layout) if layout.time_len() == Some(nt) => layout,
                Ok(_) => {
                    warn!(
                        "{} in '{}' does not follow the time axis, skipping it",
                        name,
                        path.display()
                    );
                    skipped.push(name.clone());
                    continue;
                }
                Err(e) => {
                    warn!(
                        "{} in '{}' is not on the grid ({}), skipping it",
                        name,
                        path.display(),
                        e
                    );
                    skipped.push(name.clone());
                    continue;
                }
            };
            let decoder = ValueDecoder::for_variable(file, &var);

            for (s, cell) in reference.cells.iter().enumerate() {
                let series = file.read(&var, &layout.cell_slab(cell.row, cell.col))?;
                for (t, raw) in series.into_iter().enumerate().take(nt) {
                    observations[s * nt + t].values[v] = decoder.decode(raw);
                }
            }
            present.push(name.clone());
        }

        if present.is_empty() {
            return Err(ExtractError::NoVariables(path));
        }
        Ok(FileExtraction {
            observations,
            variables_present: present,
            skipped_variables: skipped,
        })
    }
}
