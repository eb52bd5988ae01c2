//! This module provides the main entry point: run the AOD or MERRA-2 pipeline over a
//! directory of files and get back per-site daily features.

use crate::error::FeatureError;
use crate::pipeline::aggregate::TemporalAggregator;
use crate::pipeline::aod::AodExtractor;
use crate::pipeline::error::ExtractError;
use crate::pipeline::merra::Merra2Extractor;
use crate::pipeline::writer::DailyFeatures;
use crate::reader::{DefaultOpener, OpenGridFile};
use crate::sites::site_list::SiteList;
use crate::types::source::SourceKind;
use crate::utils::list_files_with_extensions;
use bon::bon;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Variables read from MERRA-2 files when none are given.
pub const DEFAULT_MERRA_VARIABLES: [&str; 5] = ["T2M", "U2M", "V2M", "PS", "RH2M"];

/// Name of the AOD array when none is given.
pub const DEFAULT_AOD_VARIABLE: &str = "AOD";

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// ```
/// use pm_features::LatLon;
///
/// let chennai = LatLon(13.1278, 80.2642);
/// assert_eq!(chennai.0, 13.1278);
/// assert_eq!(chennai.1, 80.2642);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

/// A file that contributed nothing, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub source: SourceKind,
    pub features: DailyFeatures,
    pub files_found: usize,
    pub files_used: usize,
    pub files_skipped: Vec<SkippedFile>,
}

impl ExtractionReport {
    /// Writes the features to `dir` under the source's fixed file name and returns the path.
    pub fn write_csv(&self, dir: &Path) -> Result<PathBuf, FeatureError> {
        let path = dir.join(self.source.output_file_name());
        self.features.write_csv(&path)?;
        Ok(path)
    }
}

/// Runs the extraction pipelines for a fixed list of sites.
///
/// The two pipelines share nothing but the site list: each call lists its own
/// files, resolves its own grid and aggregates into its own table.
///
/// # Examples
///
/// ```no_run
/// use pm_features::{FeatureExtractor, FeatureError, Site, SiteList};
/// use std::path::Path;
///
/// # fn main() -> Result<(), FeatureError> {
/// let sites = SiteList::from_sites(vec![Site::new("Chennai", 13.1278, 80.2642)])?;
/// let extractor = FeatureExtractor::new(sites);
///
/// let merra = extractor.merra_features().dir(Path::new("Merra-2")).call()?;
/// merra.write_csv(Path::new("."))?;
/// # Ok(())
/// # }
/// ```
pub struct FeatureExtractor {
    sites: SiteList,
    opener: Box<dyn OpenGridFile>,
}

#[bon]
impl FeatureExtractor {
    /// Reads files from disk with the [`DefaultOpener`].
    pub fn new(sites: SiteList) -> Self {
        Self::with_opener(sites, DefaultOpener)
    }

    /// Reads files through a custom opener, e.g. a [`crate::MemoryOpener`].
    pub fn with_opener(sites: SiteList, opener: impl OpenGridFile + 'static) -> Self {
        Self {
            sites,
            opener: Box::new(opener),
        }
    }

    pub fn sites(&self) -> &SiteList {
        &self.sites
    }

    /// Extracts daily mean AOD per site from the satellite granules in `dir`.
    ///
    /// Each granule is resolved against its own pixel grid. Granules that cannot be
    /// opened or lack coordinates or the AOD array are skipped.
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory holding the granules.
    /// * `variable` - Name of the AOD array, defaults to `AOD`.
    /// * `extensions` - File extensions to pick up, defaults to `h5`.
    ///
    /// # Errors
    ///
    /// * [`FeatureError::ReadDir`] if `dir` cannot be listed.
    /// * [`FeatureError::NoInputFiles`] if no file matches.
    /// * [`FeatureError::NoObservations`] if no granule produced a value.
    #[builder]
    pub fn aod_features(
        &self,
        dir: &Path,
        variable: Option<&str>,
        extensions: Option<Vec<String>>,
    ) -> Result<ExtractionReport, FeatureError> {
        let kind = SourceKind::Aod;
        let variable = variable.unwrap_or(DEFAULT_AOD_VARIABLE);
        let files = list_inputs(kind, dir, extensions)?;

        let extractor = AodExtractor::new(&self.sites, variable);
        let mut aggregator = TemporalAggregator::new(vec![extractor.variable().to_string()]);
        let mut tally = Tally::default();

        for path in &files {
            let extraction = self
                .opener
                .open(path)
                .map_err(ExtractError::from)
                .and_then(|file| extractor.extract_file(file.as_ref()));
            match extraction {
                Ok(extraction) => {
                    tally.used += 1;
                    aggregator.add(extraction);
                }
                Err(e) => tally.skip(path, &e),
            }
        }

        finish(kind, &aggregator, files.len(), tally, &[variable.to_string()])
    }

    /// Extracts daily means of MERRA-2 variables per site from the files in `dir`.
    ///
    /// The grid is resolved once, from the first file (in path order) with usable
    /// coordinates. Requested variables missing from a file are skipped for that
    /// file only; a variable missing from every file gets no output column.
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory holding the reanalysis files.
    /// * `variables` - Variables to extract, defaults to `T2M, U2M, V2M, PS, RH2M`.
    /// * `extensions` - File extensions to pick up, defaults to `nc4`.
    ///
    /// # Errors
    ///
    /// * [`FeatureError::ReadDir`] if `dir` cannot be listed.
    /// * [`FeatureError::NoInputFiles`] if no file matches.
    /// * [`FeatureError::NoUsableGrid`] if no file has usable coordinates.
    /// * [`FeatureError::NoVariables`] if no requested variable appears in any file.
    /// * [`FeatureError::NoObservations`] if nothing else could be extracted.
    #[builder]
    pub fn merra_features(
        &self,
        dir: &Path,
        variables: Option<Vec<String>>,
        extensions: Option<Vec<String>>,
    ) -> Result<ExtractionReport, FeatureError> {
        let kind = SourceKind::Merra2;
        let variables = variables.unwrap_or_else(|| {
            DEFAULT_MERRA_VARIABLES
                .iter()
                .map(|v| v.to_string())
                .collect()
        });
        let files = list_inputs(kind, dir, extensions)?;

        let mut extractor = Merra2Extractor::new(&self.sites, variables.clone());
        let mut aggregator = TemporalAggregator::new(variables.clone());
        let mut tally = Tally::default();

        for path in &files {
            let file = match self.opener.open(path) {
                Ok(file) => file,
                Err(e) => {
                    tally.skip(path, &ExtractError::from(e));
                    continue;
                }
            };
            if !extractor.is_resolved() {
                if let Err(e) = extractor.resolve_grid(file.as_ref()) {
                    tally.skip(path, &e);
                    continue;
                }
            }
            match extractor.extract_file(file.as_ref()) {
                Ok(extraction) => {
                    for name in &extraction.skipped_variables {
                        tally.note_missing(name);
                    }
                    tally.used += 1;
                    aggregator.add(extraction);
                }
                Err(e) => tally.skip(path, &e),
            }
        }

        if !extractor.is_resolved() {
            return Err(FeatureError::NoUsableGrid(kind));
        }
        for name in &tally.missing_variables {
            if !aggregator.present_columns().contains(name) {
                warn!("{} was not found in any {} file, its column is omitted", name, kind);
            }
        }
        finish(kind, &aggregator, files.len(), tally, &variables)
    }
}

/// Bookkeeping for one run.
#[derive(Debug, Default)]
struct Tally {
    used: usize,
    skipped: Vec<SkippedFile>,
    no_variables: usize,
    missing_variables: Vec<String>,
}

impl Tally {
    fn skip(&mut self, path: &Path, error: &ExtractError) {
        warn!("Skipping '{}': {}", path.display(), error);
        if matches!(error, ExtractError::NoVariables(_)) {
            self.no_variables += 1;
        }
        self.skipped.push(SkippedFile {
            path: path.to_path_buf(),
            reason: error.to_string(),
        });
    }

    fn note_missing(&mut self, variable: &str) {
        if !self.missing_variables.iter().any(|v| v == variable) {
            self.missing_variables.push(variable.to_string());
        }
    }
}

fn list_inputs(
    kind: SourceKind,
    dir: &Path,
    extensions: Option<Vec<String>>,
) -> Result<Vec<PathBuf>, FeatureError> {
    let extensions = extensions.unwrap_or_else(|| kind.default_extensions());
    let files = list_files_with_extensions(dir, &extensions)
        .map_err(|e| FeatureError::ReadDir(dir.to_path_buf(), e))?;
    if files.is_empty() {
        return Err(FeatureError::NoInputFiles {
            kind,
            dir: dir.to_path_buf(),
        });
    }
    info!("Found {} {} files in '{}'", files.len(), kind, dir.display());
    Ok(files)
}

fn finish(
    kind: SourceKind,
    aggregator: &TemporalAggregator,
    files_found: usize,
    tally: Tally,
    requested: &[String],
) -> Result<ExtractionReport, FeatureError> {
    if aggregator.present_columns().is_empty() && tally.no_variables > 0 {
        return Err(FeatureError::NoVariables {
            requested: requested.to_vec(),
        });
    }
    if aggregator.is_empty() {
        return Err(FeatureError::NoObservations { kind });
    }

    let features = aggregator.finish()?;
    info!(
        "{}: {} daily rows from {} of {} files ({} skipped), columns {:?}",
        kind,
        features.height(),
        tally.used,
        files_found,
        tally.skipped.len(),
        features.value_columns()
    );
    Ok(ExtractionReport {
        source: kind,
        features,
        files_found,
        files_used: tally.used,
        files_skipped: tally.skipped,
    })
}
