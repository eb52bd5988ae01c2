//! Grid-file access behind a single capability: "open a file, return arrays by name".
//!
//! Variants are picked by [`FileFormat::detect`] (extension first, magic bytes as
//! fallback) instead of trying one engine after another:
//!
//! * [`NetcdfGridFile`]: flat, root-level lookup for netCDF/netCDF-4 reanalysis files.
//! * [`Hdf5GridFile`]: depth-first lookup through nested HDF5 groups (satellite swaths).
//! * [`MemoryGridFile`]: arrays already held in memory.

pub mod error;
mod hdf5_file;
mod memory;
mod netcdf_file;

pub use error::ReaderError;
pub use hdf5_file::Hdf5GridFile;
pub use memory::{MemoryAttribute, MemoryGridFile, MemoryOpener};
pub use netcdf_file::NetcdfGridFile;

use std::fs::File;
use std::io::Read;
use std::path::Path;

const HDF5_SIGNATURE: &[u8] = b"\x89HDF\r\n\x1a\n";

/// A named dimension of a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub len: usize,
}

impl Dimension {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len,
        }
    }
}

/// Location and shape of a variable inside a grid file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableInfo {
    /// Full path, e.g. `/Geophysical_Data/AOD` for nested files or `T2M` for flat ones.
    pub path: String,
    /// Last path component.
    pub name: String,
    pub dimensions: Vec<Dimension>,
}

impl VariableInfo {
    pub fn new(path: impl Into<String>, dimensions: Vec<Dimension>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self {
            path,
            name,
            dimensions,
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(|d| d.len).collect()
    }

    /// Number of elements (1 for scalars).
    pub fn len(&self) -> usize {
        self.dimensions.iter().map(|d| d.len).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A rectangular selection: `count[d]` elements from `start[d]` along every dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperslab {
    pub start: Vec<usize>,
    pub count: Vec<usize>,
}

impl Hyperslab {
    pub fn new(start: Vec<usize>, count: Vec<usize>) -> Self {
        Self { start, count }
    }

    /// Selects the whole variable.
    pub fn all(dimensions: &[Dimension]) -> Self {
        Self {
            start: vec![0; dimensions.len()],
            count: dimensions.iter().map(|d| d.len).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.count.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn check(&self, variable: &VariableInfo) -> Result<(), ReaderError> {
        let shape = variable.shape();
        let fits = self.start.len() == shape.len()
            && self.count.len() == shape.len()
            && shape
                .iter()
                .zip(self.start.iter().zip(&self.count))
                .all(|(len, (start, count))| start + count <= *len);
        if fits {
            Ok(())
        } else {
            Err(ReaderError::OutOfBounds {
                variable: variable.path.clone(),
                shape,
                start: self.start.clone(),
                count: self.count.clone(),
            })
        }
    }
}

/// Describes which variable to look for.
///
/// Exact names are compared case-insensitively and always win over fragments;
/// fragments match any variable whose name contains them (case-insensitive).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableQuery {
    exact: Vec<String>,
    contains: Vec<String>,
}

impl VariableQuery {
    pub fn exact<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            exact: names.into_iter().map(Into::into).collect(),
            contains: Vec::new(),
        }
    }

    pub fn or_containing<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contains
            .extend(fragments.into_iter().map(|f| f.into().to_lowercase()));
        self
    }

    /// Human readable description used in error messages.
    pub fn describe(&self) -> String {
        let mut parts = self.exact.clone();
        parts.extend(self.contains.iter().map(|f| format!("*{f}*")));
        parts.join(" or ")
    }

    fn matches_exact(&self, name: &str) -> bool {
        self.exact.iter().any(|e| e.eq_ignore_ascii_case(name))
    }

    fn matches_fragment(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.contains.iter().any(|f| lower.contains(f.as_str()))
    }

    /// Picks the best candidate: the first exact match in query order, otherwise
    /// the first fragment match in traversal order.
    pub(crate) fn select(&self, candidates: Vec<VariableInfo>) -> Option<VariableInfo> {
        for wanted in &self.exact {
            if let Some(found) = candidates.iter().find(|c| c.name.eq_ignore_ascii_case(wanted)) {
                return Some(found.clone());
            }
        }
        candidates
            .into_iter()
            .find(|c| !self.matches_exact(&c.name) && self.matches_fragment(&c.name))
    }
}

/// An opened grid file.
pub trait GridFile {
    fn path(&self) -> &Path;

    /// Locates a variable, returning its path and dimensions without reading data.
    fn find_variable(&self, query: &VariableQuery) -> Option<VariableInfo>;

    /// Reads a hyperslab as `f64`, row-major. No scaling or fill handling is applied.
    fn read(&self, variable: &VariableInfo, slab: &Hyperslab) -> Result<Vec<f64>, ReaderError>;

    fn attribute_f64(&self, variable: &VariableInfo, name: &str) -> Option<f64>;

    fn attribute_str(&self, variable: &VariableInfo, name: &str) -> Option<String>;

    fn read_all(&self, variable: &VariableInfo) -> Result<Vec<f64>, ReaderError> {
        self.read(variable, &Hyperslab::all(&variable.dimensions))
    }

    fn require(&self, query: &VariableQuery) -> Result<VariableInfo, ReaderError> {
        self.find_variable(query)
            .ok_or_else(|| ReaderError::MissingVariable {
                path: self.path().to_path_buf(),
                variable: query.describe(),
            })
    }
}

/// Opens grid files; the seam between the pipelines and the storage format.
pub trait OpenGridFile {
    fn open(&self, path: &Path) -> Result<Box<dyn GridFile>, ReaderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// netCDF classic or netCDF-4, flat variable lookup.
    Netcdf,
    /// Generic HDF5, nested group lookup.
    Hdf5,
}

impl FileFormat {
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "nc" | "nc4" | "netcdf" | "cdf" => Some(FileFormat::Netcdf),
            "h5" | "hdf5" | "he5" | "hdf" => Some(FileFormat::Hdf5),
            _ => None,
        }
    }

    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(HDF5_SIGNATURE) {
            Some(FileFormat::Hdf5)
        } else if bytes.len() >= 4 && &bytes[..3] == b"CDF" && matches!(bytes[3], 1 | 2 | 5) {
            Some(FileFormat::Netcdf)
        } else {
            None
        }
    }

    /// Extension first, then the first bytes of the file.
    pub fn detect(path: &Path) -> Result<Self, ReaderError> {
        if let Some(format) = Self::from_extension(path) {
            return Ok(format);
        }
        let mut header = [0u8; 8];
        let read = File::open(path)
            .and_then(|mut file| file.read(&mut header))
            .map_err(|e| ReaderError::Probe(path.to_path_buf(), e))?;
        Self::from_magic(&header[..read])
            .ok_or_else(|| ReaderError::UnsupportedFormat(path.to_path_buf()))
    }
}

/// Opens files from disk through the `netcdf` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOpener;

impl OpenGridFile for DefaultOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn GridFile>, ReaderError> {
        if !path.exists() {
            return Err(ReaderError::NotFound(path.to_path_buf()));
        }
        match FileFormat::detect(path)? {
            FileFormat::Netcdf => Ok(Box::new(NetcdfGridFile::open(path)?)),
            FileFormat::Hdf5 => Ok(Box::new(Hdf5GridFile::open(path)?)),
        }
    }
}

/// Shared between the netCDF-backed variants.
pub(crate) fn describe_variable(variable: &netcdf::Variable<'_>, path: String) -> VariableInfo {
    let dimensions = variable
        .dimensions()
        .iter()
        .map(|d| Dimension::new(d.name(), d.len()))
        .collect();
    VariableInfo::new(path, dimensions)
}

pub(crate) fn read_netcdf_variable(
    file_path: &Path,
    variable: &netcdf::Variable<'_>,
    info: &VariableInfo,
    slab: &Hyperslab,
) -> Result<Vec<f64>, ReaderError> {
    slab.check(info)?;
    variable
        .get_values::<f64, _>((slab.start.as_slice(), slab.count.as_slice()))
        .map_err(|source| ReaderError::Read {
            path: file_path.to_path_buf(),
            variable: info.path.clone(),
            source,
        })
}

fn has_attribute(variable: &netcdf::Variable<'_>, name: &str) -> bool {
    variable.attributes().any(|attr| attr.name() == name)
}

pub(crate) fn netcdf_attribute_f64(variable: &netcdf::Variable<'_>, name: &str) -> Option<f64> {
    // Probing a missing attribute makes the HDF5 layer print error stacks.
    if !has_attribute(variable, name) {
        return None;
    }
    let value = variable.attribute_value(name)?.ok()?;
    f64::try_from(value).ok()
}

pub(crate) fn netcdf_attribute_str(variable: &netcdf::Variable<'_>, name: &str) -> Option<String> {
    if !has_attribute(variable, name) {
        return None;
    }
    match variable.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        netcdf::AttributeValue::Strs(strings) => strings.into_iter().next(),
        _ => None,
    }
}


/// Small netCDF-4 files written through libnetcdf, shared by the reader and pipeline tests.
#[cfg(test)]
pub(crate) mod test_files {
    use std::path::Path;

    /// Flat MERRA-2 layout on a 2x3 grid with three half-past hourly steps.
    ///
    /// `T2M` is stored as `f32`. The (lat 0, lon 0) cell holds `t2m`, a fill value
    /// and `t2m + 2` over the three hours; every other cell holds 250.
    pub(crate) fn write_merra(path: &Path, day: &str, t2m: f32) -> Result<(), netcdf::Error> {
        let mut file = netcdf::create(path)?;
        file.add_dimension("time", 3)?;
        file.add_dimension("lat", 2)?;
        file.add_dimension("lon", 3)?;

        let units = format!("minutes since {day} 00:30:00");
        let mut time = file.add_variable::<i32>("time", &["time"])?;
        time.put_attribute("units", units.as_str())?;
        time.put_values::<i32, _>(&[0, 60, 120], ..)?;
        let mut lat = file.add_variable::<f64>("lat", &["lat"])?;
        lat.put_values::<f64, _>(&[13.0, 13.5], ..)?;
        let mut lon = file.add_variable::<f64>("lon", &["lon"])?;
        lon.put_values::<f64, _>(&[80.0, 80.625, 81.25], ..)?;

        let mut values = vec![250.0f32; 18];
        values[0] = t2m;
        values[6] = 1.0e15;
        values[12] = t2m + 2.0;
        let mut var = file.add_variable::<f32>("T2M", &["time", "lat", "lon"])?;
        var.set_fill_value(1.0e15f32)?;
        var.put_attribute("units", "K")?;
        var.put_values::<f32, _>(&values, ..)?;

        file.close()
    }

    /// Nested satellite granule: `/Geo/Latitude` and `/Geo/Longitude` on a 2x2
    /// `(row, col)` grid, `/Data/AOD` stored `(col, row)` as scaled `i16` with a
    /// `-999` fill value. Cell latitudes are 10/11 by row, longitudes 80/81 by column.
    pub(crate) fn write_aod_granule(path: &Path, aod: &[i16; 4]) -> Result<(), netcdf::Error> {
        let mut file = netcdf::create(path)?;
        file.add_dimension("row", 2)?;
        file.add_dimension("col", 2)?;
        file.add_group("Geo")?;
        file.add_group("Data")?;

        let mut lat = file.add_variable::<f64>("Geo/Latitude", &["row", "col"])?;
        lat.put_values::<f64, _>(&[10.0, 10.0, 11.0, 11.0], ..)?;
        let mut lon = file.add_variable::<f64>("Geo/Longitude", &["row", "col"])?;
        lon.put_values::<f64, _>(&[80.0, 81.0, 80.0, 81.0], ..)?;

        let mut var = file.add_variable::<i16>("Data/AOD", &["col", "row"])?;
        var.set_fill_value(-999i16)?;
        var.put_attribute("scale_factor", 0.001f64)?;
        var.put_values::<i16, _>(aod, ..)?;

        file.close()
    }
}
