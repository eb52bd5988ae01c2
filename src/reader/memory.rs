use crate::reader::{
    Dimension, GridFile, Hyperslab, OpenGridFile, ReaderError, VariableInfo, VariableQuery,
};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Attribute value held by a [`MemoryGridFile`] variable.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryAttribute {
    Number(f64),
    Text(String),
}

impl From<f64> for MemoryAttribute {
    fn from(value: f64) -> Self {
        MemoryAttribute::Number(value)
    }
}

impl From<&str> for MemoryAttribute {
    fn from(value: &str) -> Self {
        MemoryAttribute::Text(value.to_string())
    }
}

#[derive(Debug, Clone)]
struct MemoryVariable {
    info: VariableInfo,
    values: Vec<f64>,
    attributes: HashMap<String, MemoryAttribute>,
}

/// A grid file whose arrays are already in memory.
///
/// Variables are stored row-major; paths containing `/` behave like nested groups.
///
/// ```
/// use pm_features::{GridFile, MemoryGridFile, VariableQuery};
///
/// let file = MemoryGridFile::new("MERRA2_400.tavg1_2d_slv_Nx.20230701.nc4")
///     .with_variable("lat", &[("lat", 2)], vec![10.0, 10.5])
///     .with_variable("lon", &[("lon", 3)], vec![80.0, 80.625, 81.25]);
///
/// let lat = file.find_variable(&VariableQuery::exact(["lat"])).unwrap();
/// assert_eq!(file.read_all(&lat).unwrap(), vec![10.0, 10.5]);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryGridFile {
    path: PathBuf,
    variables: Vec<MemoryVariable>,
}

impl MemoryGridFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            variables: Vec::new(),
        }
    }

    /// Adds (or replaces) a variable. `dimensions` are `(name, length)` pairs in storage order.
    pub fn with_variable(
        mut self,
        path: &str,
        dimensions: &[(&str, usize)],
        values: Vec<f64>,
    ) -> Self {
        let dims = dimensions
            .iter()
            .map(|(name, len)| Dimension::new(*name, *len))
            .collect();
        self.variables.retain(|v| v.info.path != path);
        self.variables.push(MemoryVariable {
            info: VariableInfo::new(path, dims),
            values,
            attributes: HashMap::new(),
        });
        self
    }

    /// Attaches an attribute to an existing variable; unknown variables are ignored.
    pub fn with_attribute(
        mut self,
        variable: &str,
        name: &str,
        value: impl Into<MemoryAttribute>,
    ) -> Self {
        if let Some(var) = self.variables.iter_mut().find(|v| v.info.path == variable) {
            var.attributes.insert(name.to_string(), value.into());
        }
        self
    }

    fn stored(&self, info: &VariableInfo) -> Result<&MemoryVariable, ReaderError> {
        self.variables
            .iter()
            .find(|v| v.info.path == info.path)
            .ok_or_else(|| ReaderError::MissingVariable {
                path: self.path.clone(),
                variable: info.path.clone(),
            })
    }
}

impl GridFile for MemoryGridFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn find_variable(&self, query: &VariableQuery) -> Option<VariableInfo> {
        query.select(self.variables.iter().map(|v| v.info.clone()).collect())
    }

    fn read(&self, variable: &VariableInfo, slab: &Hyperslab) -> Result<Vec<f64>, ReaderError> {
        let stored = self.stored(variable)?;
        if stored.values.len() != stored.info.len() {
            return Err(ReaderError::LengthMismatch {
                variable: stored.info.path.clone(),
                expected: stored.info.len(),
                found: stored.values.len(),
            });
        }
        slab.check(&stored.info)?;
        Ok(read_slab(&stored.values, &stored.info.shape(), slab))
    }

    fn attribute_f64(&self, variable: &VariableInfo, name: &str) -> Option<f64> {
        match self.stored(variable).ok()?.attributes.get(name)? {
            MemoryAttribute::Number(n) => Some(*n),
            MemoryAttribute::Text(t) => t.trim().parse().ok(),
        }
    }

    fn attribute_str(&self, variable: &VariableInfo, name: &str) -> Option<String> {
        match self.stored(variable).ok()?.attributes.get(name)? {
            MemoryAttribute::Text(t) => Some(t.clone()),
            MemoryAttribute::Number(_) => None,
        }
    }
}

/// Row-major extraction of an in-bounds hyperslab.
fn read_slab(values: &[f64], shape: &[usize], slab: &Hyperslab) -> Vec<f64> {
    let total = slab.len();
    if total == 0 {
        return Vec::new();
    }
    let rank = shape.len();
    let mut strides = vec![1usize; rank];
    for d in (0..rank.saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }

    let mut out = Vec::with_capacity(total);
    let mut index = vec![0usize; rank];
    loop {
        let offset: usize = (0..rank)
            .map(|d| (slab.start[d] + index[d]) * strides[d])
            .sum();
        out.push(values[offset]);

        // Odometer increment, last dimension fastest.
        let mut d = rank;
        loop {
            if d == 0 {
                return out;
            }
            d -= 1;
            index[d] += 1;
            if index[d] < slab.count[d] {
                break;
            }
            index[d] = 0;
        }
    }
}

/// Serves [`MemoryGridFile`]s keyed by file name, so the same fixtures work
/// whatever directory the pipeline lists them from.
#[derive(Debug, Clone, Default)]
pub struct MemoryOpener {
    files: HashMap<OsString, MemoryGridFile>,
}

impl MemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, file: MemoryGridFile) -> Self {
        self.insert(file);
        self
    }

    pub fn insert(&mut self, file: MemoryGridFile) {
        if let Some(name) = file.path.file_name() {
            self.files.insert(name.to_os_string(), file);
        }
    }
}

impl OpenGridFile for MemoryOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn GridFile>, ReaderError> {
        let file = path
            .file_name()
            .and_then(|name| self.files.get(name))
            .ok_or_else(|| ReaderError::NotFound(path.to_path_buf()))?;
        let mut file = file.clone();
        file.path = path.to_path_buf();
        Ok(Box::new(file))
    }
}
