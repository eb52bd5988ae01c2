use crate::reader::{
    describe_variable, netcdf_attribute_f64, netcdf_attribute_str, read_netcdf_variable, GridFile,
    Hyperslab, ReaderError, VariableInfo, VariableQuery,
};
use std::path::{Path, PathBuf};

/// An HDF5 file whose datasets may sit anywhere in a group hierarchy,
/// as in MOSDAC L2 AOD granules. Read through the HDF5 backend of libnetcdf.
pub struct Hdf5GridFile {
    path: PathBuf,
    file: netcdf::File,
}

impl Hdf5GridFile {
    pub fn open(path: &Path) -> Result<Self, ReaderError> {
        let file = netcdf::open(path).map_err(|e| ReaderError::Open(path.to_path_buf(), e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Every variable in depth-first order: a group's own variables, then its subgroups.
    fn all_variables(&self) -> Vec<VariableInfo> {
        let mut found = Vec::new();
        match self.file.root() {
            Some(root) => collect_variables(&root, "", &mut found),
            None => found.extend(self.file.variables().map(|var| {
                let path = format!("/{}", var.name());
                describe_variable(&var, path)
            })),
        }
        found
    }

    fn with_variable<T>(
        &self,
        info: &VariableInfo,
        f: impl FnOnce(&netcdf::Variable<'_>) -> T,
    ) -> Result<T, ReaderError> {
        let components: Vec<&str> = info.path.split('/').filter(|c| !c.is_empty()).collect();
        let result = match self.file.root() {
            Some(root) => locate(&root, &components, f),
            None => self.file.variable(&info.name).map(|var| f(&var)),
        };
        result.ok_or_else(|| ReaderError::MissingVariable {
            path: self.path.clone(),
            variable: info.path.clone(),
        })
    }
}

fn collect_variables(group: &netcdf::Group<'_>, prefix: &str, found: &mut Vec<VariableInfo>) {
    for var in group.variables() {
        let path = format!("{prefix}/{}", var.name());
        found.push(describe_variable(&var, path));
    }
    for child in group.groups() {
        let prefix = format!("{prefix}/{}", child.name());
        collect_variables(&child, &prefix, found);
    }
}

fn locate<T>(
    group: &netcdf::Group<'_>,
    components: &[&str],
    f: impl FnOnce(&netcdf::Variable<'_>) -> T,
) -> Option<T> {
    match components {
        [] => None,
        [name] => group.variable(name).map(|var| f(&var)),
        [head, rest @ ..] => group
            .groups()
            .find(|child| child.name() == *head)
            .and_then(|child| locate(&child, rest, f)),
    }
}

impl GridFile for Hdf5GridFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn find_variable(&self, query: &VariableQuery) -> Option<VariableInfo> {
        query.select(self.all_variables())
    }

    fn read(&self, variable: &VariableInfo, slab: &Hyperslab) -> Result<Vec<f64>, ReaderError> {
        self.with_variable(variable, |var| {
            read_netcdf_variable(&self.path, var, variable, slab)
        })?
    }

    fn attribute_f64(&self, variable: &VariableInfo, name: &str) -> Option<f64> {
        self.with_variable(variable, |var| netcdf_attribute_f64(var, name))
            .ok()
            .flatten()
    }

    fn attribute_str(&self, variable: &VariableInfo, name: &str) -> Option<String> {
        self.with_variable(variable, |var| netcdf_attribute_str(var, name))
            .ok()
            .flatten()
    }
}
