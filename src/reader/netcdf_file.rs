use crate::reader::{
    describe_variable, netcdf_attribute_f64, netcdf_attribute_str, read_netcdf_variable, GridFile,
    Hyperslab, ReaderError, VariableInfo, VariableQuery,
};
use std::path::{Path, PathBuf};

/// A netCDF (classic or netCDF-4) file whose variables live at the root,
/// as in MERRA-2 `.nc4` granules.
pub struct NetcdfGridFile {
    path: PathBuf,
    file: netcdf::File,
}

impl NetcdfGridFile {
    pub fn open(path: &Path) -> Result<Self, ReaderError> {
        let file = netcdf::open(path).map_err(|e| ReaderError::Open(path.to_path_buf(), e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    fn variable(&self, info: &VariableInfo) -> Result<netcdf::Variable<'_>, ReaderError> {
        self.file
            .variable(&info.name)
            .ok_or_else(|| ReaderError::MissingVariable {
                path: self.path.clone(),
                variable: info.path.clone(),
            })
    }
}

impl GridFile for NetcdfGridFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn find_variable(&self, query: &VariableQuery) -> Option<VariableInfo> {
        let candidates = self
            .file
            .variables()
            .map(|var| {
                let name = var.name();
                describe_variable(&var, name)
            })
            .collect();
        query.select(candidates)
    }

    fn read(&self, variable: &VariableInfo, slab: &Hyperslab) -> Result<Vec<f64>, ReaderError> {
        let var = self.variable(variable)?;
        read_netcdf_variable(&self.path, &var, variable, slab)
    }

    fn attribute_f64(&self, variable: &VariableInfo, name: &str) -> Option<f64> {
        let var = self.variable(variable).ok()?;
        netcdf_attribute_f64(&var, name)
    }

    fn attribute_str(&self, variable: &VariableInfo, name: &str) -> Option<String> {
        let var = self.variable(variable).ok()?;
        netcdf_attribute_str(&var, name)
    }
}

#[cfg(test)]
mod tests {
    use crate::pipeline::merra::Merra2Extractor;
    use crate::reader::test_files::write_merra;
    use crate::reader::{DefaultOpener, GridFile, Hyperslab, OpenGridFile, VariableQuery};
    use crate::sites::site_list::{Site, SiteList};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_reads_flat_reanalysis_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("MERRA2_400.tavg1_2d_slv_Nx.20230701.nc4");
        write_merra(&path, "2023-07-01", 300.0)?;

        let file = DefaultOpener.open(&path)?;
        let t2m = file
            .find_variable(&VariableQuery::exact(["t2m"]))
            .ok_or("T2M not found")?;
        assert_eq!(t2m.path, "T2M");
        assert_eq!(t2m.shape(), vec![3, 2, 3]);

        let series = file.read(&t2m, &Hyperslab::new(vec![0, 0, 0], vec![3, 1, 1]))?;
        assert_eq!(series.len(), 3);
        assert_eq!(series[0], 300.0);
        assert_eq!(series[2], 302.0);
        assert_eq!(file.read(&t2m, &Hyperslab::new(vec![1, 1, 2], vec![1, 1, 1]))?, vec![250.0]);
        assert!(file.read(&t2m, &Hyperslab::new(vec![0, 0, 0], vec![4, 1, 1])).is_err());

        let time = file.require(&VariableQuery::exact(["time"]))?;
        assert_eq!(
            file.attribute_str(&time, "units").as_deref(),
            Some("minutes since 2023-07-01 00:30:00")
        );
        assert_eq!(file.attribute_f64(&t2m, "_FillValue"), Some(f64::from(1.0e15f32)));
        assert_eq!(file.attribute_f64(&t2m, "scale_factor"), None);
        Ok(())
    }

    #[test]
    fn test_reanalysis_file_through_extractor() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("MERRA2_400.tavg1_2d_slv_Nx.20230701.nc4");
        write_merra(&path, "2023-07-01", 300.0)?;
        let file = DefaultOpener.open(&path)?;

        let sites = SiteList::from_sites(vec![Site::new("Chennai", 13.1278, 80.2642)])?;
        let mut extractor = Merra2Extractor::new(&sites, vec!["T2M".to_string(), "PS".to_string()]);
        extractor.resolve_grid(file.as_ref())?;
        let cell = &extractor.resolved_cells()[0];
        assert_eq!((cell.row, cell.col), (0, 0));

        let result = extractor.extract_file(file.as_ref())?;
        assert_eq!(result.variables_present, ["T2M"]);
        assert_eq!(result.skipped_variables, ["PS"]);
        let timestamps: Vec<_> = result.observations.iter().map(|o| o.timestamp).collect();
        assert_eq!(
            timestamps,
            vec![
                Utc.with_ymd_and_hms(2023, 7, 1, 0, 30, 0).unwrap(),
                Utc.with_ymd_and_hms(2023, 7, 1, 1, 30, 0).unwrap(),
                Utc.with_ymd_and_hms(2023, 7, 1, 2, 30, 0).unwrap(),
            ]
        );
        let t2m: Vec<_> = result.observations.iter().map(|o| o.values[0]).collect();
        assert_eq!(t2m, vec![Some(300.0), None, Some(302.0)]);
        Ok(())
    }
}
