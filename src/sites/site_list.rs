//! The explicit, ordered mapping from site identity to target coordinates.
//!
//! Site names usually come from the stems of ground-truth CSV files and are paired
//! positionally with a static coordinate list. The pairing is made explicit here:
//! names are sorted before pairing, and once a [`SiteList`] exists the mapping no
//! longer depends on directory listing order.

use crate::features::LatLon;
use crate::sites::error::SiteError;
use crate::utils::list_files_with_extensions;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A monitoring site and the location features are extracted for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Site {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    pub fn location(&self) -> LatLon {
        LatLon(self.latitude, self.longitude)
    }
}

/// Validated, ordered list of sites. Static for the duration of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteList {
    sites: Vec<Site>,
}

impl SiteList {
    /// Builds a site list from an explicit ordered mapping.
    ///
    /// # Errors
    ///
    /// * [`SiteError::NoSites`] if `sites` is empty.
    /// * [`SiteError::DuplicateSite`] if a name repeats.
    /// * [`SiteError::InvalidCoordinate`] if a latitude is outside ±90, a longitude
    ///   outside ±360, or either is not finite.
    pub fn from_sites(sites: Vec<Site>) -> Result<Self, SiteError> {
        if sites.is_empty() {
            return Err(SiteError::NoSites);
        }
        let mut seen = HashSet::new();
        for site in &sites {
            if !seen.insert(site.name.as_str()) {
                return Err(SiteError::DuplicateSite(site.name.clone()));
            }
            let valid = site.latitude.is_finite()
                && site.longitude.is_finite()
                && site.latitude.abs() <= 90.0
                && site.longitude.abs() <= 360.0;
            if !valid {
                return Err(SiteError::InvalidCoordinate {
                    site: site.name.clone(),
                    latitude: site.latitude,
                    longitude: site.longitude,
                });
            }
        }
        Ok(Self { sites })
    }

    /// Sorts `names` and pairs the Nth sorted name with the Nth coordinate.
    ///
    /// The order in which `names` is supplied does not matter; the order of
    /// `coordinates` does.
    pub fn from_names(mut names: Vec<String>, coordinates: &[LatLon]) -> Result<Self, SiteError> {
        names.sort();
        if names.len() != coordinates.len() {
            return Err(SiteError::CountMismatch {
                expected: coordinates.len(),
                found: names.len(),
                sites: names,
            });
        }
        let sites = names
            .into_iter()
            .zip(coordinates)
            .map(|(name, location)| Site::new(name, location.0, location.1))
            .collect();
        Self::from_sites(sites)
    }

    /// Derives site names from the `*.csv` stems in `dir` and pairs them with `coordinates`.
    pub fn from_ground_truth_dir(dir: &Path, coordinates: &[LatLon]) -> Result<Self, SiteError> {
        let files = list_files_with_extensions(dir, &["csv".to_string()])
            .map_err(|e| SiteError::ReadDir(dir.to_path_buf(), e))?;
        let names: Vec<String> = files
            .iter()
            .filter_map(|path| path.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .collect();
        if names.is_empty() && !coordinates.is_empty() {
            return Err(SiteError::CountMismatch {
                expected: coordinates.len(),
                found: 0,
                sites: names,
            });
        }
        Self::from_names(names, coordinates)
    }

    pub fn get(&self, name: &str) -> Option<&Site> {
        self.sites.iter().find(|site| site.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Site> {
        self.sites.iter()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl<'a> IntoIterator for &'a SiteList {
    type Item = &'a Site;
    type IntoIter = std::slice::Iter<'a, Site>;

    fn into_iter(self) -> Self::IntoIter {
        self.sites.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords() -> Vec<LatLon> {
        vec![LatLon(10.0, 20.0), LatLon(11.0, 21.0), LatLon(12.0, 22.0)]
    }

    #[test]
    fn test_sorted_names_map_positionally() -> Result<(), SiteError> {
        let shuffled = vec!["C".to_string(), "A".to_string(), "B".to_string()];
        let sites = SiteList::from_names(shuffled, &coords())?;

        assert_eq!(sites.get("A").unwrap().location(), LatLon(10.0, 20.0));
        assert_eq!(sites.get("B").unwrap().location(), LatLon(11.0, 21.0));
        assert_eq!(sites.get("C").unwrap().location(), LatLon(12.0, 22.0));
        let names: Vec<_> = sites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        Ok(())
    }

    #[test]
    fn test_ground_truth_dir_ignores_creation_order() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        for name in ["C.csv", "A.csv", "readme.md", "B.csv"] {
            std::fs::write(dir.path().join(name), b"date,pm25\n")?;
        }

        let sites = SiteList::from_ground_truth_dir(dir.path(), &coords())?;
        assert_eq!(sites.len(), 3);
        assert_eq!(sites.get("A").unwrap().location(), LatLon(10.0, 20.0));
        assert_eq!(sites.get("C").unwrap().location(), LatLon(12.0, 22.0));
        Ok(())
    }

    #[test]
    fn test_count_mismatch_is_fatal() {
        let result = SiteList::from_names(vec!["A".to_string(), "B".to_string()], &coords());
        match result {
            Err(SiteError::CountMismatch { expected, found, sites }) => {
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
                assert_eq!(sites, ["A", "B"]);
            }
            other => panic!("expected CountMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_duplicate_sites_rejected() {
        assert!(matches!(SiteList::from_sites(vec![]), Err(SiteError::NoSites)));

        let duplicate = vec![Site::new("A", 1.0, 2.0), Site::new("A", 3.0, 4.0)];
        assert!(matches!(
            SiteList::from_sites(duplicate),
            Err(SiteError::DuplicateSite(name)) if name == "A"
        ));

        let invalid = vec![Site::new("A", f64::NAN, 2.0)];
        assert!(matches!(
            SiteList::from_sites(invalid),
            Err(SiteError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_missing_ground_truth_dir() {
        let result = SiteList::from_ground_truth_dir(Path::new("/no/such/cpcb"), &coords());
        assert!(matches!(result, Err(SiteError::ReadDir(..))));
    }
}
