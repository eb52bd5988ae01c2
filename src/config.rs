//! Run configuration for the `extract_features` binary and library callers.

use crate::error::FeatureError;
use crate::features::{LatLon, DEFAULT_AOD_VARIABLE, DEFAULT_MERRA_VARIABLES};
use crate::sites::site_list::{Site, SiteList};
use crate::types::source::SourceKind;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the path of a JSON config file.
pub const CONFIG_ENV_VAR: &str = "PM_FEATURES_CONFIG";

/// Static CPCB site coordinates, paired with the sorted ground-truth file stems.
pub const DEFAULT_COORDINATES: [LatLon; 5] = [
    LatLon(13.1278, 80.2642),
    LatLon(26.428282, 80.327067),
    LatLon(25.4547, 78.6039),
    LatLon(23.020509, 72.579261),
    LatLon(22.55664, 88.342674),
];

/// Where inputs are read from and outputs written to.
///
/// Every field has a default, so a JSON config only needs the keys it changes:
///
/// ```
/// use pm_features::RunConfig;
///
/// let config: RunConfig = serde_json::from_str(r#"{ "merra_dir": "/data/merra" }"#).unwrap();
/// assert_eq!(config.merra_dir.to_str(), Some("/data/merra"));
/// assert_eq!(config.aod_variable, "AOD");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct RunConfig {
    /// Directory of `<site>.csv` ground-truth files; only the stems are used.
    #[builder(default = PathBuf::from("CPCB"), into)]
    pub ground_truth_dir: PathBuf,
    /// Coordinates paired positionally with the sorted ground-truth stems.
    #[builder(default = DEFAULT_COORDINATES.to_vec())]
    pub coordinates: Vec<LatLon>,
    /// Explicit site list; replaces `ground_truth_dir` + `coordinates` when set.
    pub sites: Option<Vec<Site>>,
    #[builder(default = PathBuf::from("mosdac"), into)]
    pub aod_dir: PathBuf,
    #[builder(default = SourceKind::Aod.default_extensions())]
    pub aod_extensions: Vec<String>,
    #[builder(default = DEFAULT_AOD_VARIABLE.to_string(), into)]
    pub aod_variable: String,
    #[builder(default = PathBuf::from("Merra-2"), into)]
    pub merra_dir: PathBuf,
    #[builder(default = SourceKind::Merra2.default_extensions())]
    pub merra_extensions: Vec<String>,
    #[builder(default = DEFAULT_MERRA_VARIABLES.iter().map(|v| v.to_string()).collect())]
    pub merra_variables: Vec<String>,
    #[builder(default = PathBuf::from("."), into)]
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RunConfig {
    /// Loads a JSON config; absent keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, FeatureError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| FeatureError::ConfigRead(path.to_path_buf(), e))?;
        serde_json::from_str(&text).map_err(|e| FeatureError::ConfigParse(path.to_path_buf(), e))
    }

    /// Loads the file named by [`CONFIG_ENV_VAR`], or the defaults when it is unset.
    pub fn from_env() -> Result<Self, FeatureError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_json_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// The explicit `sites` if given, otherwise the ground-truth directory pairing.
    pub fn site_list(&self) -> Result<SiteList, FeatureError> {
        let sites = match &self.sites {
            Some(sites) => SiteList::from_sites(sites.clone())?,
            None => SiteList::from_ground_truth_dir(&self.ground_truth_dir, &self.coordinates)?,
        };
        Ok(sites)
    }

    pub fn output_path(&self, kind: SourceKind) -> PathBuf {
        self.output_dir.join(kind.output_file_name())
    }
}
