//! Runs the AOD and MERRA-2 pipelines with the configured directories and writes
//! `aod_daily_features.csv` and `merra_daily_features.csv`.
//!
//! Set `PM_FEATURES_CONFIG` to a JSON file to override defaults, and `RUST_LOG`
//! (default `info`) to control verbosity.

use anyhow::{bail, Context, Result};
use log::{error, info, warn};
use pm_features::{ExtractionReport, FeatureError, FeatureExtractor, RunConfig};
use std::path::Path;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RunConfig::from_env().context("Failed to load configuration")?;
    let sites = config.site_list().context("Failed to build the site list")?;
    for site in &sites {
        info!("Site {}: ({}, {})", site.name, site.latitude, site.longitude);
    }
    let extractor = FeatureExtractor::new(sites);

    let aod = extractor
        .aod_features()
        .dir(&config.aod_dir)
        .variable(&config.aod_variable)
        .extensions(config.aod_extensions.clone())
        .call();
    let aod_ok = report_and_write("AOD", aod, &config.output_dir);

    let merra = extractor
        .merra_features()
        .dir(&config.merra_dir)
        .variables(config.merra_variables.clone())
        .extensions(config.merra_extensions.clone())
        .call();
    let merra_ok = report_and_write("MERRA-2", merra, &config.output_dir);

    if !(aod_ok && merra_ok) {
        bail!("At least one pipeline failed, see the log above");
    }
    Ok(())
}

fn report_and_write(
    label: &str,
    result: Result<ExtractionReport, FeatureError>,
    output_dir: &Path,
) -> bool {
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            error!("{} pipeline failed: {}", label, e);
            return false;
        }
    };
    for skipped in &report.files_skipped {
        warn!("{}: skipped '{}': {}", label, skipped.path.display(), skipped.reason);
    }
    match report.write_csv(output_dir) {
        Ok(path) => {
            let (rows, cols) = report.features.frame().shape();
            info!(
                "{}: wrote {} ({} rows x {} columns) from {}/{} files",
                label,
                path.display(),
                rows,
                cols,
                report.files_used,
                report.files_found
            );
            true
        }
        Err(e) => {
            error!("{} pipeline could not write its output: {}", label, e);
            false
        }
    }
}
