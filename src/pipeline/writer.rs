//! Contains [`DailyFeatures`], the aggregated per-site daily table of one source.

use crate::error::FeatureError;
use crate::types::observation::DailyFeatureRow;
use log::info;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Daily features with columns `date, site, <value columns>`, sorted by `(site, date)`.
///
/// Only `(site, date)` pairs with at least one observation appear. A value column
/// exists only if its variable was present in at least one processed file.
#[derive(Debug, Clone)]
pub struct DailyFeatures {
    frame: DataFrame,
    value_columns: Vec<String>,
}

impl DailyFeatures {
    pub fn new(frame: DataFrame, value_columns: Vec<String>) -> Self {
        Self {
            frame,
            value_columns,
        }
    }

    /// The underlying Polars `DataFrame`.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn value_columns(&self) -> &[String] {
        &self.value_columns
    }

    /// Number of `(site, date)` rows.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Collects the frame into typed rows.
    ///
    /// # Errors
    ///
    /// A [`PolarsError`] if a column is missing or has an unexpected type.
    pub fn rows(&self) -> PolarsResult<Vec<DailyFeatureRow>> {
        let dates: Vec<_> = self.frame.column("date")?.date()?.as_date_iter().collect();
        let sites = self.frame.column("site")?.str()?;
        let values = self
            .value_columns
            .iter()
            .map(|name| self.frame.column(name.as_str())?.f64())
            .collect::<PolarsResult<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(self.frame.height());
        for (i, date) in dates.into_iter().enumerate() {
            let (Some(date), Some(site)) = (date, sites.get(i)) else {
                continue;
            };
            rows.push(DailyFeatureRow {
                date,
                site: site.to_string(),
                values: self
                    .value_columns
                    .iter()
                    .zip(&values)
                    .map(|(name, column)| (name.clone(), column.get(i)))
                    .collect(),
            });
        }
        Ok(rows)
    }

    /// Writes the table as CSV with a header row, `YYYY-MM-DD` dates and empty
    /// cells for missing values. Parent directories are created as needed.
    pub fn write_csv(&self, path: &Path) -> Result<(), FeatureError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| FeatureError::CsvWriteIo(path.to_path_buf(), e))?;
        }
        let mut file =
            File::create(path).map_err(|e| FeatureError::CsvWriteIo(path.to_path_buf(), e))?;
        let mut frame = self.frame.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_date_format(Some("%Y-%m-%d".to_string()))
            .finish(&mut frame)
            .map_err(|e| FeatureError::CsvWritePolars(path.to_path_buf(), e))?;
        info!(
            "Wrote {} rows x {} columns to '{}'",
            frame.height(),
            frame.width(),
            path.display()
        );
        Ok(())
    }
}
