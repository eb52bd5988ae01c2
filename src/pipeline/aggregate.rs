//! Temporal aggregation: first-seen deduplication per `(site, timestamp)`, then the
//! arithmetic mean per `(site, UTC date)`.

use crate::pipeline::writer::DailyFeatures;
use crate::pipeline::FileExtraction;
use crate::types::observation::Observation;
use chrono::NaiveDate;
use polars::prelude::*;

/// Collects observations from every file of one source.
///
/// Columns are fixed at construction; a column only reaches the output if at
/// least one added file reported it present.
#[derive(Debug, Clone)]
pub struct TemporalAggregator {
    columns: Vec<String>,
    present: Vec<bool>,
    sites: Vec<String>,
    timestamps: Vec<i64>,
    dates: Vec<NaiveDate>,
    values: Vec<Vec<Option<f64>>>,
}

impl TemporalAggregator {
    pub fn new(columns: Vec<String>) -> Self {
        let n = columns.len();
        Self {
            columns,
            present: vec![false; n],
            sites: Vec::new(),
            timestamps: Vec::new(),
            dates: Vec::new(),
            values: vec![Vec::new(); n],
        }
    }

    /// Adds one file's observations, in order. Observations without any value are dropped.
    pub fn add(&mut self, extraction: FileExtraction) {
        for name in &extraction.variables_present {
            if let Some(i) = self.columns.iter().position(|c| c == name) {
                self.present[i] = true;
            }
        }
        for observation in extraction.observations {
            self.push(observation);
        }
    }

    pub fn push(&mut self, observation: Observation) {
        if observation.is_empty() {
            return;
        }
        self.sites.push(observation.site);
        self.timestamps.push(observation.timestamp.timestamp_millis());
        self.dates.push(observation.timestamp.date_naive());
        for (i, column) in self.values.iter_mut().enumerate() {
            column.push(observation.values.get(i).copied().flatten());
        }
    }

    /// Number of observations collected so far, duplicates included.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Columns seen in at least one file, in construction order.
    pub fn present_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.present)
            .filter(|(_, present)| **present)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Raw observations as a frame: `site`, `timestamp` (ms since epoch), `date`, value columns.
    pub fn raw_frame(&self) -> PolarsResult<DataFrame> {
        let mut columns = vec![
            Column::new("site".into(), &self.sites),
            Column::new("timestamp".into(), &self.timestamps),
            Column::new("date".into(), &self.dates),
        ];
        for ((name, values), present) in self.columns.iter().zip(&self.values).zip(&self.present) {
            if *present {
                columns.push(Column::new(name.as_str().into(), values));
            }
        }
        DataFrame::new(columns)
    }

    /// Deduplicates, averages per UTC day and sorts by `(site, date)`.
    pub fn finish(&self) -> PolarsResult<DailyFeatures> {
        let value_columns = self.present_columns();
        let unique = deduplicate(self.raw_frame()?.lazy(), &value_columns);
        let frame = daily_mean(unique, &value_columns).collect()?;
        Ok(DailyFeatures::new(frame, value_columns))
    }
}

/// Keeps the first row of every `(site, timestamp)` pair. Applying it twice changes nothing.
pub fn deduplicate(frame: LazyFrame, value_columns: &[String]) -> LazyFrame {
    let mut aggregations = vec![col("date").first()];
    aggregations.extend(value_columns.iter().map(|c| col(c.as_str()).first()));
    frame
        .group_by_stable([col("site"), col("timestamp")])
        .agg(aggregations)
}

/// Mean of every value column per `(site, date)`, nulls ignored.
/// Output columns: `date`, `site`, value columns.
pub fn daily_mean(frame: LazyFrame, value_columns: &[String]) -> LazyFrame {
    let aggregations: Vec<Expr> = value_columns.iter().map(|c| col(c.as_str()).mean()).collect();
    let mut selection = vec![col("date"), col("site")];
    selection.extend(value_columns.iter().map(|c| col(c.as_str())));
    frame
        .group_by_stable([col("site"), col("date")])
        .agg(aggregations)
        .sort_by_exprs([col("site"), col("date")], SortMultipleOptions::default())
        .select(selection)
}
