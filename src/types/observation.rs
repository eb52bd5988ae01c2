use chrono::{DateTime, NaiveDate, Utc};

/// One raw extraction: the value(s) of the grid cell nearest to `site`, at `timestamp`.
///
/// `values` is positionally aligned with the value columns of the pipeline that
/// produced it. `None` marks a variable that was absent from the file or a fill value.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub site: String,
    pub timestamp: DateTime<Utc>,
    pub values: Vec<Option<f64>>,
}

impl Observation {
    pub fn new(
        site: impl Into<String>,
        timestamp: DateTime<Utc>,
        values: Vec<Option<f64>>,
    ) -> Self {
        Self {
            site: site.into(),
            timestamp,
            values,
        }
    }

    /// True when every value is missing; such observations carry no information.
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// A collected row of the daily feature output.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyFeatureRow {
    /// UTC calendar day.
    pub date: NaiveDate,
    pub site: String,
    /// `(column, daily mean)` pairs in output column order.
    pub values: Vec<(String, Option<f64>)>,
}

impl DailyFeatureRow {
    /// Daily mean for `column`, if the column exists and had a value that day.
    pub fn value(&self, column: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| *value)
    }
}
