//! Date options and the per-date dataset fetched for analysis.

use serde::{Deserialize, Serialize};

use crate::api::{DataRow, DateDataResponse, StatsMap, TIME_COLUMN};

/// One selectable day of merged data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateOption {
    pub id: String,
    /// ISO-8601 date key, the only value ever sent back to the service.
    pub date: String,
    pub display_name: String,
}

impl DateOption {
    pub fn new(date: impl Into<String>, display_name: impl Into<String>) -> Self {
        let date = date.into();
        Self {
            id: date.clone(),
            date,
            display_name: display_name.into(),
        }
    }
}

/// Rows and aggregates for a single date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateDataset {
    pub date: String,
    pub rows: Vec<DataRow>,
    pub stats: StatsMap,
}

impl DateDataset {
    pub fn new(date: impl Into<String>, rows: Vec<DataRow>, stats: StatsMap) -> Self {
        let dataset = Self {
            date: date.into(),
            rows,
            stats,
        };
        dataset.warn_on_orphan_stats();
        dataset
    }

    /// Non-time columns, in the key order of the first row.
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| {
                row.values
                    .keys()
                    .filter(|k| k.as_str() != TIME_COLUMN)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Numeric samples of `column`; non-numeric entries are dropped.
    pub fn column_values(&self, column: &str) -> Vec<f64> {
        crate::services::binning::column_values(&self.rows, column)
    }

    /// Full value range of `column`, if it has any numeric samples.
    pub fn value_range(&self, column: &str) -> Option<(f64, f64)> {
        let values = self.column_values(column);
        let first = *values.first()?;
        Some(
            values
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }

    fn warn_on_orphan_stats(&self) {
        if self.rows.is_empty() {
            return;
        }
        let columns = self.columns();
        for column in self.stats.keys() {
            if !columns.contains(column) {
                log::warn!(
                    "Statistics for '{}' on {} have no matching row column",
                    column,
                    self.date
                );
            }
        }
    }
}

impl From<DateDataResponse> for DateDataset {
    fn from(resp: DateDataResponse) -> Self {
        Self::new(resp.date, resp.data, resp.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ColumnStats;

    fn dataset() -> DateDataset {
        let rows = vec![
            DataRow::new("2024-01-15T08:00:00")
                .with_value("temp", 20.5)
                .with_value("humidity", 40.0),
            DataRow::new("2024-01-15T08:01:00")
                .with_value("temp", 22.0)
                .with_value("humidity", 38.0),
        ];
        let mut stats = StatsMap::new();
        stats.insert("temp".into(), ColumnStats::new(21.25, 20.5, 22.0, 0.75));
        DateDataset::new("2024-01-15", rows, stats)
    }

    #[test]
    fn test_columns_follow_first_row_order() {
        assert_eq!(dataset().columns(), vec!["temp", "humidity"]);
    }

    #[test]
    fn test_columns_empty_without_rows() {
        let empty = DateDataset::new("2024-01-15", vec![], StatsMap::new());
        assert!(empty.columns().is_empty());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_value_range() {
        let ds = dataset();
        assert_eq!(ds.value_range("humidity"), Some((38.0, 40.0)));
        assert_eq!(ds.value_range("missing"), None);
    }

    #[test]
    fn test_date_option_id_is_date() {
        let opt = DateOption::new("2024-01-15", "15 de enero de 2024");
        assert_eq!(opt.id, "2024-01-15");
        assert_eq!(opt.date, "2024-01-15");
    }
}
