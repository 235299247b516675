//! Data Transfer Objects for the merge service API.
//!
//! These mirror the JSON bodies served under the `/api/py` prefix. Row objects
//! keep their key order (`serde_json` is built with `preserve_order`) because
//! the first row's keys define the column order of every view.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Name of the column carrying each row's timestamp.
pub const TIME_COLUMN: &str = "time";

/// Descriptive statistics for one column, computed server-side.
///
/// The service emits `null` for undefined aggregates (the standard deviation
/// of a single sample, for instance); those decode as `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    #[serde(deserialize_with = "nullable_f64")]
    pub avg: f64,
    #[serde(deserialize_with = "nullable_f64")]
    pub min: f64,
    #[serde(deserialize_with = "nullable_f64")]
    pub max: f64,
    #[serde(deserialize_with = "nullable_f64")]
    pub std: f64,
}

impl ColumnStats {
    pub fn new(avg: f64, min: f64, max: f64, std: f64) -> Self {
        Self { avg, min, max, std }
    }

    /// Spread between the extremes.
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

fn nullable_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Column name -> statistics.
pub type StatsMap = BTreeMap<String, ColumnStats>;

/// One merged sample row: a timestamp plus one value per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    pub time: String,
    #[serde(flatten)]
    pub values: serde_json::Map<String, serde_json::Value>,
}

impl DataRow {
    pub fn new(time: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            values: serde_json::Map::new(),
        }
    }

    /// Builder-style helper used by fixtures and the in-memory service.
    pub fn with_value(mut self, column: impl Into<String>, value: f64) -> Self {
        self.values.insert(column.into(), serde_json::Value::from(value));
        self
    }

    /// Numeric value of `column`, accepting JSON numbers and numeric strings.
    pub fn numeric(&self, column: &str) -> Option<f64> {
        let value = match self.values.get(column)? {
            serde_json::Value::Number(n) => n.as_f64()?,
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }
}

/// Response body of `POST /merge-csvs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeResponse {
    pub available_dates: Vec<String>,
    #[serde(default)]
    pub stats_per_day: BTreeMap<String, StatsMap>,
    #[serde(default)]
    pub data_per_day: BTreeMap<String, Vec<DataRow>>,
}

/// Response body of `GET /available-dates`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailableDatesResponse {
    pub available_dates: Vec<String>,
}

/// Response body of `GET /data-by-date`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateDataResponse {
    pub date: String,
    #[serde(default)]
    pub data: Vec<DataRow>,
    #[serde(default)]
    pub stats: StatsMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_std_decodes_as_nan() {
        let stats: ColumnStats =
            serde_json::from_str(r#"{"avg": 2.0, "min": 2.0, "max": 2.0, "std": null}"#).unwrap();
        assert_eq!(stats.avg, 2.0);
        assert!(stats.std.is_nan());
    }

    #[test]
    fn test_row_keeps_column_order() {
        let row: DataRow =
            serde_json::from_str(r#"{"time": "2024-01-15T08:00:00", "zeta": 1, "alpha": 2}"#)
                .unwrap();
        let keys: Vec<&String> = row.values.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(row.time, "2024-01-15T08:00:00");
    }

    #[test]
    fn test_numeric_accepts_strings_and_drops_garbage() {
        let row: DataRow = serde_json::from_str(
            r#"{"time": "t", "a": 1.5, "b": " 2.5 ", "c": "n/a", "d": null, "e": true}"#,
        )
        .unwrap();
        assert_eq!(row.numeric("a"), Some(1.5));
        assert_eq!(row.numeric("b"), Some(2.5));
        assert_eq!(row.numeric("c"), None);
        assert_eq!(row.numeric("d"), None);
        assert_eq!(row.numeric("e"), None);
        assert_eq!(row.numeric("missing"), None);
    }

    #[test]
    fn test_merge_response_tolerates_missing_maps() {
        let resp: MergeResponse =
            serde_json::from_str(r#"{"available_dates": ["2024-01-15"]}"#).unwrap();
        assert_eq!(resp.available_dates, vec!["2024-01-15"]);
        assert!(resp.data_per_day.is_empty());
    }

    #[test]
    fn test_column_stats_range() {
        let stats = ColumnStats::new(5.0, 1.0, 9.5, 0.3);
        assert_eq!(stats.range(), 8.5);
    }
}
