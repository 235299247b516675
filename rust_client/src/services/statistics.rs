//! Statistics table filtering.

use serde::{Deserialize, Serialize};

use crate::api::{ColumnStats, StatsMap};

/// Which columns a view shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnFilter {
    #[default]
    All,
    Column(String),
}

impl ColumnFilter {
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(name.into())
    }
}

/// Statistics rows to display, in column order.
///
/// `All` returns every column in `columns` that has statistics. A single
/// column returns one entry, or `None` when that column has no statistics;
/// missing statistics are never filled in with zeros.
pub fn filter_stats<'a>(
    stats: &'a StatsMap,
    columns: &'a [String],
    filter: &ColumnFilter,
) -> Option<Vec<(&'a str, &'a ColumnStats)>> {
    match filter {
        ColumnFilter::All => Some(
            columns
                .iter()
                .filter_map(|c| stats.get_key_value(c.as_str()))
                .map(|(k, v)| (k.as_str(), v))
                .collect(),
        ),
        ColumnFilter::Column(name) => stats
            .get_key_value(name.as_str())
            .map(|(k, v)| vec![(k.as_str(), v)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (StatsMap, Vec<String>) {
        let mut stats = StatsMap::new();
        stats.insert("temp".into(), ColumnStats::new(21.0, 18.0, 25.0, 1.5));
        stats.insert("humidity".into(), ColumnStats::new(40.0, 30.0, 55.0, 4.0));
        // columns in row order, with one column lacking statistics
        let columns = vec!["temp".to_string(), "pressure".to_string(), "humidity".to_string()];
        (stats, columns)
    }

    #[test]
    fn test_all_follows_column_order() {
        let (stats, columns) = fixture();
        let rows = filter_stats(&stats, &columns, &ColumnFilter::All).unwrap();
        let names: Vec<&str> = rows.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["temp", "humidity"]);
    }

    #[test]
    fn test_single_column() {
        let (stats, columns) = fixture();
        let rows = filter_stats(&stats, &columns, &ColumnFilter::column("humidity")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1.max, 55.0);
        assert_eq!(rows[0].1.range(), 25.0);
    }

    #[test]
    fn test_absent_column_is_none() {
        let (stats, columns) = fixture();
        assert!(filter_stats(&stats, &columns, &ColumnFilter::column("pressure")).is_none());
        assert!(filter_stats(&stats, &columns, &ColumnFilter::column("nope")).is_none());
    }
}
