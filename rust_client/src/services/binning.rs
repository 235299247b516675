//! Histogram binning of raw samples.

use serde::{Deserialize, Serialize};

use crate::api::DataRow;

/// Smallest bin count offered by the histogram controls.
pub const MIN_BIN_COUNT: usize = 5;
/// Largest bin count offered by the histogram controls.
pub const MAX_BIN_COUNT: usize = 50;
/// Bin count used until the user picks another.
pub const DEFAULT_BIN_COUNT: usize = 20;

/// One interval of the histogram domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub count: usize,
    /// Samples that fell in this bin, in input order
    pub member_values: Vec<f64>,
}

impl HistogramBin {
    /// Range label, e.g. `"1.00 - 2.50"`.
    pub fn label(&self) -> String {
        format!("{:.2} - {:.2}", self.start, self.end)
    }

    /// Percentage of `total` samples in this bin; 0 when `total` is 0.
    pub fn share_of(&self, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        self.count as f64 / total as f64 * 100.0
    }
}

/// Partition samples into `bin_count` equal-width bins over `[min, max]`.
///
/// Non-finite samples are dropped first. An empty input (or `bin_count == 0`)
/// yields no bins. When every sample is equal the width falls back to 1, so
/// all samples land in bin 0. Values exactly on `max` are clamped into the
/// last bin.
pub fn compute_histogram(values: &[f64], bin_count: usize) -> Vec<HistogramBin> {
    if bin_count == 0 {
        return Vec::new();
    }

    let mut samples = values.iter().copied().filter(|v| v.is_finite());
    let Some(first) = samples.next() else {
        return Vec::new();
    };
    let (min, max) = samples.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

    // span overflows when min and max sit near opposite ends of f64
    let span = max - min;
    let slots = bin_count as f64;
    let mut width = if span.is_finite() {
        span / slots
    } else {
        max / slots - min / slots
    };
    if width == 0.0 {
        width = 1.0;
    }
    let bound = |i: usize| {
        if span.is_finite() {
            min + i as f64 * width
        } else {
            let t = i as f64 / slots;
            min * (1.0 - t) + max * t
        }
    };

    let mut bins: Vec<HistogramBin> = (0..bin_count)
        .map(|i| HistogramBin {
            index: i,
            start: bound(i),
            end: bound(i + 1),
            count: 0,
            member_values: Vec::new(),
        })
        .collect();

    for &value in values.iter().filter(|v| v.is_finite()) {
        let offset = if span.is_finite() {
            (value - min) / width
        } else {
            value / width - min / width
        };
        let idx = (offset.floor() as usize).min(bin_count - 1);
        let bin = &mut bins[idx];
        bin.count += 1;
        bin.member_values.push(value);
    }

    bins
}

/// Numeric samples of `column` across `rows`, skipping non-numeric entries.
pub fn column_values(rows: &[DataRow], column: &str) -> Vec<f64> {
    rows.iter().filter_map(|row| row.numeric(column)).collect()
}

/// Total number of samples across all bins.
pub fn total_count(bins: &[HistogramBin]) -> usize {
    bins.iter().map(|b| b.count).sum()
}

/// Clamp a requested bin count into the supported range.
pub fn clamp_bin_count(requested: usize) -> usize {
    requested.clamp(MIN_BIN_COUNT, MAX_BIN_COUNT)
}
