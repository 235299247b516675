//! Drag-to-zoom selection over histogram bins.
//!
//! The gesture is an explicit three-state machine:
//!
//! ```text
//!            begin_drag(p)               end_drag (anchor != cursor)
//!   Idle ──────────────────▶ Dragging ──────────────────────────────▶ Committed
//!    ▲                        │  ▲ update_drag(p)                       │
//!    │   end_drag (degenerate)│  └──┘                                   │
//!    ├────────────────────────┘                                         │
//!    └──────────────────────────────── reset() ─────────────────────────┘
//! ```
//!
//! Positions are bin indices. Committing maps the index range back to the bin
//! boundary values, which become the visible value domain.

use serde::{Deserialize, Serialize};

use super::binning::HistogramBin;

/// Phase of the drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionState {
    Idle,
    Dragging,
    Committed,
}

/// Zoom state for one (dataset, column) pair.
///
/// `committed_min..=committed_max` is the value domain currently shown; in
/// `Idle` it equals the full data range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomSelection {
    state: SelectionState,
    anchor: Option<usize>,
    cursor: Option<usize>,
    committed_min: f64,
    committed_max: f64,
    /// Committed bin index range, inclusive
    committed_bins: Option<(usize, usize)>,
    full_min: f64,
    full_max: f64,
}

impl ZoomSelection {
    /// Start idle over the full `[min, max]` data range. Reversed bounds are
    /// swapped.
    pub fn new(full_min: f64, full_max: f64) -> Self {
        let (lo, hi) = if full_min <= full_max {
            (full_min, full_max)
        } else {
            (full_max, full_min)
        };
        Self {
            state: SelectionState::Idle,
            anchor: None,
            cursor: None,
            committed_min: lo,
            committed_max: hi,
            committed_bins: None,
            full_min: lo,
            full_max: hi,
        }
    }

    /// Idle selection over an empty domain, used when there is nothing to plot.
    pub fn empty() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Visible value domain.
    pub fn domain(&self) -> (f64, f64) {
        (self.committed_min, self.committed_max)
    }

    pub fn full_range(&self) -> (f64, f64) {
        (self.full_min, self.full_max)
    }

    /// Inclusive bin range of the committed selection.
    pub fn committed_bins(&self) -> Option<(usize, usize)> {
        self.committed_bins
    }

    /// Bin range to highlight while dragging, ordered low to high.
    pub fn preview(&self) -> Option<(usize, usize)> {
        match (self.state, self.anchor, self.cursor) {
            (SelectionState::Dragging, Some(a), Some(c)) => Some((a.min(c), a.max(c))),
            _ => None,
        }
    }

    /// Press at `position`. Any pending drag is abandoned; a committed zoom
    /// stays in effect until the new drag commits or collapses.
    pub fn begin_drag(&mut self, position: usize) {
        self.state = SelectionState::Dragging;
        self.anchor = Some(position);
        self.cursor = None;
    }

    /// Pointer moved to `position`. Last write wins; ignored unless dragging.
    pub fn update_drag(&mut self, position: usize) {
        if self.state == SelectionState::Dragging {
            self.cursor = Some(position);
        }
    }

    /// Release. Commits `[min(anchor, cursor), max(anchor, cursor)]` mapped
    /// onto `bins`; a drag missing either end, or with both ends on the same
    /// bin, collapses back to `Idle` over the full range.
    pub fn end_drag(&mut self, bins: &[HistogramBin]) -> SelectionState {
        if self.state != SelectionState::Dragging {
            return self.state;
        }

        let range = match (self.anchor, self.cursor) {
            (Some(a), Some(c)) if a != c => Some((a.min(c), a.max(c))),
            _ => None,
        };

        match range.and_then(|(lo, hi)| Self::bin_bounds(bins, lo, hi)) {
            Some((lo, hi, min, max)) => {
                self.anchor = None;
                self.cursor = None;
                self.committed_bins = Some((lo, hi));
                self.committed_min = min;
                self.committed_max = max;
                self.state = SelectionState::Committed;
            }
            None => self.reset(),
        }
        self.state
    }

    /// Back to `Idle` over the full data range.
    pub fn reset(&mut self) {
        self.state = SelectionState::Idle;
        self.anchor = None;
        self.cursor = None;
        self.committed_bins = None;
        self.committed_min = self.full_min;
        self.committed_max = self.full_max;
    }

    /// Boundary values of bins `lo..=hi`, with `hi` clamped to the last bin.
    fn bin_bounds(bins: &[HistogramBin], lo: usize, hi: usize) -> Option<(usize, usize, f64, f64)> {
        let last = bins.len().checked_sub(1)?;
        let hi = hi.min(last);
        if lo > hi {
            return None;
        }
        let min = bins[lo].start;
        let max = bins[hi].end;
        Some((lo, hi, min.min(max), min.max(max)))
    }
}

impl Default for ZoomSelection {
    fn default() -> Self {
        Self::empty()
    }
}
