//! Client-side services built on top of the [`AnalysisService`] seam.
//!
//! - `upload_manager`: batch admission and the single multipart upload
//! - `analysis`: per-date analysis session driving the views below
//! - `binning`, `selection`, `visibility`, `statistics`: pure view state
//! - `date_format`: localized date and time labels
//!
//! [`AnalysisService`]: crate::client::AnalysisService

pub mod analysis;
pub mod binning;
pub mod date_format;
pub mod selection;
pub mod statistics;
pub mod upload_manager;
pub mod visibility;

pub use analysis::{AnalysisSession, HistogramView, SeriesPoint, TimeSeriesView};
pub use binning::{compute_histogram, HistogramBin};
pub use date_format::DateFormatter;
pub use selection::{SelectionState, ZoomSelection};
pub use statistics::{filter_stats, ColumnFilter};
pub use upload_manager::{AdmissionError, AdmissionResult, BatchOutcome, UploadManager, MAX_FILES};
pub use visibility::SeriesVisibility;
