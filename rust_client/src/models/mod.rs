//! Domain models shared by the upload pipeline and the analysis engine.

pub mod dataset;
pub mod upload;

pub use dataset::{DateDataset, DateOption};
pub use upload::{FileRef, FileSource, StatusCounts, UploadItem, UploadStatus};
