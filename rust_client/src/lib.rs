//! # Data Handler client core
//!
//! Batch CSV upload and interactive analysis engine for the Data Handler
//! merge service.
//!
//! A user submits a bounded batch of tabular time-series files, the remote
//! service merges them per day, and this crate turns each day's rows and
//! aggregates into the data behind histogram and time-series views.
//!
//! ## Features
//!
//! - **Batch Upload**: admission checks, per-item lifecycle and a single
//!   multipart call reconciled against every item it carried
//! - **Histograms**: equal-width binning of raw samples
//! - **Zoom Selection**: drag-to-zoom over histogram bins as an explicit state machine
//! - **Series Visibility**: per-column show/hide for the time-series chart
//! - **Statistics**: server-side aggregates filtered by the current selection
//!
//! ## Architecture
//!
//! - [`api`]: wire DTOs exchanged with the merge service
//! - [`models`]: upload items and per-date datasets
//! - [`client`]: the [`client::AnalysisService`] seam, its HTTP and in-memory
//!   implementations, configuration and errors
//! - [`services`]: upload manager, binning, selection, visibility,
//!   statistics and the analysis session that composes them

pub mod api;

pub mod client;
pub mod models;

pub mod services;

pub use client::{AnalysisService, ClientConfig, ClientError, ClientResult, ServiceFactory};
pub use services::analysis::AnalysisSession;
pub use services::upload_manager::{BatchOutcome, UploadManager, MAX_FILES};
