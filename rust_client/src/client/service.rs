//! Trait for the remote merge/analysis service.

use async_trait::async_trait;

use super::error::ClientResult;
use crate::api::{DateDataResponse, MergeResponse};
use crate::models::FileRef;

/// Remote collaborator that merges uploaded CSV files and serves the merged
/// data per day.
///
/// The contract is fixed: one multipart call for a whole batch, a date list,
/// per-date rows with aggregates, and a call that drops all server-held state
/// for the session.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Upload a batch of files in a single multipart request.
    ///
    /// # Arguments
    /// * `files` - Every file of the batch, sent under the repeated field `files`
    ///
    /// # Returns
    /// * `Ok(MergeResponse)` - Dates, per-day statistics and per-day rows
    /// * `Err(ClientError)` - Transport failure or any non-200 response
    async fn merge_csvs(&self, files: &[FileRef]) -> ClientResult<MergeResponse>;

    /// List the ISO-8601 dates present in the merged data.
    async fn available_dates(&self) -> ClientResult<Vec<String>>;

    /// Fetch the rows and statistics of one date.
    ///
    /// # Arguments
    /// * `date` - ISO-8601 date key as returned by [`available_dates`](Self::available_dates)
    async fn data_by_date(&self, date: &str) -> ClientResult<DateDataResponse>;

    /// Drop every piece of server-held state for this session.
    async fn clear_data(&self) -> ClientResult<()>;
}
