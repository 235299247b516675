//! In-memory analysis service implementation.
//!
//! Serves pre-seeded per-day datasets from memory, suitable for unit testing
//! and offline development. Uploaded batches are recorded rather than parsed;
//! a merge returns whatever days have been seeded.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::error::{ClientError, ClientResult, ErrorContext};
use super::service::AnalysisService;
use crate::api::{DateDataResponse, MergeResponse};
use crate::models::{DateDataset, FileRef};

/// In-memory analysis service.
///
/// # Example
/// ```
/// use data_handler::client::{AnalysisService, LocalAnalysisService};
/// use data_handler::models::DateDataset;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let service = LocalAnalysisService::new();
/// service.seed_dataset(DateDataset::new("2024-01-15", vec![], Default::default()));
///
/// let dates = service.available_dates().await.unwrap();
/// assert_eq!(dates, vec!["2024-01-15"]);
/// # });
/// ```
#[derive(Clone, Default)]
pub struct LocalAnalysisService {
    data: Arc<RwLock<LocalData>>,
}

#[derive(Default)]
struct LocalData {
    datasets: BTreeMap<String, DateDataset>,
    /// File names of every merge call, in call order
    uploads: Vec<Vec<String>>,
    clear_calls: usize,
    /// Error message returned by the next calls of the matching operation
    failures: BTreeMap<&'static str, String>,
}

impl LocalAnalysisService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make one day's data available.
    pub fn seed_dataset(&self, dataset: DateDataset) {
        self.data
            .write()
            .datasets
            .insert(dataset.date.clone(), dataset);
    }

    /// Make `operation` ("merge_csvs", "available_dates", "data_by_date",
    /// "clear_data") fail with `message` until [`clear_failure`](Self::clear_failure).
    pub fn fail_with(&self, operation: &'static str, message: impl Into<String>) {
        self.data.write().failures.insert(operation, message.into());
    }

    pub fn clear_failure(&self, operation: &'static str) {
        self.data.write().failures.remove(operation);
    }

    /// File names carried by each merge call so far.
    pub fn uploads(&self) -> Vec<Vec<String>> {
        self.data.read().uploads.clone()
    }

    pub fn clear_calls(&self) -> usize {
        self.data.read().clear_calls
    }

    fn check_failure(&self, operation: &'static str) -> ClientResult<()> {
        match self.data.read().failures.get(operation) {
            Some(message) => Err(ClientError::status(
                500,
                message.clone(),
                ErrorContext::new(operation),
            )),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AnalysisService for LocalAnalysisService {
    async fn merge_csvs(&self, files: &[FileRef]) -> ClientResult<MergeResponse> {
        self.check_failure("merge_csvs")?;

        let mut data = self.data.write();
        data.uploads
            .push(files.iter().map(|f| f.name.clone()).collect());

        let mut response = MergeResponse::default();
        for (date, dataset) in &data.datasets {
            response.available_dates.push(date.clone());
            response
                .stats_per_day
                .insert(date.clone(), dataset.stats.clone());
            response
                .data_per_day
                .insert(date.clone(), dataset.rows.clone());
        }
        Ok(response)
    }

    async fn available_dates(&self) -> ClientResult<Vec<String>> {
        self.check_failure("available_dates")?;
        Ok(self.data.read().datasets.keys().cloned().collect())
    }

    async fn data_by_date(&self, date: &str) -> ClientResult<DateDataResponse> {
        self.check_failure("data_by_date")?;
        let data = self.data.read();
        let dataset = data.datasets.get(date).ok_or_else(|| {
            ClientError::status(
                404,
                format!("No data for {}", date),
                ErrorContext::new("data_by_date").with_details(format!("date={}", date)),
            )
        })?;
        Ok(DateDataResponse {
            date: dataset.date.clone(),
            data: dataset.rows.clone(),
            stats: dataset.stats.clone(),
        })
    }

    async fn clear_data(&self) -> ClientResult<()> {
        self.check_failure("clear_data")?;
        let mut data = self.data.write();
        data.clear_calls += 1;
        data.datasets.clear();
        Ok(())
    }
}
