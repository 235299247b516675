//! Batch upload of CSV files.
//!
//! Files are admitted into a bounded batch as `Waiting` items and sent together
//! in a single multipart request:
//!
//! ```text
//! Waiting ──upload()──▶ Uploading ──ok──▶ Uploaded
//!                           │
//!                           └──err / cancel / drop──▶ Failed
//! ```
//!
//! The batch is an immutable `Arc<Vec<UploadItem>>` swapped wholesale on every
//! mutation, so readers always see a complete snapshot. Transitions are pure
//! functions over `(items, ids)`; an upload only ever resolves the ids it
//! dispatched.

use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::MergeResponse;
use crate::client::config::DEFAULT_MAX_FILES;
use crate::client::{AnalysisService, ClientConfig};
use crate::models::{FileRef, StatusCounts, UploadItem, UploadStatus};

/// Ceiling on the number of items in one batch.
pub const MAX_FILES: usize = DEFAULT_MAX_FILES;

const CANCELLED_MESSAGE: &str = "upload cancelled";
const ABORTED_MESSAGE: &str = "upload aborted";

/// Why a candidate file (or a whole admission call) was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("{name} is not a CSV file")]
    NotCsv { name: String },

    #[error("Cannot add {attempted} files: the batch holds {current} of at most {max}")]
    CapacityExceeded {
        current: usize,
        attempted: usize,
        max: usize,
    },
}

/// Result of one [`UploadManager::admit`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdmissionResult {
    /// Ids of the items appended, in candidate order
    pub admitted: Vec<String>,
    pub diagnostics: Vec<AdmissionError>,
}

impl AdmissionResult {
    /// True when the capacity check rejected the whole call.
    pub fn is_rejected(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, AdmissionError::CapacityExceeded { .. }))
    }
}

/// How an upload call ended.
#[derive(Debug)]
pub enum BatchOutcome {
    /// No `Waiting` items; no request was made.
    NothingToUpload,
    /// Another upload is still running; no request was made.
    AlreadyInFlight,
    Uploaded {
        ids: Vec<String>,
        response: MergeResponse,
    },
    Failed {
        ids: Vec<String>,
        error: String,
    },
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Uploaded { .. })
    }
}

/// Owns the batch and performs the upload.
pub struct UploadManager {
    service: Arc<dyn AnalysisService>,
    items: RwLock<Arc<Vec<UploadItem>>>,
    ids: Mutex<IdGenerator>,
    in_flight: AtomicBool,
    max_files: usize,
}

impl UploadManager {
    pub fn new(service: Arc<dyn AnalysisService>) -> Self {
        Self::with_max_files(service, MAX_FILES)
    }

    pub fn with_max_files(service: Arc<dyn AnalysisService>, max_files: usize) -> Self {
        Self {
            service,
            items: RwLock::new(Arc::new(Vec::new())),
            ids: Mutex::new(IdGenerator::default()),
            in_flight: AtomicBool::new(false),
            max_files,
        }
    }

    pub fn from_config(service: Arc<dyn AnalysisService>, config: &ClientConfig) -> Self {
        Self::with_max_files(service, config.upload.max_files)
    }

    /// Add candidate files to the batch.
    ///
    /// Non-CSV files are skipped with one diagnostic each. If the CSV files
    /// would push the batch past the ceiling, none of them are added.
    pub fn admit(&self, candidates: impl IntoIterator<Item = FileRef>) -> AdmissionResult {
        let mut result = AdmissionResult::default();
        let mut accepted = Vec::new();
        for file in candidates {
            if file.is_csv() {
                accepted.push(file);
            } else {
                log::warn!("Skipping non-CSV file '{}'", file.name);
                result.diagnostics.push(AdmissionError::NotCsv { name: file.name });
            }
        }
        if accepted.is_empty() {
            return result;
        }

        let mut items = self.items.write();
        let current = items.len();
        if current + accepted.len() > self.max_files {
            log::warn!(
                "Rejecting {} files: batch holds {} of {}",
                accepted.len(),
                current,
                self.max_files
            );
            result.diagnostics.push(AdmissionError::CapacityExceeded {
                current,
                attempted: accepted.len(),
                max: self.max_files,
            });
            return result;
        }

        let mut next = Vec::with_capacity(current + accepted.len());
        next.extend(items.iter().cloned());
        {
            let mut ids = self.ids.lock();
            for file in accepted {
                let id = ids.next_id(&file.name);
                result.admitted.push(id.clone());
                next.push(UploadItem::waiting(id, file));
            }
        }
        *items = Arc::new(next);

        log::info!(
            "Admitted {} files ({} in batch)",
            result.admitted.len(),
            items.len()
        );
        result
    }

    /// Drop one item whatever its status.
    pub fn remove(&self, id: &str) -> bool {
        let mut items = self.items.write();
        if !items.iter().any(|i| i.id == id) {
            return false;
        }
        *items = Arc::new(items.iter().filter(|i| i.id != id).cloned().collect());
        true
    }

    /// Empty the batch.
    pub fn reset_all(&self) {
        *self.items.write() = Arc::new(Vec::new());
    }

    /// Send every `Waiting` item in one request.
    pub async fn upload(&self) -> BatchOutcome {
        self.upload_with_cancel(&CancellationToken::new()).await
    }

    /// [`upload`](Self::upload), abandoned when `token` is cancelled.
    ///
    /// Cancellation marks the dispatched items `Failed`. Dropping the returned
    /// future mid-flight does the same.
    pub async fn upload_with_cancel(&self, token: &CancellationToken) -> BatchOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("Upload requested while another is in flight");
            return BatchOutcome::AlreadyInFlight;
        }
        let _flight = FlightGuard(&self.in_flight);

        let (ids, order, files) = {
            let mut items = self.items.write();
            let waiting: Vec<&UploadItem> = items
                .iter()
                .filter(|i| i.status == UploadStatus::Waiting)
                .collect();
            if waiting.is_empty() {
                return BatchOutcome::NothingToUpload;
            }
            let order: Vec<String> = waiting.iter().map(|i| i.id.clone()).collect();
            let files: Vec<FileRef> = waiting.iter().map(|i| i.file.clone()).collect();
            let ids: HashSet<String> = order.iter().cloned().collect();
            *items = Arc::new(mark_uploading(&items, &ids));
            (ids, order, files)
        };

        log::info!("Uploading {} files", files.len());
        let mut abort = AbortGuard {
            manager: self,
            ids: &ids,
            armed: true,
        };

        let result = tokio::select! {
            result = self.service.merge_csvs(&files) => Some(result),
            _ = token.cancelled() => None,
        };
        abort.armed = false;

        match result {
            Some(Ok(response)) => {
                self.apply(|items| mark_uploaded(items, &ids));
                log::info!(
                    "Uploaded {} files; {} dates available",
                    order.len(),
                    response.available_dates.len()
                );
                BatchOutcome::Uploaded {
                    ids: order,
                    response,
                }
            }
            Some(Err(err)) => {
                log::error!("Upload failed: {}", err);
                let message = format!("Failed to upload files: {}", err.user_message());
                self.apply(|items| mark_failed(items, &ids, &message));
                BatchOutcome::Failed {
                    ids: order,
                    error: message,
                }
            }
            None => {
                log::warn!("Upload of {} files cancelled", order.len());
                self.apply(|items| mark_failed(items, &ids, CANCELLED_MESSAGE));
                BatchOutcome::Failed {
                    ids: order,
                    error: CANCELLED_MESSAGE.to_string(),
                }
            }
        }
    }

    /// Current batch snapshot.
    pub fn items(&self) -> Arc<Vec<UploadItem>> {
        Arc::clone(&self.items.read())
    }

    pub fn get(&self, id: &str) -> Option<UploadItem> {
        self.items.read().iter().find(|i| i.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn status_counts(&self) -> StatusCounts {
        StatusCounts::tally(self.items.read().iter())
    }

    /// Whether an upload would send anything.
    pub fn has_waiting(&self) -> bool {
        self.status_counts().waiting > 0
    }

    /// Whether any item has finished, successfully or not.
    pub fn can_reset(&self) -> bool {
        let counts = self.status_counts();
        counts.uploaded + counts.failed > 0
    }

    pub fn is_uploading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    fn apply(&self, transition: impl FnOnce(&[UploadItem]) -> Vec<UploadItem>) {
        let mut items = self.items.write();
        *items = Arc::new(transition(&items));
    }
}

/// Clears the in-flight flag when the upload call ends, however it ends.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Fails the dispatched items if the upload future is dropped before it
/// resolves.
struct AbortGuard<'a> {
    manager: &'a UploadManager,
    ids: &'a HashSet<String>,
    armed: bool,
}

impl Drop for AbortGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            log::warn!("Upload of {} files aborted", self.ids.len());
            self.manager
                .apply(|items| mark_failed(items, self.ids, ABORTED_MESSAGE));
        }
    }
}

/// Issues ids of the form `name-millis-suffix`, never repeating one.
#[derive(Debug, Default)]
struct IdGenerator {
    last_millis: i64,
    issued: HashSet<String>,
}

impl IdGenerator {
    fn next_id(&mut self, name: &str) -> String {
        // Wall clock may step backwards; never let the timestamp part do so
        let millis = chrono::Utc::now().timestamp_millis().max(self.last_millis);
        self.last_millis = millis;
        loop {
            let suffix = Uuid::new_v4().simple().to_string();
            let id = format!("{}-{}-{}", name, millis, &suffix[..9]);
            if self.issued.insert(id.clone()) {
                return id;
            }
        }
    }
}

/// `Waiting` items in `ids` become `Uploading` at progress 0.
pub fn mark_uploading(items: &[UploadItem], ids: &HashSet<String>) -> Vec<UploadItem> {
    transition(items, ids, UploadStatus::Waiting, |item| {
        item.status = UploadStatus::Uploading;
        item.progress = 0;
        item.error = None;
    })
}

/// `Uploading` items in `ids` become `Uploaded` at progress 100.
pub fn mark_uploaded(items: &[UploadItem], ids: &HashSet<String>) -> Vec<UploadItem> {
    transition(items, ids, UploadStatus::Uploading, |item| {
        item.status = UploadStatus::Uploaded;
        item.progress = 100;
    })
}

/// `Uploading` items in `ids` become `Failed` with `message`.
pub fn mark_failed(items: &[UploadItem], ids: &HashSet<String>, message: &str) -> Vec<UploadItem> {
    transition(items, ids, UploadStatus::Uploading, |item| {
        item.status = UploadStatus::Failed;
        item.error = Some(message.to_string());
    })
}

fn transition(
    items: &[UploadItem],
    ids: &HashSet<String>,
    from: UploadStatus,
    update: impl Fn(&mut UploadItem),
) -> Vec<UploadItem> {
    items
        .iter()
        .cloned()
        .map(|mut item| {
            if item.status == from && ids.contains(&item.id) {
                update(&mut item);
            }
            item
        })
        .collect()
}

#[cfg(test)]
#[path = "upload_manager_tests.rs"]
mod tests;
