//! Upload items and the files they carry.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// MIME type accepted for upload.
pub const CSV_MIME: &str = "text/csv";
/// File extension accepted for upload (compared case-insensitively).
pub const CSV_EXTENSION: &str = ".csv";

/// Where the bytes of a [`FileRef`] live.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// Read lazily from disk when the batch is sent.
    Path(PathBuf),
    /// Already in memory.
    Memory(Arc<[u8]>),
}

/// Opaque reference to a user-selected file.
#[derive(Debug, Clone)]
pub struct FileRef {
    pub name: String,
    pub declared_type: Option<String>,
    pub size_bytes: u64,
    pub source: FileSource,
}

impl FileRef {
    /// Reference a file on disk. The size is taken from the file metadata when
    /// available.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        Self {
            name,
            declared_type: None,
            size_bytes,
            source: FileSource::Path(path.to_path_buf()),
        }
    }

    /// Wrap an in-memory file.
    pub fn in_memory(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            declared_type: None,
            size_bytes: bytes.len() as u64,
            source: FileSource::Memory(Arc::from(bytes)),
        }
    }

    pub fn with_declared_type(mut self, mime: impl Into<String>) -> Self {
        self.declared_type = Some(mime.into());
        self
    }

    /// True when the declared type or the name marks this as a CSV file.
    pub fn is_csv(&self) -> bool {
        let declared = self
            .declared_type
            .as_deref()
            .map(|t| t.eq_ignore_ascii_case(CSV_MIME))
            .unwrap_or(false);
        declared || self.name.to_lowercase().ends_with(CSV_EXTENSION)
    }

    /// Size in KiB, for display.
    pub fn size_kib(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }

    /// Load the file contents.
    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        match &self.source {
            FileSource::Path(path) => tokio::fs::read(path).await,
            FileSource::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }
}

/// Lifecycle of one upload item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Waiting,
    Uploading,
    Uploaded,
    Failed,
}

/// One file in the batch.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub id: String,
    pub file: FileRef,
    /// 0..=100
    pub progress: u8,
    pub status: UploadStatus,
    pub error: Option<String>,
}

impl UploadItem {
    pub fn waiting(id: String, file: FileRef) -> Self {
        Self {
            id,
            file,
            progress: 0,
            status: UploadStatus::Waiting,
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.file.name
    }
}

/// Per-status tally of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub waiting: usize,
    pub uploading: usize,
    pub uploaded: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn tally<'a>(items: impl IntoIterator<Item = &'a UploadItem>) -> Self {
        items
            .into_iter()
            .fold(Self::default(), |mut acc, item| {
                match item.status {
                    UploadStatus::Waiting => acc.waiting += 1,
                    UploadStatus::Uploading => acc.uploading += 1,
                    UploadStatus::Uploaded => acc.uploaded += 1,
                    UploadStatus::Failed => acc.failed += 1,
                }
                acc
            })
    }

    pub fn total(&self) -> usize {
        self.waiting + self.uploading + self.uploaded + self.failed
    }
}
