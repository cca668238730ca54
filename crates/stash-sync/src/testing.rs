//! In-memory fakes shared by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::cache::QueryInvalidator;
use stash_api_client::FileCatalog;
use stash_core::models::{FileCandidate, FileRecord, FileReferences, StorageStats, UploadResponse};
use stash_core::{FilterSnapshot, QueryKey, TransportError};

pub fn record(name: &str, size: u64) -> FileRecord {
    serde_json::from_value(json!({
        "id": Uuid::new_v4(),
        "file": format!("/media/uploads/{}", name),
        "original_filename": name,
        "file_type": "application/pdf",
        "size": size,
        "uploaded_at": "2024-03-01T10:00:00Z",
        "file_hash": "9f86d081884c7d65",
        "is_duplicate": false,
        "reference_count": 1
    }))
    .unwrap()
}

pub fn stats(uploaded: u64, stored: u64) -> StorageStats {
    serde_json::from_value(json!({
        "total_files_uploaded": 2,
        "unique_files_stored": 1,
        "total_size_uploaded": uploaded,
        "actual_size_stored": stored,
        "space_saved": uploaded - stored,
        "space_saved_mb": 0.0,
        "total_size_mb": 0.0,
        "actual_size_mb": 0.0,
        "savings_percentage": 50.0,
        "last_updated": "2024-03-01T10:00:00Z"
    }))
    .unwrap()
}

/// Scriptable catalog that counts calls.
#[derive(Default)]
pub struct FakeCatalog {
    pub uploads: AtomicUsize,
    pub lists: AtomicUsize,
    pub stats_calls: AtomicUsize,
    pub deletes: AtomicUsize,
    pub reference_calls: AtomicUsize,
    pub fail_uploads: AtomicBool,
    pub fail_lists: AtomicBool,
    pub duplicate: AtomicBool,
    pub space_saved: Mutex<Option<u64>>,
    /// When set, uploads wait for a notification before answering.
    pub gate: Option<Arc<Notify>>,
    pub files: Mutex<Vec<FileRecord>>,
}

impl FakeCatalog {
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (
            Self {
                gate: Some(Arc::clone(&gate)),
                ..Self::default()
            },
            gate,
        )
    }

    pub fn duplicate_of(space_saved: u64) -> Self {
        let catalog = Self::default();
        catalog.duplicate.store(true, Ordering::SeqCst);
        *catalog.space_saved.lock().unwrap() = Some(space_saved);
        catalog
    }

    pub fn failing() -> Self {
        let catalog = Self::default();
        catalog.fail_uploads.store(true, Ordering::SeqCst);
        catalog
    }
}

#[async_trait]
impl FileCatalog for FakeCatalog {
    async fn upload_file(&self, candidate: &FileCandidate) -> Result<UploadResponse, TransportError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(TransportError::Request("connection reset".to_string()));
        }
        let is_duplicate = self.duplicate.load(Ordering::SeqCst);
        Ok(UploadResponse {
            file: record(&candidate.file_name, candidate.size()),
            is_duplicate,
            message: if is_duplicate {
                "Duplicate file detected. Linked to existing file.".to_string()
            } else {
                "File uploaded successfully".to_string()
            },
            space_saved: *self.space_saved.lock().unwrap(),
        })
    }

    async fn list_files(&self, filters: &FilterSnapshot) -> Result<Vec<FileRecord>, TransportError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(TransportError::Status {
                status: 500,
                body: "boom".to_string(),
            });
        }
        let files = self.files.lock().unwrap();
        Ok(files
            .iter()
            .filter(|f| f.original_filename.contains(&filters.search))
            .cloned()
            .collect())
    }

    async fn delete_file(&self, id: Uuid) -> Result<(), TransportError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut files = self.files.lock().unwrap();
        let before = files.len();
        files.retain(|f| f.id != id);
        if files.len() == before {
            return Err(TransportError::Status {
                status: 404,
                body: "Not found.".to_string(),
            });
        }
        Ok(())
    }

    async fn storage_stats(&self) -> Result<StorageStats, TransportError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        Ok(stats(4096, 2048))
    }

    async fn file_types(&self) -> Result<Vec<String>, TransportError> {
        Ok(vec!["application/pdf".to_string()])
    }

    async fn file_references(&self, id: Uuid) -> Result<FileReferences, TransportError> {
        self.reference_calls.fetch_add(1, Ordering::SeqCst);
        let files = self.files.lock().unwrap();
        let original = files
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                status: 404,
                body: "Not found.".to_string(),
            })?;
        Ok(FileReferences {
            original_file: original,
            references: Vec::new(),
            total_references: 0,
        })
    }
}

/// Invalidator that records each batch it receives.
#[derive(Default)]
pub struct RecordingInvalidator {
    pub batches: Mutex<Vec<Vec<QueryKey>>>,
}

impl RecordingInvalidator {
    pub fn batches(&self) -> Vec<Vec<QueryKey>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryInvalidator for RecordingInvalidator {
    async fn invalidate(&self, keys: &[QueryKey]) {
        self.batches.lock().unwrap().push(keys.to_vec());
    }
}
