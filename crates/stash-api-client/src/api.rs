//! Domain methods for the catalog API client.
//!
//! Response types live in `stash_core::models`. Every catalog method is a single
//! request with no retries; retry policy belongs to the caller.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Url;
use uuid::Uuid;

use crate::ApiClient;
use stash_core::models::{
    FileCandidate, FileRecord, FileReferences, FileTypesResponse, StorageStats, UploadResponse,
};
use stash_core::{DownloadError, FilterSnapshot, TransportError};

/// The remote catalog as seen by the sync layer.
#[async_trait]
pub trait FileCatalog: Send + Sync {
    async fn upload_file(&self, candidate: &FileCandidate) -> Result<UploadResponse, TransportError>;

    async fn list_files(&self, filters: &FilterSnapshot) -> Result<Vec<FileRecord>, TransportError>;

    async fn delete_file(&self, id: Uuid) -> Result<(), TransportError>;

    async fn storage_stats(&self) -> Result<StorageStats, TransportError>;

    async fn file_types(&self) -> Result<Vec<String>, TransportError>;

    async fn file_references(&self, id: Uuid) -> Result<FileReferences, TransportError>;
}

#[async_trait]
impl FileCatalog for ApiClient {
    /// Upload one file as multipart field `file`.
    async fn upload_file(&self, candidate: &FileCandidate) -> Result<UploadResponse, TransportError> {
        let mut part = reqwest::multipart::Part::bytes(candidate.data.to_vec())
            .file_name(candidate.file_name.clone());
        if let Some(content_type) = &candidate.content_type {
            part = part.mime_str(content_type).map_err(|e| {
                TransportError::Request(format!("Invalid content type {}: {}", content_type, e))
            })?;
        }
        let form = reqwest::multipart::Form::new().part("file", part);

        tracing::debug!(
            file_name = %candidate.file_name,
            size = candidate.size(),
            "Uploading file"
        );
        self.post_multipart("/files/", form).await
    }

    /// List files matching the settled filters. Empty filters are not sent.
    async fn list_files(&self, filters: &FilterSnapshot) -> Result<Vec<FileRecord>, TransportError> {
        self.get("/files/", &filters.to_query_pairs()).await
    }

    async fn delete_file(&self, id: Uuid) -> Result<(), TransportError> {
        self.delete(&format!("/files/{}/", id)).await
    }

    async fn storage_stats(&self) -> Result<StorageStats, TransportError> {
        let stats: StorageStats = self.get("/files/storage_stats/", &[]).await?;
        if !stats.is_consistent() {
            tracing::warn!(
                total_size_uploaded = stats.total_size_uploaded,
                actual_size_stored = stats.actual_size_stored,
                space_saved = stats.space_saved,
                "Storage stats violate uploaded/stored/saved invariant"
            );
        }
        Ok(stats)
    }

    async fn file_types(&self) -> Result<Vec<String>, TransportError> {
        let response: FileTypesResponse = self.get("/files/file_types/", &[]).await?;
        Ok(response.file_types)
    }

    async fn file_references(&self, id: Uuid) -> Result<FileReferences, TransportError> {
        self.get(&format!("/files/{}/references/", id), &[]).await
    }
}

impl ApiClient {
    /// Resolve a stored file URL. Relative URLs are taken against the API origin.
    pub fn resolve_file_url(&self, file_url: &str) -> Result<Url, TransportError> {
        if let Ok(url) = Url::parse(file_url) {
            return Ok(url);
        }
        let base = Url::parse(self.base_url())
            .map_err(|e| TransportError::Request(format!("Invalid base URL: {}", e)))?;
        base.join(file_url)
            .map_err(|e| TransportError::Request(format!("Invalid file URL {}: {}", file_url, e)))
    }

    /// Fetch a stored file and save it as `dir/<original filename>`.
    pub async fn download_file(
        &self,
        record: &FileRecord,
        dir: &Path,
    ) -> Result<PathBuf, DownloadError> {
        let url = self.resolve_file_url(&record.file).map_err(DownloadError::Fetch)?;

        let response = self
            .client()
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::Fetch(TransportError::Request(e.to_string())))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DownloadError::Fetch(TransportError::Status {
                status: status.as_u16(),
                body,
            }));
        }
        let data = response
            .bytes()
            .await
            .map_err(|e| DownloadError::Fetch(TransportError::Request(e.to_string())))?;

        let file_name = Path::new(&record.original_filename)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "download".into());
        let target = dir.join(file_name);

        tokio::fs::write(&target, &data)
            .await
            .map_err(|source| DownloadError::Write {
                path: target.clone(),
                source,
            })?;

        tracing::info!(
            file_id = %record.id,
            path = %target.display(),
            bytes = data.len(),
            "Downloaded file"
        );
        Ok(target)
    }
}
