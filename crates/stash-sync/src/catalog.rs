//! Cached read views over the remote catalog.

use std::sync::Arc;

use uuid::Uuid;

use crate::cache::{QueryCache, QueryInvalidator};
use stash_api_client::FileCatalog;
use stash_core::models::{FileRecord, FileReferences, StorageStats};
use stash_core::{FilterSnapshot, QueryKey, TransportError};

/// List, stats and type reads go through the shared [`QueryCache`], mutations
/// invalidate it.
#[derive(Clone)]
pub struct CatalogView {
    catalog: Arc<dyn FileCatalog>,
    cache: QueryCache,
}

impl CatalogView {
    pub fn new(catalog: Arc<dyn FileCatalog>, cache: QueryCache) -> Self {
        Self { catalog, cache }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Files matching a settled filter snapshot. Each distinct snapshot is cached
    /// separately.
    pub async fn files(&self, filters: &FilterSnapshot) -> Result<Vec<FileRecord>, TransportError> {
        let catalog = Arc::clone(&self.catalog);
        self.cache
            .read(QueryKey::Files, &filters.cache_key(), || async move {
                catalog.list_files(filters).await
            })
            .await
    }

    pub async fn storage_stats(&self) -> Result<StorageStats, TransportError> {
        let catalog = Arc::clone(&self.catalog);
        self.cache
            .read(QueryKey::StorageStats, "", || async move {
                catalog.storage_stats().await
            })
            .await
    }

    pub async fn file_types(&self) -> Result<Vec<String>, TransportError> {
        let catalog = Arc::clone(&self.catalog);
        self.cache
            .read(QueryKey::FileTypes, "", || async move {
                catalog.file_types().await
            })
            .await
    }

    /// Reference graph of one file, always fetched. Every upload can add a reference
    /// to any file, so there is no cached copy to keep fresh.
    pub async fn file_references(&self, id: Uuid) -> Result<FileReferences, TransportError> {
        tracing::debug!(file_id = %id, "Fetching file references");
        self.catalog.file_references(id).await
    }

    /// Delete a file, then invalidate every view the deletion could change.
    ///
    /// Nothing is invalidated when the server refuses.
    pub async fn delete_file(&self, id: Uuid) -> Result<(), TransportError> {
        self.catalog.delete_file(id).await?;
        tracing::info!(file_id = %id, "File deleted");
        self.cache.invalidate(&QueryKey::DELETE_AFFECTED).await;
        Ok(())
    }
}
