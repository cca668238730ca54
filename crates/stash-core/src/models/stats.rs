use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate deduplication statistics from `GET /files/storage_stats/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageStats {
    pub total_files_uploaded: u64,
    pub unique_files_stored: u64,
    /// Bytes that would be stored without deduplication.
    pub total_size_uploaded: u64,
    pub actual_size_stored: u64,
    pub space_saved: u64,
    pub space_saved_mb: f64,
    pub total_size_mb: f64,
    pub actual_size_mb: f64,
    pub savings_percentage: f64,
    pub last_updated: DateTime<Utc>,
}

impl StorageStats {
    /// Server invariant: stored <= uploaded and saved == uploaded - stored.
    pub fn is_consistent(&self) -> bool {
        self.actual_size_stored <= self.total_size_uploaded
            && self.space_saved == self.total_size_uploaded - self.actual_size_stored
    }

    /// Uploads that were linked to existing content instead of stored again.
    pub fn duplicate_uploads(&self) -> u64 {
        self.total_files_uploaded
            .saturating_sub(self.unique_files_stored)
    }
}
