//! Named query identities used to group cached results and target invalidation.

use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryKey {
    /// The filtered file list.
    Files,
    /// Aggregate storage statistics.
    StorageStats,
    /// Distinct file types offered as a filter facet.
    FileTypes,
}

impl QueryKey {
    /// Every view an upload can change.
    pub const UPLOAD_AFFECTED: [QueryKey; 3] =
        [QueryKey::Files, QueryKey::StorageStats, QueryKey::FileTypes];

    /// Every view a delete can change.
    pub const DELETE_AFFECTED: [QueryKey; 3] = Self::UPLOAD_AFFECTED;

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKey::Files => "files",
            QueryKey::StorageStats => "storageStats",
            QueryKey::FileTypes => "fileTypes",
        }
    }
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
