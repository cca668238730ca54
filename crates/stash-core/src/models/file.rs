use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored file as reported by the catalog. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    /// URL of the stored content.
    pub file: String,
    pub original_filename: String,
    pub file_type: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    pub file_hash: String,
    pub is_duplicate: bool,
    pub reference_count: u32,
}

impl FileRecord {
    pub fn size_kb(&self) -> f64 {
        self.size as f64 / 1024.0
    }

    /// Uploads beyond the first that share this file's content.
    pub fn extra_references(&self) -> u32 {
        self.reference_count.saturating_sub(1)
    }
}

/// A later upload whose content matched an existing file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReference {
    pub id: Uuid,
    pub reference_filename: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_file: Option<FileRecord>,
}

/// Response of `GET /files/{id}/references/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReferences {
    pub original_file: FileRecord,
    #[serde(default)]
    pub references: Vec<FileReference>,
    pub total_references: u64,
}

/// Response of `GET /files/file_types/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTypesResponse {
    pub file_types: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn references_payload_with_nested_original_parses() {
        let original = json!({
            "id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "file": "http://localhost:8000/media/uploads/a.pdf",
            "original_filename": "report.pdf",
            "file_type": "application/pdf",
            "size": 4096,
            "uploaded_at": "2024-03-01T10:00:00Z",
            "file_hash": "ab12",
            "is_duplicate": true,
            "reference_count": 2
        });
        let payload = json!({
            "original_file": original.clone(),
            "references": [{
                "id": "16fd2706-8baf-433b-82eb-8c7fada847da",
                "original_file": original,
                "reference_filename": "report (1).pdf",
                "uploaded_at": "2024-03-02T10:00:00Z"
            }],
            "total_references": 1
        });

        let refs: FileReferences = serde_json::from_value(payload).unwrap();
        assert_eq!(refs.total_references, 1);
        assert_eq!(refs.references[0].reference_filename, "report (1).pdf");
        assert_eq!(refs.original_file.extra_references(), 1);
        assert_eq!(
            refs.references[0].original_file.as_ref().map(|f| f.size),
            Some(4096)
        );
    }
}
