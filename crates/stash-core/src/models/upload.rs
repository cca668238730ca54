use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::file::FileRecord;
use crate::error::ClientError;

/// Response of `POST /files/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub file: FileRecord,
    pub is_duplicate: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_saved: Option<u64>,
}

/// A local file chosen for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl std::fmt::Debug for FileCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCandidate")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.data.len())
            .finish()
    }
}

impl FileCandidate {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let content_type = guess_content_type(&file_name).map(str::to_string);
        Self {
            file_name,
            content_type,
            data: data.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read a candidate from a local path.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ClientError::validation(format!("Not a file path: {}", path.display()))
            })?
            .to_string();

        let data = tokio::fs::read(path).await.map_err(|e| {
            ClientError::validation(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        Ok(Self::new(file_name, data))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn size_kb(&self) -> f64 {
        self.size() as f64 / 1024.0
    }
}

/// Content type by extension for the handful of formats users commonly upload.
fn guess_content_type(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())?
        .to_lowercase();
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" | "log" => "text/plain",
        "csv" => "text/csv",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "xml" => "application/xml",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    };
    Some(mime)
}

/// Result of one upload attempt as presented to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadOutcome {
    Success {
        is_duplicate: bool,
        /// Present only for duplicates the server reported savings for.
        #[serde(skip_serializing_if = "Option::is_none")]
        space_saved: Option<u64>,
        message: String,
        file: FileRecord,
    },
    Failure {
        reason: String,
    },
}

impl UploadOutcome {
    /// Classify a server response. The server's duplicate flag is authoritative.
    pub fn from_response(response: UploadResponse) -> Self {
        let space_saved = if response.is_duplicate {
            response.space_saved
        } else {
            None
        };
        UploadOutcome::Success {
            is_duplicate: response.is_duplicate,
            space_saved,
            message: response.message,
            file: response.file,
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        UploadOutcome::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success { .. })
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            UploadOutcome::Success {
                is_duplicate: true,
                ..
            }
        )
    }

    pub fn space_saved(&self) -> Option<u64> {
        match self {
            UploadOutcome::Success { space_saved, .. } => *space_saved,
            UploadOutcome::Failure { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(is_duplicate: bool, space_saved: Option<u64>) -> UploadResponse {
        let mut body = json!({
            "file": {
                "id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
                "file": "/media/uploads/x.bin",
                "original_filename": "x.bin",
                "file_type": "application/octet-stream",
                "size": 2048,
                "uploaded_at": "2024-03-01T10:00:00Z",
                "file_hash": "ff",
                "is_duplicate": is_duplicate,
                "reference_count": 1
            },
            "is_duplicate": is_duplicate,
            "message": "ok"
        });
        if let Some(saved) = space_saved {
            body["space_saved"] = json!(saved);
        }
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn duplicate_keeps_reported_savings() {
        let outcome = UploadOutcome::from_response(response(true, Some(2048)));
        assert!(outcome.is_duplicate());
        assert_eq!(outcome.space_saved(), Some(2048));
    }

    #[test]
    fn new_file_never_reports_savings() {
        let outcome = UploadOutcome::from_response(response(false, Some(2048)));
        assert!(outcome.is_success());
        assert!(!outcome.is_duplicate());
        assert_eq!(outcome.space_saved(), None);
    }

    #[test]
    fn candidate_guesses_content_type() {
        assert_eq!(
            FileCandidate::new("Report.PDF", vec![1u8]).content_type.as_deref(),
            Some("application/pdf")
        );
        assert_eq!(
            FileCandidate::new("blob.xyz", vec![1u8]).content_type.as_deref(),
            Some("application/octet-stream")
        );
        assert_eq!(FileCandidate::new("README", vec![1u8]).content_type, None);
    }

    #[tokio::test]
    async fn candidate_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let candidate = FileCandidate::from_path(&path).await.unwrap();
        assert_eq!(candidate.file_name, "notes.txt");
        assert_eq!(candidate.size(), 5);
        assert_eq!(candidate.content_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn candidate_accepts_relative_parent_components() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("report.pdf"), b"%PDF").unwrap();

        let candidate = FileCandidate::from_path(dir.path().join("sub").join("..").join("report.pdf"))
            .await
            .unwrap();
        assert_eq!(candidate.file_name, "report.pdf");
        assert_eq!(candidate.size(), 4);
    }

    #[tokio::test]
    async fn candidate_rejects_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileCandidate::from_path(dir.path().join("missing.bin"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
