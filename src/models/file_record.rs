use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Processing,
    Processed,
    Error,
}

impl FileStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Error => "error",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Processing => "Processing...",
            Self::Processed => "Processing complete",
            Self::Error => "Error processing file",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse kind derived from the MIME type; drives icons and preview mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Pdf,
    Image,
    Document,
}

impl FileKind {
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.contains("pdf") {
            Self::Pdf
        } else if mime_type.contains("image") {
            Self::Image
        } else {
            Self::Document
        }
    }
}

/// A file the user picked, loaded into memory but not yet imported.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let size_bytes = bytes.len() as u64;
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes,
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StoredRecord")]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub date_added: DateTime<Utc>,
    status: FileStatus,
    extracted_text: Option<String>,
    #[serde(skip)]
    raw_bytes: Option<Arc<[u8]>>,
}

/// Wire shape of a record; `FileRecord` only accepts it when text is present
/// exactly for `Processed`.
#[derive(Deserialize)]
struct StoredRecord {
    id: String,
    name: String,
    size_bytes: u64,
    mime_type: String,
    date_added: DateTime<Utc>,
    status: FileStatus,
    extracted_text: Option<String>,
}

impl TryFrom<StoredRecord> for FileRecord {
    type Error = String;

    fn try_from(stored: StoredRecord) -> Result<Self, Self::Error> {
        let has_text = stored.extracted_text.is_some();
        if has_text != (stored.status == FileStatus::Processed) {
            return Err(format!(
                "record {} is {} but {} extracted text",
                stored.id,
                stored.status,
                if has_text { "has" } else { "has no" }
            ));
        }
        Ok(Self {
            id: stored.id,
            name: stored.name,
            size_bytes: stored.size_bytes,
            mime_type: stored.mime_type,
            date_added: stored.date_added,
            status: stored.status,
            extracted_text: stored.extracted_text,
            raw_bytes: None,
        })
    }
}

impl FileRecord {
    pub fn processing(id: String, file: SelectedFile, date_added: DateTime<Utc>) -> Self {
        Self {
            id,
            name: file.name,
            size_bytes: file.size_bytes,
            mime_type: file.mime_type,
            date_added,
            status: FileStatus::Processing,
            extracted_text: None,
            raw_bytes: Some(file.bytes),
        }
    }

    pub fn status(&self) -> FileStatus {
        self.status
    }

    /// Set only once the record is `Processed`.
    pub fn extracted_text(&self) -> Option<&str> {
        self.extracted_text.as_deref()
    }

    pub fn raw_bytes(&self) -> Option<&Arc<[u8]>> {
        self.raw_bytes.as_ref()
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_mime(&self.mime_type)
    }

    /// Returns false when the record already left `Processing`.
    pub fn mark_processed(&mut self, text: String) -> bool {
        if self.status != FileStatus::Processing {
            return false;
        }
        self.status = FileStatus::Processed;
        self.extracted_text = Some(text);
        true
    }

    pub fn mark_failed(&mut self) -> bool {
        if self.status != FileStatus::Processing {
            return false;
        }
        self.status = FileStatus::Error;
        self.extracted_text = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> FileRecord {
        FileRecord::processing(
            "file-1".to_string(),
            SelectedFile::new("scan.png", "image/png", vec![1, 2, 3]),
            Utc::now(),
        )
    }

    #[test]
    fn new_record_is_processing_without_text() {
        let r = record();
        assert_eq!(r.status(), FileStatus::Processing);
        assert!(r.extracted_text().is_none());
        assert_eq!(r.size_bytes, 3);
        assert_eq!(r.kind(), FileKind::Image);
    }

    #[test]
    fn completion_applies_exactly_once() {
        let mut r = record();
        assert!(r.mark_processed("first".to_string()));
        assert!(!r.mark_processed("second".to_string()));
        assert!(!r.mark_failed());
        assert_eq!(r.status(), FileStatus::Processed);
        assert_eq!(r.extracted_text(), Some("first"));
    }

    #[test]
    fn failed_record_stays_failed() {
        let mut r = record();
        assert!(r.mark_failed());
        assert!(!r.mark_processed("late".to_string()));
        assert_eq!(r.status(), FileStatus::Error);
        assert!(r.extracted_text().is_none());
    }

    #[test]
    fn kind_from_mime() {
        assert_eq!(FileKind::from_mime("application/pdf"), FileKind::Pdf);
        assert_eq!(FileKind::from_mime("image/tiff"), FileKind::Image);
        assert_eq!(FileKind::from_mime("application/octet-stream"), FileKind::Document);
    }

    #[test]
    fn serialized_record_omits_bytes() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["status"], "processing");
        assert!(json.get("raw_bytes").is_none());
    }

    #[test]
    fn stored_record_must_match_its_status() {
        let mut json = serde_json::to_value(record()).unwrap();
        json["status"] = "processed".into();
        assert!(serde_json::from_value::<FileRecord>(json.clone()).is_err());

        json["extracted_text"] = "Invoice #4521".into();
        let restored: FileRecord = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(restored.extracted_text(), Some("Invoice #4521"));
        assert!(restored.raw_bytes().is_none());

        json["status"] = "processing".into();
        assert!(serde_json::from_value::<FileRecord>(json).is_err());
    }
}
