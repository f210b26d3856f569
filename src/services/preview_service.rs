use serde::Serialize;

use crate::error::ExtractionError;
use crate::models::file_record::{FileKind, FileRecord, FileStatus};
use crate::models::selection::{RenderedSize, SelectionRegion};
use crate::services::file_service::{data_url, format_file_size};
use crate::services::region_service::RegionSelector;

pub const PREVIEW_UNAVAILABLE: &str = "Preview is not available for this file.";
pub const EXTRACTION_FAILED: &str = "Error extracting text. Please try again.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreviewContent {
    Image { data_url: String },
    Pdf { data_url: String },
    Unsupported { searchable: bool },
    Unavailable { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewInfo {
    pub title: String,
    pub subtitle: String,
    pub content: PreviewContent,
    pub can_select_region: bool,
}

/// What an extraction needs once the session has validated it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub file_id: String,
    pub region: SelectionRegion,
    pub rendered: RenderedSize,
}

/// The single open preview and its ephemeral selection state. Everything
/// here is discarded whenever the previewed file changes or closes.
#[derive(Debug, Clone)]
pub struct PreviewSession {
    file_id: Option<String>,
    kind: Option<FileKind>,
    rendered: Option<RenderedSize>,
    selector: RegionSelector,
    extracted_text: Option<String>,
    text_visible: bool,
    extracting: bool,
}

impl PreviewSession {
    pub fn new(min_selection_px: f64) -> Self {
        Self {
            file_id: None,
            kind: None,
            rendered: None,
            selector: RegionSelector::new(min_selection_px),
            extracted_text: None,
            text_visible: false,
            extracting: false,
        }
    }

    pub fn open(&mut self, record: &FileRecord) -> PreviewInfo {
        self.reset();
        self.file_id = Some(record.id.clone());
        let kind = record.kind();
        self.kind = Some(kind);

        let content = match (record.raw_bytes(), kind) {
            (None, _) => PreviewContent::Unavailable {
                message: PREVIEW_UNAVAILABLE.to_string(),
            },
            (Some(bytes), FileKind::Image) => PreviewContent::Image {
                data_url: data_url(&record.mime_type, bytes),
            },
            (Some(bytes), FileKind::Pdf) => PreviewContent::Pdf {
                data_url: data_url(&record.mime_type, bytes),
            },
            (Some(_), FileKind::Document) => PreviewContent::Unsupported {
                searchable: record.status() == FileStatus::Processed,
            },
        };
        let can_select_region = matches!(content, PreviewContent::Image { .. });

        PreviewInfo {
            title: format!("Preview: {}", record.name),
            subtitle: format!(
                "File type: {}, Size: {}",
                record.mime_type,
                format_file_size(record.size_bytes)
            ),
            content,
            can_select_region,
        }
    }

    pub fn close(&mut self) {
        self.reset();
        self.file_id = None;
        self.kind = None;
    }

    fn reset(&mut self) {
        self.rendered = None;
        self.selector.reset();
        self.extracted_text = None;
        self.text_visible = false;
        self.extracting = false;
    }

    pub fn file_id(&self) -> Option<&str> {
        self.file_id.as_deref()
    }

    pub fn selector(&self) -> &RegionSelector {
        &self.selector
    }

    /// Pointer input only reaches the selector for image previews.
    pub fn selector_mut(&mut self) -> Option<&mut RegionSelector> {
        match self.kind {
            Some(FileKind::Image) if !self.extracting => Some(&mut self.selector),
            _ => None,
        }
    }

    pub fn set_rendered_size(&mut self, width: f64, height: f64) {
        self.rendered = Some(RenderedSize { width, height });
    }

    pub fn extracted_text(&self) -> Option<&str> {
        self.extracted_text.as_deref()
    }

    pub fn text_visible(&self) -> bool {
        self.text_visible && self.extracted_text.is_some()
    }

    pub fn dismiss_extracted_text(&mut self) {
        self.text_visible = false;
    }

    pub fn is_extracting(&self) -> bool {
        self.extracting
    }

    pub fn begin_extraction(&mut self) -> Result<ExtractionRequest, ExtractionError> {
        let file_id = self.file_id.clone().ok_or(ExtractionError::NoPreview)?;
        if self.kind != Some(FileKind::Image) {
            return Err(ExtractionError::NotAnImage);
        }
        let region = self.selector.selection().ok_or(ExtractionError::NoSelection)?;
        let rendered = self.rendered.ok_or(ExtractionError::RenderedSizeUnknown)?;
        self.extracting = true;
        Ok(ExtractionRequest {
            file_id,
            region,
            rendered,
        })
    }

    /// Drops an extraction that will never finish, unlocking the selector.
    pub fn cancel_extraction(&mut self) {
        self.extracting = false;
    }

    /// Surfaces the outcome for `file_id`. Ignored when the preview moved on
    /// while the extraction ran. Selection state is left as it was.
    pub fn finish_extraction(
        &mut self,
        file_id: &str,
        outcome: Result<String, ExtractionError>,
    ) -> Option<&str> {
        if self.file_id.as_deref() != Some(file_id) {
            tracing::debug!(file_id, "extraction finished after preview changed; dropped");
            return None;
        }
        self.extracting = false;
        let text = match outcome {
            Ok(text) => {
                tracing::info!(file_id, chars = text.chars().count(), "region text extracted");
                text
            }
            Err(e) => {
                tracing::warn!(file_id, error = %e, "region extraction failed");
                EXTRACTION_FAILED.to_string()
            }
        };
        self.extracted_text = Some(text);
        self.text_visible = true;
        self.extracted_text.as_deref()
    }
}
