use std::path::PathBuf;

use serde::Serialize;

use crate::error::AppError;
use crate::models::file_record::{FileKind, FileRecord, FileStatus, SelectedFile};
use crate::services::file_service;
use crate::state::{AppState, PaneEvent};

/// A row of the imported-files list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileListItem {
    pub id: String,
    pub name: String,
    pub size_label: String,
    pub kind: FileKind,
    pub status: FileStatus,
    pub status_label: &'static str,
}

impl From<&FileRecord> for FileListItem {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            size_label: file_service::format_file_size(record.size_bytes),
            kind: record.kind(),
            status: record.status(),
            status_label: record.status().label(),
        }
    }
}

pub fn file_dialog_filter(state: &AppState) -> String {
    state.config.file_dialog_filter()
}

/// Reads the chosen paths and imports them. Failures are also posted as the
/// pane's error message.
pub fn import_files(state: &mut AppState, paths: &[PathBuf]) -> Result<usize, AppError> {
    let selected = match file_service::select_files(paths, &state.config) {
        Ok(selected) => selected,
        Err(e) => {
            state.dispatch(PaneEvent::ImportFailed {
                reason: e.to_string(),
            });
            return Err(e.into());
        }
    };
    import_selected(state, selected)
}

pub fn import_selected(state: &mut AppState, files: Vec<SelectedFile>) -> Result<usize, AppError> {
    if files.is_empty() {
        return Ok(0);
    }
    let records = match state.importer().start(files) {
        Ok(records) => records,
        Err(e) => {
            state.dispatch(PaneEvent::ImportFailed {
                reason: e.to_string(),
            });
            return Err(e);
        }
    };
    let count = records.len();
    state.dispatch(PaneEvent::ImportStarted { records });
    Ok(count)
}

pub fn remove_file(state: &mut AppState, file_id: &str) {
    if state.preview.file_id() == Some(file_id) {
        state.preview.close();
    }
    state.dispatch(PaneEvent::FileRemoved {
        file_id: file_id.to_string(),
    });
}

pub fn list_files(state: &AppState) -> Vec<FileListItem> {
    state.pane.files.iter().map(FileListItem::from).collect()
}
