use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine as _;

use crate::config::PaneConfig;
use crate::error::ImportError;
use crate::models::file_record::SelectedFile;
use crate::services::ocr_service::is_ocr_candidate;

/// Loads the files a user picked. Paths with an extension the pane does not
/// accept are skipped, the way the open dialog would never offer them. An
/// empty selection is a cancelled dialog, not an error.
pub fn select_files(paths: &[PathBuf], config: &PaneConfig) -> Result<Vec<SelectedFile>, ImportError> {
    let mut selected = Vec::with_capacity(paths.len());
    for path in paths {
        if !is_ocr_candidate(path, config) {
            tracing::warn!(path = %path.display(), "skipping unsupported file type");
            continue;
        }
        selected.push(read_selected(path)?);
    }
    Ok(selected)
}

pub fn read_selected(path: &Path) -> Result<SelectedFile, ImportError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| ImportError::Dialog(format!("invalid file path: {}", path.display())))?;
    let bytes = fs::read(path).map_err(|source| ImportError::Read {
        path: path.to_string_lossy().to_string(),
        source,
    })?;
    Ok(SelectedFile::new(name, guess_mime(path), bytes))
}

pub fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime_type};base64,{encoded}")
}
