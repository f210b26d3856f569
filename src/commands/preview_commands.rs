use std::sync::Arc;

use crate::error::{AppError, ExtractionError};
use crate::models::selection::Point;
use crate::services::preview_service::{PreviewInfo, PreviewSession};
use crate::services::region_service::{self, SelectionState};
use crate::state::AppState;

pub fn open_preview(state: &mut AppState, file_id: &str) -> Result<PreviewInfo, AppError> {
    let record = state
        .pane
        .files
        .get(file_id)
        .ok_or_else(|| AppError::General(format!("file not found: {file_id}")))?;
    Ok(state.preview.open(record))
}

pub fn close_preview(state: &mut AppState) {
    state.preview.close();
}

/// Called once the preview image is laid out, with its on-screen size.
pub fn set_rendered_size(state: &mut AppState, width: f64, height: f64) {
    state.preview.set_rendered_size(width, height);
}

pub fn toggle_region_selection(state: &mut AppState) -> Option<SelectionState> {
    let selector = state.preview.selector_mut()?;
    selector.toggle();
    Some(selector.state().clone())
}

pub fn pointer_down(state: &mut AppState, x: f64, y: f64) {
    if let Some(selector) = state.preview.selector_mut() {
        selector.pointer_down(Point::new(x, y));
    }
}

pub fn pointer_move(state: &mut AppState, x: f64, y: f64) {
    if let Some(selector) = state.preview.selector_mut() {
        selector.pointer_move(Point::new(x, y));
    }
}

/// Pointer released or left the preview.
pub fn pointer_up(state: &mut AppState) -> Option<SelectionState> {
    state
        .preview
        .selector_mut()
        .map(|selector| selector.pointer_up().clone())
}

/// Cancels the running extraction unless it was finished, so a dropped
/// `extract_region_text` future does not leave the selector locked.
struct PendingExtraction<'a> {
    session: Option<&'a mut PreviewSession>,
}

impl<'a> PendingExtraction<'a> {
    fn finish(mut self) -> Option<&'a mut PreviewSession> {
        self.session.take()
    }
}

impl Drop for PendingExtraction<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::debug!("region extraction dropped before finishing");
            session.cancel_extraction();
        }
    }
}

/// OCRs the selected region on its own. Errors only when there is nothing to
/// extract yet; a failing crop or engine surfaces as placeholder text.
pub async fn extract_region_text(state: &mut AppState) -> Result<String, AppError> {
    let request = state.preview.begin_extraction()?;
    let source = state
        .pane
        .files
        .get(&request.file_id)
        .and_then(|record| record.raw_bytes().cloned());
    let engine = Arc::clone(state.engine());
    let language = state.config.ocr_language.clone();
    let pending = PendingExtraction {
        session: Some(&mut state.preview),
    };

    let outcome = match source {
        Some(bytes) => {
            region_service::extract_region_text(
                &*engine,
                &bytes,
                &request.region,
                request.rendered,
                &language,
            )
            .await
        }
        None => Err(ExtractionError::NoPreview),
    };

    let shown = pending
        .finish()
        .and_then(|session| session.finish_extraction(&request.file_id, outcome))
        .unwrap_or_default()
        .to_string();
    Ok(shown)
}

pub fn dismiss_extracted_text(state: &mut AppState) {
    state.preview.dismiss_extracted_text();
}
