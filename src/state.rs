use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::PaneConfig;
use crate::data::store::FileStore;
use crate::models::file_record::{FileRecord, FileStatus};
use crate::models::search::SearchResultSet;
use crate::services::import_service::{Importer, OcrCompletion};
use crate::services::ocr_service::OcrEngine;
use crate::services::preview_service::PreviewSession;
use crate::services::search_service;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub kind: MessageKind,
    pub text: String,
    pub posted_at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum PaneEvent {
    ImportStarted { records: Vec<FileRecord> },
    ImportFailed { reason: String },
    OcrCompleted(OcrCompletion),
    QueryChanged(String),
    SearchRequested,
    FileRemoved { file_id: String },
    MessageDismissed(MessageKind),
    MessagesExpired,
}

/// Everything the pane shows, as one serializable value. Only `apply`
/// mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaneState {
    pub files: FileStore,
    pub search_query: String,
    pub search_results: Vec<SearchResultSet>,
    pub success_message: Option<StatusMessage>,
    pub error_message: Option<StatusMessage>,
    context_window: usize,
    message_ttl_secs: u64,
}

impl PaneState {
    pub fn new(config: &PaneConfig) -> Self {
        Self {
            files: FileStore::new(),
            search_query: String::new(),
            search_results: Vec::new(),
            success_message: None,
            error_message: None,
            context_window: config.context_window,
            message_ttl_secs: config.status_message_ttl_secs,
        }
    }

    pub fn apply(&mut self, event: PaneEvent, now: DateTime<Utc>) {
        match event {
            PaneEvent::ImportStarted { records } => self.import_started(records, now),
            PaneEvent::ImportFailed { reason } => {
                tracing::error!(%reason, "error importing files");
                self.post(MessageKind::Error, "Error importing files. Please try again.", now);
            }
            PaneEvent::OcrCompleted(completion) => self.ocr_completed(completion, now),
            PaneEvent::QueryChanged(query) => self.search_query = query,
            PaneEvent::SearchRequested => self.search_requested(now),
            PaneEvent::FileRemoved { file_id } => self.file_removed(&file_id, now),
            PaneEvent::MessageDismissed(kind) => match kind {
                MessageKind::Success => self.success_message = None,
                MessageKind::Error => self.error_message = None,
            },
            PaneEvent::MessagesExpired => self.expire_messages(now),
        }
    }

    fn import_started(&mut self, records: Vec<FileRecord>, now: DateTime<Utc>) {
        if records.is_empty() {
            return;
        }
        let mut added = 0;
        for record in records {
            let id = record.id.clone();
            match self.files.append(record) {
                Ok(()) => added += 1,
                Err(e) => tracing::error!(file_id = %id, error = %e, "record not added"),
            }
        }
        self.post(MessageKind::Success, &format!("Importing {added} file(s)..."), now);
    }

    fn ocr_completed(&mut self, completion: OcrCompletion, now: DateTime<Utc>) {
        let OcrCompletion {
            file_id,
            file_name,
            outcome,
        } = completion;

        let succeeded = outcome.is_ok();
        let applied = self.files.update_by_id(&file_id, |record| match outcome {
            Ok(text) => record.mark_processed(text),
            Err(e) => {
                tracing::warn!(file_id = %record.id, error = %e, "OCR failed");
                record.mark_failed()
            }
        });

        match applied {
            None => tracing::debug!(%file_id, "completion for removed file ignored"),
            Some(false) => tracing::debug!(%file_id, "record already completed; ignored"),
            Some(true) if succeeded => {
                tracing::info!(%file_id, file = %file_name, "OCR completed");
                self.post(
                    MessageKind::Success,
                    &format!("Processed {file_name} successfully!"),
                    now,
                );
            }
            Some(true) => self.post(
                MessageKind::Error,
                &format!("Error processing {file_name}. Please try again."),
                now,
            ),
        }
    }

    fn search_requested(&mut self, now: DateTime<Utc>) {
        if self.search_query.trim().is_empty() {
            self.search_results.clear();
            return;
        }
        self.search_results =
            search_service::search(&self.files, &self.search_query, self.context_window);
        tracing::debug!(
            query = %self.search_query,
            files = self.search_results.len(),
            "search executed"
        );
        let text = if self.search_results.is_empty() {
            "No matches found".to_string()
        } else {
            format!("Found matches in {} file(s)", self.search_results.len())
        };
        self.post(MessageKind::Success, &text, now);
    }

    fn file_removed(&mut self, file_id: &str, now: DateTime<Utc>) {
        if self.files.remove_by_id(file_id).is_none() {
            return;
        }
        self.search_results.retain(|r| r.file_id != file_id);
        self.post(MessageKind::Success, "File removed successfully", now);
    }

    fn expire_messages(&mut self, now: DateTime<Utc>) {
        // A TTL too large for chrono never elapses.
        let Ok(ttl) =
            chrono::Duration::from_std(std::time::Duration::from_secs(self.message_ttl_secs))
        else {
            return;
        };
        for slot in [&mut self.success_message, &mut self.error_message] {
            if slot.as_ref().is_some_and(|m| now - m.posted_at >= ttl) {
                *slot = None;
            }
        }
    }

    fn post(&mut self, kind: MessageKind, text: &str, now: DateTime<Utc>) {
        let message = Some(StatusMessage {
            kind,
            text: text.to_string(),
            posted_at: now,
        });
        match kind {
            MessageKind::Success => self.success_message = message,
            MessageKind::Error => self.error_message = message,
        }
    }
}

/// Runtime owner of the pane: its state, the OCR engine and the channel that
/// carries recognition results back. All mutation goes through `&mut self`,
/// so no locking is involved.
pub struct AppState {
    pub pane: PaneState,
    pub preview: PreviewSession,
    pub config: PaneConfig,
    engine: Arc<dyn OcrEngine>,
    importer: Importer,
    completions: mpsc::UnboundedReceiver<OcrCompletion>,
}

impl AppState {
    pub fn new(engine: Arc<dyn OcrEngine>, config: PaneConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            pane: PaneState::new(&config),
            preview: PreviewSession::new(config.min_selection_px),
            importer: Importer::new(Arc::clone(&engine), config.ocr_language.clone(), tx),
            engine,
            config,
            completions: rx,
        }
    }

    pub fn engine(&self) -> &Arc<dyn OcrEngine> {
        &self.engine
    }

    pub fn importer(&self) -> &Importer {
        &self.importer
    }

    pub fn dispatch(&mut self, event: PaneEvent) {
        self.pane.apply(event, Utc::now());
    }

    /// Applies every completion that has already arrived, without waiting.
    pub fn apply_ready_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions.try_recv() {
            self.dispatch(PaneEvent::OcrCompleted(completion));
            applied += 1;
        }
        applied
    }

    /// Waits for the next completion and applies it; returns its file id.
    pub async fn next_completion(&mut self) -> Option<String> {
        let completion = self.completions.recv().await?;
        let file_id = completion.file_id.clone();
        self.dispatch(PaneEvent::OcrCompleted(completion));
        Some(file_id)
    }

    /// Waits until no record in the store is `Processing`. Completions for
    /// removed files are consumed along the way. Never returns while a
    /// recognition is stuck.
    pub async fn wait_until_idle(&mut self) {
        while self
            .pane
            .files
            .iter()
            .any(|r| r.status() == FileStatus::Processing)
        {
            if self.next_completion().await.is_none() {
                break;
            }
        }
    }
}
