use std::sync::Arc;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::error::{AppError, RecognitionError};
use crate::models::file_record::{FileRecord, SelectedFile};
use crate::services::ocr_service::{ImageInput, OcrEngine, ProgressReporter};

/// Result of one file's recognition, delivered back to the pane by id.
#[derive(Debug)]
pub struct OcrCompletion {
    pub file_id: String,
    pub file_name: String,
    pub outcome: Result<String, RecognitionError>,
}

pub fn new_file_id() -> String {
    format!("file-{}", uuid::Uuid::new_v4())
}

/// Creates records for selected files and fires one recognition task per
/// file. Tasks are not throttled, cancelled or timed out; each reports back
/// through the completion channel whenever it finishes.
pub struct Importer {
    engine: Arc<dyn OcrEngine>,
    language: String,
    completions: mpsc::UnboundedSender<OcrCompletion>,
}

impl Importer {
    pub fn new(
        engine: Arc<dyn OcrEngine>,
        language: impl Into<String>,
        completions: mpsc::UnboundedSender<OcrCompletion>,
    ) -> Self {
        Self {
            engine,
            language: language.into(),
            completions,
        }
    }

    /// Returns the new records in selection order, all `Processing`.
    pub fn start(&self, files: Vec<SelectedFile>) -> Result<Vec<FileRecord>, AppError> {
        let runtime = Handle::try_current()
            .map_err(|e| AppError::General(format!("no async runtime for OCR: {e}")))?;

        let date_added = Utc::now();
        let records = files
            .into_iter()
            .map(|file| {
                let id = new_file_id();
                let input = ImageInput::new(Arc::clone(&file.bytes), file.mime_type.clone());
                self.spawn_recognition(&runtime, id.clone(), file.name.clone(), input);
                FileRecord::processing(id, file, date_added)
            })
            .collect();
        Ok(records)
    }

    fn spawn_recognition(&self, runtime: &Handle, file_id: String, file_name: String, input: ImageInput) {
        let engine = Arc::clone(&self.engine);
        let language = self.language.clone();
        let completions = self.completions.clone();

        tracing::info!(file_id = %file_id, file = %file_name, engine = engine.name(), "starting OCR");
        runtime.spawn(async move {
            let progress = ProgressReporter::logging(file_name.clone());
            let outcome = engine.recognize(input, &language, progress).await;
            let completion = OcrCompletion {
                file_id,
                file_name,
                outcome,
            };
            if let Err(unsent) = completions.send(completion) {
                tracing::debug!(file_id = %unsent.0.file_id, "pane gone before OCR finished");
            }
        });
    }
}
