use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::PaneConfig;
use crate::error::RecognitionError;

pub fn is_ocr_candidate(path: &Path, config: &PaneConfig) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| config.accepts_extension(e))
        .unwrap_or(false)
}

/// Encoded image (or PDF) handed to an engine.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub bytes: Arc<[u8]>,
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/png")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrProgress {
    pub status: String,
    /// 0.0 ..= 1.0
    pub progress: f32,
}

pub type ProgressCallback = Arc<dyn Fn(&OcrProgress) + Send + Sync>;

/// Advisory progress sink. A missing or panicking callback never affects the
/// recognition it reports on.
#[derive(Clone, Default)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn logging(label: impl Into<String>) -> Self {
        let label = label.into();
        Self::new(Arc::new(move |p: &OcrProgress| {
            tracing::debug!(file = %label, status = %p.status, progress = p.progress, "ocr progress");
        }))
    }

    pub fn report(&self, status: &str, progress: f32) {
        let Some(callback) = &self.callback else {
            return;
        };
        let update = OcrProgress {
            status: status.to_string(),
            progress: progress.clamp(0.0, 1.0),
        };
        if catch_unwind(AssertUnwindSafe(|| callback(&update))).is_err() {
            tracing::warn!(status, "ocr progress callback panicked; ignoring");
        }
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Text recognition backend. Treated as an opaque collaborator.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &'static str;

    async fn recognize(
        &self,
        image: ImageInput,
        language: &str,
        progress: ProgressReporter,
    ) -> Result<String, RecognitionError>;
}

#[cfg(feature = "tesseract")]
pub use tesseract::TesseractEngine;

#[cfg(feature = "tesseract")]
mod tesseract {
    use super::*;

    /// Tesseract through leptess. Recognition runs on the blocking pool.
    #[derive(Debug, Clone, Default)]
    pub struct TesseractEngine {
        data_path: Option<String>,
    }

    impl TesseractEngine {
        pub fn new(data_path: Option<String>) -> Self {
            Self { data_path }
        }
    }

    #[async_trait]
    impl OcrEngine for TesseractEngine {
        fn name(&self) -> &'static str {
            "tesseract"
        }

        async fn recognize(
            &self,
            image: ImageInput,
            language: &str,
            progress: ProgressReporter,
        ) -> Result<String, RecognitionError> {
            if image.mime_type.contains("pdf") {
                return Err(RecognitionError::UnsupportedInput(
                    "tesseract cannot read PDF documents".to_string(),
                ));
            }

            progress.report("initializing tesseract", 0.0);
            let data_path = self.data_path.clone();
            let language = language.to_string();
            let text = tokio::task::spawn_blocking(move || {
                extract_text(data_path.as_deref(), &language, &image.bytes)
            })
            .await
            .map_err(|e| RecognitionError::Engine(format!("worker failed: {e}")))??;
            progress.report("recognizing text", 1.0);
            Ok(text)
        }
    }

    fn extract_text(
        data_path: Option<&str>,
        language: &str,
        bytes: &[u8],
    ) -> Result<String, RecognitionError> {
        let mut lt = leptess::LepTess::new(data_path, language)
            .map_err(|e| RecognitionError::Engine(format!("init failed: {e}")))?;
        lt.set_image_from_mem(bytes)
            .map_err(|e| RecognitionError::Engine(format!("set_image failed: {e}")))?;
        let text = lt
            .get_utf8_text()
            .map_err(|e| RecognitionError::Engine(format!("get_utf8_text failed: {e}")))?;
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use tokio::sync::oneshot;

    use super::*;

    enum Script {
        Text(String),
        Fail(String),
        Held(oneshot::Receiver<Result<String, String>>),
    }

    /// Engine scripted by input bytes. Unscripted inputs get `default_text`.
    pub(crate) struct MockOcrEngine {
        scripts: Mutex<HashMap<Vec<u8>, Script>>,
        default_text: String,
        calls: AtomicUsize,
        inputs: Mutex<Vec<ImageInput>>,
    }

    impl MockOcrEngine {
        pub(crate) fn new(default_text: &str) -> Self {
            Self {
                scripts: Mutex::new(HashMap::new()),
                default_text: default_text.to_string(),
                calls: AtomicUsize::new(0),
                inputs: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn text_for(self, input: &[u8], text: &str) -> Self {
            self.scripts
                .lock()
                .unwrap()
                .insert(input.to_vec(), Script::Text(text.to_string()));
            self
        }

        pub(crate) fn fail_for(self, input: &[u8], reason: &str) -> Self {
            self.scripts
                .lock()
                .unwrap()
                .insert(input.to_vec(), Script::Fail(reason.to_string()));
            self
        }

        /// Recognition of `input` stays pending until the sender is used.
        pub(crate) fn hold(&self, input: &[u8]) -> oneshot::Sender<Result<String, String>> {
            let (tx, rx) = oneshot::channel();
            self.scripts
                .lock()
                .unwrap()
                .insert(input.to_vec(), Script::Held(rx));
            tx
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub(crate) fn inputs(&self) -> Vec<ImageInput> {
            self.inputs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OcrEngine for MockOcrEngine {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn recognize(
            &self,
            image: ImageInput,
            _language: &str,
            progress: ProgressReporter,
        ) -> Result<String, RecognitionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inputs.lock().unwrap().push(image.clone());
            progress.report("recognizing text", 0.5);

            let script = self.scripts.lock().unwrap().remove(&image.bytes[..]);
            match script {
                Some(Script::Text(text)) => Ok(text),
                Some(Script::Fail(reason)) => Err(RecognitionError::Engine(reason)),
                Some(Script::Held(rx)) => match rx.await {
                    Ok(Ok(text)) => Ok(text),
                    Ok(Err(reason)) => Err(RecognitionError::Engine(reason)),
                    Err(_) => Err(RecognitionError::Cancelled),
                },
                None => Ok(self.default_text.clone()),
            }
        }
    }
}
