pub mod commands;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use config::PaneConfig;
pub use error::{AppError, ExtractionError, ImportError, RecognitionError};
pub use services::ocr_service::{ImageInput, OcrEngine, OcrProgress, ProgressReporter};
pub use state::{AppState, PaneEvent, PaneState};

#[cfg(feature = "tesseract")]
pub use services::ocr_service::TesseractEngine;

/// Installs the fmt subscriber, filtered by `RUST_LOG`. Safe to call twice.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ocr_pane_lib=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Sets up logging and a pane configured from the environment.
pub fn run(engine: Arc<dyn OcrEngine>) -> AppState {
    init_logging();
    let config = PaneConfig::from_env();
    tracing::info!(
        engine = engine.name(),
        language = %config.ocr_language,
        accept = %config.file_dialog_filter(),
        "ocr pane ready"
    );
    AppState::new(engine, config)
}
