use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    General(String),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("OCR error: {0}")]
    Ocr(#[from] RecognitionError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

/// Failures while turning a user selection into in-memory files.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("unsupported file type: {name}")]
    UnsupportedExtension { name: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("file dialog failed: {0}")]
    Dialog(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("engine failed: {0}")]
    Engine(String),

    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("recognition was dropped before it finished")]
    Cancelled,
}

/// Failures of the select-a-region-and-re-OCR path. Never stored on a record.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("no region selected")]
    NoSelection,

    #[error("no file is being previewed")]
    NoPreview,

    #[error("region extraction is only available for images")]
    NotAnImage,

    #[error("rendered size of the preview is unknown")]
    RenderedSizeUnknown,

    #[error("selected region lies outside the image")]
    EmptyRegion,

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode region: {0}")]
    Encode(#[source] image::ImageError),

    #[error(transparent)]
    Recognition(#[from] RecognitionError),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
