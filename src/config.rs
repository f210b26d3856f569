//! Static configuration of the pane.
//!
//! Everything here has a sensible default; `from_env` and `from_json` only
//! override what they are given.

use serde::Deserialize;
use std::env;
use std::time::Duration;

pub const DEFAULT_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "tiff", "tif"];
pub const DEFAULT_LANGUAGE: &str = "eng";
pub const DEFAULT_CONTEXT_WINDOW: usize = 50;
pub const DEFAULT_MIN_SELECTION_PX: f64 = 10.0;
pub const DEFAULT_MESSAGE_TTL_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PaneConfig {
    pub accepted_extensions: Vec<String>,
    pub ocr_language: String,
    /// Characters kept on each side of a match in a search snippet.
    pub context_window: usize,
    /// Minimum width and height of a region selection, in rendered pixels.
    pub min_selection_px: f64,
    pub status_message_ttl_secs: u64,
}

impl Default for PaneConfig {
    fn default() -> Self {
        PaneConfig {
            accepted_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            ocr_language: DEFAULT_LANGUAGE.to_string(),
            context_window: DEFAULT_CONTEXT_WINDOW,
            min_selection_px: DEFAULT_MIN_SELECTION_PX,
            status_message_ttl_secs: DEFAULT_MESSAGE_TTL_SECS,
        }
    }
}

impl PaneConfig {
    pub fn from_env() -> Self {
        let defaults = PaneConfig::default();
        PaneConfig {
            ocr_language: env::var("OCR_PANE_LANGUAGE")
                .ok()
                .filter(|lang| !lang.trim().is_empty())
                .unwrap_or(defaults.ocr_language),
            context_window: parse_env("OCR_PANE_CONTEXT_WINDOW").unwrap_or(defaults.context_window),
            min_selection_px: parse_env("OCR_PANE_MIN_SELECTION_PX")
                .filter(|px| valid_selection_px(*px))
                .unwrap_or(defaults.min_selection_px),
            status_message_ttl_secs: parse_env("OCR_PANE_MESSAGE_TTL_SECS")
                .unwrap_or(defaults.status_message_ttl_secs),
            accepted_extensions: defaults.accepted_extensions,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let mut config: PaneConfig = serde_json::from_str(raw)?;
        if !valid_selection_px(config.min_selection_px) {
            tracing::warn!(
                min_selection_px = config.min_selection_px,
                "invalid minimum selection size, using default"
            );
            config.min_selection_px = DEFAULT_MIN_SELECTION_PX;
        }
        Ok(config)
    }

    pub fn accepts_extension(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.accepted_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
    }

    /// Accept string for a native open dialog, e.g. `.pdf,.png`.
    pub fn file_dialog_filter(&self) -> String {
        self.accepted_extensions
            .iter()
            .map(|e| format!(".{e}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn status_message_ttl(&self) -> Duration {
        Duration::from_secs(self.status_message_ttl_secs)
    }
}

fn valid_selection_px(px: f64) -> bool {
    px.is_finite() && px >= 0.0
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|raw| raw.trim().parse().ok())
}
