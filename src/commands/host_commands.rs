//! Entry points the hosting application shell invokes directly. Neither may
//! fail the host: errors are logged and the host event is always completed.

use async_trait::async_trait;

use crate::error::AppError;

pub const EXPORT_CELL: &str = "A1";
pub const EXPORT_PLACEHOLDER: &str = "This functionality is not implemented yet.";

/// The hosting document application, seen from the pane.
#[async_trait]
pub trait HostShell: Send + Sync {
    async fn show_taskpane(&self) -> anyhow::Result<()>;

    async fn write_range(&self, address: &str, values: Vec<Vec<String>>) -> anyhow::Result<()>;

    /// Tells the host the command that triggered us has finished.
    fn event_completed(&self);
}

pub async fn show_taskpane(host: &dyn HostShell) {
    if let Err(e) = host.show_taskpane().await {
        tracing::error!(error = %format!("{e:#}"), "failed to show task pane");
    }
    host.event_completed();
}

/// Placeholder export: writes a fixed notice into the active sheet.
pub async fn export_to_worksheet(host: &dyn HostShell) {
    let pending = AppError::NotImplemented("export of recognized text".to_string());
    tracing::warn!(error = %pending, "writing export placeholder");

    let values = vec![vec![EXPORT_PLACEHOLDER.to_string()]];
    if let Err(e) = host.write_range(EXPORT_CELL, values).await {
        tracing::error!(error = %format!("{e:#}"), "export to worksheet failed");
    }
    host.event_completed();
}
