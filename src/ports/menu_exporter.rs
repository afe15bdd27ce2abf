//! Menu Exporter Port - renders a finished menu plan to a document.
//!
//! The application depends on this trait, while adapters (like
//! `PulldownMenuExporter`) provide the implementation.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::planning::{ExportFormat, ExportedDocument, MenuPlanDocument};

/// Port for rendering menu plans.
///
/// # Contract
///
/// Implementations must:
/// - Include every dish with its scaled ingredients
/// - Include the aggregated shopping list
/// - Apply the plan's display precision to every quantity
/// - Report unsupported formats as `UnsupportedFormat`, never as empty output
#[async_trait]
pub trait MenuExporter: Send + Sync {
    async fn render(
        &self,
        plan: &MenuPlanDocument,
        format: ExportFormat,
    ) -> Result<ExportedDocument, ExportError>;

    /// Formats this exporter can currently produce (PDF needs Pandoc).
    async fn available_formats(&self) -> Vec<ExportFormat>;
}

/// Errors that can occur during export.
#[derive(Debug, Clone, Error)]
pub enum ExportError {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(ExportFormat),

    #[error("Rendering failed: {0}")]
    RenderFailed(String),

    #[error("Conversion timed out after {0} seconds")]
    Timeout(u64),

    /// External converter (e.g., Pandoc) is not available.
    #[error("Export service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ExportError {
    pub fn render_failed(reason: impl Into<String>) -> Self {
        Self::RenderFailed(reason.into())
    }

    pub fn service_unavailable(reason: impl Into<String>) -> Self {
        Self::ServiceUnavailable(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_error_displays_messages() {
        let err = ExportError::service_unavailable("Pandoc not found");
        assert!(err.to_string().contains("Pandoc not found"));

        let err = ExportError::UnsupportedFormat(ExportFormat::Pdf);
        assert!(err.to_string().contains("pdf"));

        assert!(ExportError::Timeout(30).to_string().contains("30"));
    }

    #[test]
    fn menu_exporter_is_object_safe() {
        fn check<T: MenuExporter + ?Sized>() {}
        check::<dyn MenuExporter>();
    }
}
