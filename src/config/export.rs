//! Document export configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::{check_timeout, ValidationError};

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Pandoc binary used for PDF output
    #[serde(default = "default_pandoc")]
    pub pandoc_path: String,

    #[serde(default = "default_pdf_timeout")]
    pub pdf_timeout_secs: u64,
}

impl ExportConfig {
    pub fn pdf_timeout(&self) -> Duration {
        Duration::from_secs(self.pdf_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.pandoc_path.trim().is_empty() {
            return Err(ValidationError::MissingRequired("EXPORT__PANDOC_PATH"));
        }
        check_timeout("export.pdf_timeout_secs", self.pdf_timeout_secs)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pandoc_path: default_pandoc(),
            pdf_timeout_secs: default_pdf_timeout(),
        }
    }
}

fn default_pandoc() -> String {
    "pandoc".to_string()
}

fn default_pdf_timeout() -> u64 {
    30
}
