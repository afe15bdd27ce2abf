//! Export formats and the rendered document handed back to the chat.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Formats the menu plan can be rendered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Markdown,
    Html,
    Pdf,
    Text,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Pdf,
        ExportFormat::Markdown,
        ExportFormat::Html,
        ExportFormat::Text,
    ];

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/markdown; charset=utf-8",
            ExportFormat::Html => "text/html; charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Text => "text/plain; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Html => "html",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Text => "txt",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "Markdown",
            ExportFormat::Html => "HTML",
            ExportFormat::Pdf => "PDF",
            ExportFormat::Text => "Plain text",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Markdown => "markdown",
            ExportFormat::Html => "html",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Text => "text",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "html" | "htm" => Ok(ExportFormat::Html),
            "pdf" => Ok(ExportFormat::Pdf),
            "text" | "txt" => Ok(ExportFormat::Text),
            other => Err(ValidationError::invalid_format(
                "export_format",
                format!("unsupported format '{}'", other),
            )),
        }
    }
}

/// A rendered plan ready to be attached to a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    pub file_name: String,
    pub content_type: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportedDocument {
    pub fn new(bytes: Vec<u8>, format: ExportFormat, base_name: &str) -> Self {
        Self {
            file_name: format!("{}.{}", base_name, format.extension()),
            content_type: format.content_type().to_string(),
            format,
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parses_aliases_case_insensitively() {
        assert_eq!("MD".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("htm".parse::<ExportFormat>().unwrap(), ExportFormat::Html);
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Text);
        assert!("docx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn document_file_name_uses_extension() {
        let doc = ExportedDocument::new(b"%PDF".to_vec(), ExportFormat::Pdf, "menu-plan");
        assert_eq!(doc.file_name, "menu-plan.pdf");
        assert_eq!(doc.content_type, "application/pdf");
        assert_eq!(doc.len(), 4);
    }
}
