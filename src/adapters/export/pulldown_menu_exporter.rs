//! Pulldown-cmark based menu exporter.
//!
//! - Markdown and plain text are rendered in-process
//! - HTML conversion uses pulldown-cmark (pure Rust)
//! - PDF conversion uses Pandoc (requires an external Pandoc installation)

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use pulldown_cmark::{html, Options, Parser};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::menu_markdown::{render_markdown, render_text};
use crate::domain::planning::{ExportFormat, ExportedDocument, MenuPlanDocument};
use crate::ports::{ExportError, MenuExporter};

const FILE_BASE_NAME: &str = "menu-plan";

/// # Example
///
/// ```rust,ignore
/// let exporter = PulldownMenuExporter::new().with_pandoc_path("/usr/bin/pandoc");
/// let doc = exporter.render(&plan, ExportFormat::Html).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PulldownMenuExporter {
    pandoc_path: String,
    pdf_timeout: Duration,
}

impl Default for PulldownMenuExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PulldownMenuExporter {
    pub fn new() -> Self {
        Self {
            pandoc_path: "pandoc".to_string(),
            pdf_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_pandoc_path(mut self, path: impl Into<String>) -> Self {
        self.pandoc_path = path.into();
        self
    }

    pub fn with_pdf_timeout(mut self, timeout: Duration) -> Self {
        self.pdf_timeout = timeout;
        self
    }

    fn to_html(&self, markdown: &str, title: &str) -> String {
        let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS);
        let mut body = String::new();
        html::push_html(&mut body, parser);

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
{css}
    </style>
</head>
<body>
    <article class="menu-plan">
{body}
    </article>
</body>
</html>"#,
            title = html_escape(title),
            css = MENU_CSS,
            body = body
        )
    }

    /// Check if Pandoc is installed and accessible.
    async fn pandoc_available(&self) -> bool {
        Command::new(&self.pandoc_path)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn to_pdf(&self, markdown: &str) -> Result<Vec<u8>, ExportError> {
        if !self.pandoc_available().await {
            return Err(ExportError::service_unavailable(format!(
                "Pandoc not found at '{}'",
                self.pandoc_path
            )));
        }

        let mut child = Command::new(&self.pandoc_path)
            .args([
                "-f",
                "markdown",
                "-t",
                "pdf",
                "--pdf-engine=xelatex",
                "-V",
                "geometry:margin=2cm",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExportError::render_failed(format!("Failed to start Pandoc: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(markdown.as_bytes())
                .await
                .map_err(|e| ExportError::render_failed(format!("Failed to write to Pandoc: {}", e)))?;
        }

        let output = tokio::time::timeout(self.pdf_timeout, child.wait_with_output())
            .await
            .map_err(|_| ExportError::Timeout(self.pdf_timeout.as_secs()))?
            .map_err(|e| ExportError::render_failed(format!("Pandoc execution failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExportError::render_failed(format!(
                "Pandoc returned error: {}",
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl MenuExporter for PulldownMenuExporter {
    async fn render(
        &self,
        plan: &MenuPlanDocument,
        format: ExportFormat,
    ) -> Result<ExportedDocument, ExportError> {
        let bytes = match format {
            ExportFormat::Markdown => render_markdown(plan).into_bytes(),
            ExportFormat::Text => render_text(plan).into_bytes(),
            ExportFormat::Html => self.to_html(&render_markdown(plan), &plan.title).into_bytes(),
            ExportFormat::Pdf => self.to_pdf(&render_markdown(plan)).await?,
        };
        tracing::debug!(format = %format, bytes = bytes.len(), dishes = plan.dishes.len(), "Menu plan rendered");
        Ok(ExportedDocument::new(bytes, format, FILE_BASE_NAME))
    }

    async fn available_formats(&self) -> Vec<ExportFormat> {
        let mut formats = vec![ExportFormat::Markdown, ExportFormat::Html, ExportFormat::Text];
        if self.pandoc_available().await {
            formats.insert(0, ExportFormat::Pdf);
        }
        formats
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const MENU_CSS: &str = r#"
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Arial, sans-serif;
    line-height: 1.5;
    color: #1f2937;
    max-width: 720px;
    margin: 0 auto;
    padding: 2rem;
}

h1 {
    border-bottom: 2px solid #16a34a;
    padding-bottom: 0.5rem;
}

h3 {
    margin-bottom: 0.25rem;
}

ul {
    padding-left: 1.5em;
}

li {
    margin: 0.15em 0;
}
"#;
