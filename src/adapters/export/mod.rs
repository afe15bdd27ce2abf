//! Menu export adapters.

mod menu_markdown;
mod pulldown_menu_exporter;

pub use menu_markdown::{render_markdown, render_text};
pub use pulldown_menu_exporter::PulldownMenuExporter;
