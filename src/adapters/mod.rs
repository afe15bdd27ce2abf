//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `storage` - Record stores (JSON files, Firestore, memory)
//! - `catalog` - Recipe catalog sources (Google Sheets, YAML file)
//! - `export` - Menu plan rendering (Markdown, HTML, text, PDF)
//! - `ai` - Dish descriptions
//! - `google` - Shared Google API authentication
//! - `console` - Line-based chat transport

pub mod ai;
pub mod catalog;
pub mod console;
pub mod export;
pub mod google;
pub mod storage;

pub use console::ConsoleTransport;
