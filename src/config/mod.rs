//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `MENU_PLANNER` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use menu_planner::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Storing records with the {:?} backend", config.storage.backend);
//! ```

mod ai;
mod catalog;
mod console;
mod error;
mod export;
mod logging;
mod storage;

pub use ai::AiConfig;
pub use catalog::{CatalogConfig, CatalogSourceKind};
pub use console::ConsoleConfig;
pub use error::{ConfigError, ValidationError};
pub use export::ExportConfig;
pub use logging::LoggingConfig;
pub use storage::{StorageBackend, StorageConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a JSON-file
/// store in `./data` (the catalog still has to be configured).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Persistence backend (JSON files or Firestore)
    #[serde(default)]
    pub storage: StorageConfig,

    /// Recipe catalog source (Google Sheets or a YAML file)
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Document export (Pandoc for PDF)
    #[serde(default)]
    pub export: ExportConfig,

    /// Optional dish descriptions
    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Interactive console transport
    #[serde(default)]
    pub console: ConsoleConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `MENU_PLANNER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `MENU_PLANNER__STORAGE__BACKEND=firestore` -> `storage.backend = firestore`
    /// - `MENU_PLANNER__CATALOG__SPREADSHEET_ID=...` -> `catalog.spreadsheet_id = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("MENU_PLANNER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.storage.validate()?;
        self.catalog.validate()?;
        self.export.validate()?;
        self.ai.validate()?;
        self.logging.validate()?;
        self.console.validate()?;
        Ok(())
    }
}
