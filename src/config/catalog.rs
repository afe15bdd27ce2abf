//! Recipe catalog configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::{check_http_url, check_timeout, is_set, ValidationError};

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSourceKind {
    /// Google Sheets values API
    #[default]
    Sheets,
    /// Local YAML file
    File,
}

/// Catalog configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub source: CatalogSourceKind,

    pub spreadsheet_id: Option<String>,

    /// Sheet holding main dishes
    #[serde(default = "default_main_sheet")]
    pub main_sheet: String,

    /// Sheet holding side dishes
    #[serde(default = "default_side_sheet")]
    pub side_sheet: String,

    /// API key for a publicly shared spreadsheet
    pub api_key: Option<String>,

    /// Service-account JSON key file for a private spreadsheet
    pub credentials_path: Option<PathBuf>,

    #[serde(default = "default_sheets_url")]
    pub sheets_base_url: String,

    /// YAML catalog used when `source = file`
    pub file_path: Option<PathBuf>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_timeout("catalog.timeout_secs", self.timeout_secs)?;
        match self.source {
            CatalogSourceKind::Sheets => {
                if !is_set(&self.spreadsheet_id) {
                    return Err(ValidationError::MissingRequired("CATALOG__SPREADSHEET_ID"));
                }
                if !is_set(&self.api_key) && self.credentials_path.is_none() {
                    return Err(ValidationError::MissingRequired(
                        "CATALOG__API_KEY or CATALOG__CREDENTIALS_PATH",
                    ));
                }
                check_http_url("catalog.sheets_base_url", &self.sheets_base_url)?;
            }
            CatalogSourceKind::File => {
                if self.file_path.is_none() {
                    return Err(ValidationError::MissingRequired("CATALOG__FILE_PATH"));
                }
            }
        }
        Ok(())
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source: CatalogSourceKind::default(),
            spreadsheet_id: None,
            main_sheet: default_main_sheet(),
            side_sheet: default_side_sheet(),
            api_key: None,
            credentials_path: None,
            sheets_base_url: default_sheets_url(),
            file_path: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_main_sheet() -> String {
    "Dishes".to_string()
}

fn default_side_sheet() -> String {
    "Sides".to_string()
}

fn default_sheets_url() -> String {
    "https://sheets.googleapis.com/v4".to_string()
}

fn default_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheets_source_needs_spreadsheet_and_credentials() {
        let mut config = CatalogConfig::default();
        assert!(config.validate().is_err());

        config.spreadsheet_id = Some("1AbC".into());
        assert!(config.validate().is_err());

        config.api_key = Some("AIza-test".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn file_source_needs_path() {
        let mut config = CatalogConfig {
            source: CatalogSourceKind::File,
            ..CatalogConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("CATALOG__FILE_PATH"))
        );
        config.file_path = Some(PathBuf::from("catalog.yaml"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_sheet_names() {
        let config = CatalogConfig::default();
        assert_eq!(config.main_sheet, "Dishes");
        assert_eq!(config.side_sheet, "Sides");
    }
}
