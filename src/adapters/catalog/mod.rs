//! Recipe catalog adapters.

mod row_parser;
mod sheets_catalog;
mod static_catalog;
mod yaml_catalog;

pub use row_parser::{parse_ingredient, parse_rows, RowIssue};
pub use sheets_catalog::{SheetsCatalog, SheetsConfig};
pub use static_catalog::StaticCatalog;
pub use yaml_catalog::YamlFileCatalog;

use secrecy::Secret;
use std::sync::Arc;

use crate::adapters::google::{GoogleAuth, SHEETS_READONLY_SCOPE};
use crate::config::{CatalogConfig, CatalogSourceKind};
use crate::ports::{CatalogError, CatalogSource};

/// Builds the configured catalog source.
pub async fn build_catalog(config: &CatalogConfig) -> Result<Arc<dyn CatalogSource>, CatalogError> {
    let catalog: Arc<dyn CatalogSource> = match config.source {
        CatalogSourceKind::File => {
            let path = config
                .file_path
                .clone()
                .ok_or_else(|| CatalogError::unavailable("catalog file path is not configured"))?;
            Arc::new(YamlFileCatalog::new(path))
        }
        CatalogSourceKind::Sheets => {
            let spreadsheet_id = config
                .spreadsheet_id
                .clone()
                .ok_or_else(|| CatalogError::unavailable("spreadsheet id is not configured"))?;
            let client = reqwest::Client::builder()
                .timeout(config.timeout())
                .build()
                .map_err(|e| CatalogError::unavailable(format!("Failed to create HTTP client: {}", e)))?;

            let auth = match (&config.api_key, &config.credentials_path) {
                (Some(key), _) if !key.trim().is_empty() => GoogleAuth::ApiKey(Secret::new(key.clone())),
                (_, Some(path)) => GoogleAuth::service_account(path, SHEETS_READONLY_SCOPE, client.clone())
                    .await
                    .map_err(|e| CatalogError::unavailable(e.to_string()))?,
                _ => GoogleAuth::None,
            };

            let sheets = SheetsConfig::new(spreadsheet_id)
                .with_base_url(&config.sheets_base_url)
                .with_sheets(&config.main_sheet, &config.side_sheet)
                .with_timeout(config.timeout());
            tracing::debug!(auth = auth.mode(), "Sheets catalog configured");
            Arc::new(SheetsCatalog::with_client(sheets, auth, client))
        }
    };

    tracing::info!(source = catalog.source_name(), "Catalog source ready");
    Ok(catalog)
}
