//! Builds the configured `RecordStore` once at startup.

use secrecy::Secret;
use std::sync::Arc;

use super::{FirestoreConfig, FirestoreStore, InMemoryStore, JsonFileStore};
use crate::adapters::google::{GoogleAuth, DATASTORE_SCOPE};
use crate::config::{StorageBackend, StorageConfig};
use crate::ports::{RecordStore, StoreError};

/// Resolves the backend switch into a concrete store.
///
/// # Errors
///
/// `Unavailable` when Firestore is selected but its project or credentials
/// cannot be set up.
pub async fn build_record_store(config: &StorageConfig) -> Result<Arc<dyn RecordStore>, StoreError> {
    let store: Arc<dyn RecordStore> = match config.backend {
        StorageBackend::Json => Arc::new(JsonFileStore::new(&config.data_dir)),
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        StorageBackend::Firestore => {
            let project_id = config
                .firestore_project_id
                .clone()
                .filter(|p| !p.trim().is_empty())
                .ok_or_else(|| StoreError::unavailable("Firestore project id is not configured"))?;
            let client = reqwest::Client::builder()
                .timeout(config.timeout())
                .build()
                .map_err(|e| StoreError::unavailable(format!("Failed to create HTTP client: {}", e)))?;

            let auth = match (&config.access_token, &config.credentials_path) {
                (Some(token), _) if !token.trim().is_empty() => GoogleAuth::Static(Secret::new(token.clone())),
                (_, Some(path)) => GoogleAuth::service_account(path, DATASTORE_SCOPE, client.clone())
                    .await
                    .map_err(|e| StoreError::unavailable(e.to_string()))?,
                _ => GoogleAuth::None,
            };

            let firestore = FirestoreConfig::new(project_id)
                .with_base_url(&config.firestore_base_url)
                .with_database(&config.firestore_database)
                .with_timeout(config.timeout());
            Arc::new(FirestoreStore::with_client(firestore, auth, client))
        }
    };

    tracing::info!(backend = store.backend_name(), "Record store ready");
    Ok(store)
}
