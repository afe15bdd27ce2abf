//! Persistence backend configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::{check_http_url, check_timeout, is_set, ValidationError};

/// Which `RecordStore` implementation to build at startup
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per record kind in `data_dir`
    #[default]
    Json,
    /// Google Cloud Firestore, one document per key
    Firestore,
    /// Process memory only (development and tests)
    Memory,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory holding `profiles.json`, `favorites.json`, `sessions.json`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    pub firestore_project_id: Option<String>,

    #[serde(default = "default_database")]
    pub firestore_database: String,

    /// Override for the Firestore emulator
    #[serde(default = "default_firestore_url")]
    pub firestore_base_url: String,

    /// Service-account JSON key file
    pub credentials_path: Option<PathBuf>,

    /// Static bearer token (alternative to a service account)
    pub access_token: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_timeout("storage.timeout_secs", self.timeout_secs)?;
        if self.backend == StorageBackend::Firestore {
            if !is_set(&self.firestore_project_id) {
                return Err(ValidationError::MissingRequired("STORAGE__FIRESTORE_PROJECT_ID"));
            }
            check_http_url("storage.firestore_base_url", &self.firestore_base_url)?;
            if self.credentials_path.is_some() && is_set(&self.access_token) {
                return Err(ValidationError::ConflictingCredentials);
            }
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: default_data_dir(),
            firestore_project_id: None,
            firestore_database: default_database(),
            firestore_base_url: default_firestore_url(),
            credentials_path: None,
            access_token: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_database() -> String {
    "(default)".to_string()
}

fn default_firestore_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_timeout() -> u64 {
    10
}
