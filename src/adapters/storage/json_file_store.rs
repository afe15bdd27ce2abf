//! JSON file record store
//!
//! One file per record kind (`profiles.json`, `favorites.json`,
//! `sessions.json`), each a JSON object mapping namespaced keys to records.
//! Every write reads the whole table, changes one entry, and replaces the
//! file through a temporary file and a rename.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::foundation::{StoreKey, Timestamp};
use crate::ports::{stamp_record, RecordKind, RecordStore, StoreError};

type Table = Map<String, Value>;

/// File-backed record store for single-instance deployments.
#[derive(Debug)]
pub struct JsonFileStore {
    data_dir: PathBuf,
    profiles: Mutex<()>,
    favorites: Mutex<()>,
    sessions: Mutex<()>,
}

impl JsonFileStore {
    /// # Example
    /// ```ignore
    /// let store = JsonFileStore::new("./data");
    /// ```
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            profiles: Mutex::new(()),
            favorites: Mutex::new(()),
            sessions: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn table_path(&self, kind: RecordKind) -> PathBuf {
        self.data_dir.join(kind.file_name())
    }

    /// Writers of one kind are serialised; kinds are independent.
    fn write_lock(&self, kind: RecordKind) -> &Mutex<()> {
        match kind {
            RecordKind::Profile => &self.profiles,
            RecordKind::Favorites => &self.favorites,
            RecordKind::Session => &self.sessions,
        }
    }

    /// Loads a whole table. Missing or unreadable JSON yields an empty table;
    /// the next write replaces the damaged file.
    async fn read_table(&self, kind: RecordKind) -> Result<Table, StoreError> {
        let path = self.table_path(kind);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Table::new()),
            Err(e) => {
                return Err(StoreError::Io(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        if raw.trim().is_empty() {
            return Ok(Table::new());
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(table)) => Ok(table),
            Ok(other) => {
                tracing::warn!(
                    file = %path.display(),
                    found = json_type(&other),
                    "Record table is not a JSON object, treating as empty"
                );
                Ok(Table::new())
            }
            Err(e) => {
                tracing::warn!(
                    file = %path.display(),
                    error = %e,
                    "Record table is corrupt, treating as empty"
                );
                Ok(Table::new())
            }
        }
    }

    async fn write_table(&self, kind: RecordKind, table: &Table) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| StoreError::Io(format!("Failed to create directory: {}", e)))?;

        let content = serde_json::to_string_pretty(table)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let path = self.table_path(kind);
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content)
            .await
            .map_err(|e| StoreError::Io(format!("Failed to write temporary file: {}", e)))?;

        // Rename to final location (atomic replace on the same filesystem)
        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| StoreError::Io(format!("Failed to rename file: {}", e)))?;

        Ok(())
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn get(&self, kind: RecordKind, key: &StoreKey) -> Result<Option<Value>, StoreError> {
        let table = self.read_table(kind).await?;
        Ok(table.get(key.as_str()).cloned())
    }

    async fn set(&self, kind: RecordKind, key: &StoreKey, record: Value) -> Result<Value, StoreError> {
        let _guard = self.write_lock(kind).lock().await;

        let mut table = self.read_table(kind).await?;
        let stamped = stamp_record(table.get(key.as_str()), record, Timestamp::now())?;
        table.insert(key.to_string(), stamped.clone());
        self.write_table(kind, &table).await?;

        tracing::debug!(kind = %kind, key = %key, entries = table.len(), "Record written");
        Ok(stamped)
    }

    async fn delete(&self, kind: RecordKind, key: &StoreKey) -> Result<(), StoreError> {
        let _guard = self.write_lock(kind).lock().await;

        let mut table = self.read_table(kind).await?;
        if table.remove(key.as_str()).is_some() {
            self.write_table(kind, &table).await?;
            tracing::debug!(kind = %kind, key = %key, "Record deleted");
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "json"
    }
}
