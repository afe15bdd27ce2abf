//! Firestore record store
//!
//! One document per key in a collection per record kind, via the Firestore
//! REST API. Writes are guarded by a precondition on the document's
//! `updateTime` (or its absence) so that two workers updating the same key
//! cannot silently overwrite each other; a lost race is retried.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::firestore_value::{decode_fields, encode_fields};
use crate::adapters::google::GoogleAuth;
use crate::domain::foundation::{StoreKey, Timestamp};
use crate::ports::{stamp_record, RecordKind, RecordStore, StoreError};

const MAX_WRITE_ATTEMPTS: usize = 3;

/// Connection settings for one Firestore database.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub base_url: String,
    pub project_id: String,
    pub database: String,
    pub timeout: std::time::Duration,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            base_url: "https://firestore.googleapis.com/v1".to_string(),
            project_id: project_id.into(),
            database: "(default)".to_string(),
            timeout: std::time::Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default)]
    fields: Map<String, Value>,
    update_time: Option<String>,
}

/// A document as read, with the version used for the write precondition.
struct Versioned {
    record: Value,
    update_time: Option<String>,
}

pub struct FirestoreStore {
    config: FirestoreConfig,
    auth: GoogleAuth,
    client: Client,
}

impl FirestoreStore {
    pub fn new(config: FirestoreConfig, auth: GoogleAuth) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::unavailable(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(config, auth, client))
    }

    pub fn with_client(config: FirestoreConfig, auth: GoogleAuth, client: Client) -> Self {
        Self { config, auth, client }
    }

    fn document_url(&self, kind: RecordKind, key: &StoreKey) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents/{}/{}",
            self.config.base_url,
            self.config.project_id,
            self.config.database,
            kind.collection(),
            key
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let request = self
            .auth
            .apply(request)
            .await
            .map_err(|e| StoreError::unavailable(e.to_string()))?;
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::unavailable("Firestore request timed out")
            } else {
                StoreError::unavailable(format!("Firestore request failed: {}", e))
            }
        })
    }

    async fn fetch(&self, kind: RecordKind, key: &StoreKey) -> Result<Option<Versioned>, StoreError> {
        let response = self.send(self.client.get(self.document_url(kind, key))).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let document: Document = response
                    .json()
                    .await
                    .map_err(|e| StoreError::corrupt(kind, key, e.to_string()))?;
                let fields = decode_fields(&document.fields)
                    .map_err(|reason| StoreError::corrupt(kind, key, reason))?;
                Ok(Some(Versioned {
                    record: Value::Object(fields),
                    update_time: document.update_time,
                }))
            }
            status => Err(status_error(status, response).await),
        }
    }

    /// One guarded write. `Ok(false)` means the precondition failed.
    async fn try_write(
        &self,
        kind: RecordKind,
        key: &StoreKey,
        record: &Value,
        previous: Option<&str>,
    ) -> Result<bool, StoreError> {
        let Value::Object(fields) = record else {
            return Err(StoreError::Serialization("record must be a JSON object".to_string()));
        };
        let precondition = match previous {
            Some(update_time) => ("currentDocument.updateTime", update_time.to_string()),
            None => ("currentDocument.exists", "false".to_string()),
        };
        let body = serde_json::json!({ "fields": encode_fields(fields) });
        let request = self
            .client
            .patch(self.document_url(kind, key))
            .query(&[precondition])
            .json(&body);

        let response = self.send(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        match status {
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => Ok(false),
            StatusCode::BAD_REQUEST => {
                let body = response.text().await.unwrap_or_default();
                if error_status(&body).as_deref() == Some("FAILED_PRECONDITION") {
                    return Ok(false);
                }
                let snippet: String = body.chars().take(200).collect();
                Err(StoreError::Serialization(format!("Firestore rejected the write: {}", snippet)))
            }
            _ => Err(status_error(status, response).await),
        }
    }
}

/// `error.status` of a Firestore error body. A stale `updateTime` comes back
/// as 400 with `FAILED_PRECONDITION`; an existing document under
/// `exists=false` as 409 (412 on some proxies).
fn error_status(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("status")?
        .as_str()
        .map(str::to_string)
}

async fn status_error(status: StatusCode, response: Response) -> StoreError {
    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    StoreError::unavailable(format!("Firestore returned {}: {}", status, snippet))
}

#[async_trait]
impl RecordStore for FirestoreStore {
    async fn get(&self, kind: RecordKind, key: &StoreKey) -> Result<Option<Value>, StoreError> {
        Ok(self.fetch(kind, key).await?.map(|v| v.record))
    }

    async fn set(&self, kind: RecordKind, key: &StoreKey, record: Value) -> Result<Value, StoreError> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let existing = self.fetch(kind, key).await?;
            let stamped = stamp_record(
                existing.as_ref().map(|v| &v.record),
                record.clone(),
                Timestamp::now(),
            )?;
            let previous = existing.as_ref().and_then(|v| v.update_time.as_deref());

            if self.try_write(kind, key, &stamped, previous).await? {
                return Ok(stamped);
            }
            tracing::debug!(kind = %kind, key = %key, attempt, "Firestore write raced, retrying");
        }
        tracing::warn!(kind = %kind, key = %key, "Firestore write kept conflicting");
        Err(StoreError::Conflict(key.to_string()))
    }

    async fn delete(&self, kind: RecordKind, key: &StoreKey) -> Result<(), StoreError> {
        let response = self.send(self.client.delete(self.document_url(kind, key))).await?;
        match response.status() {
            status if status.is_success() || status == StatusCode::NOT_FOUND => Ok(()),
            status => Err(status_error(status, response).await),
        }
    }

    fn backend_name(&self) -> &'static str {
        "firestore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ChatId, UserId};
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves the given canned responses, one per connection, in order.
    async fn fake_firestore(responses: Vec<(u16, String)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                loop {
                    let n = socket.read(&mut chunk).await.unwrap();
                    buf.extend_from_slice(&chunk[..n]);
                    if n == 0 || request_complete(&buf) {
                        break;
                    }
                }
                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });
        format!("http://{}", addr)
    }

    fn request_complete(buf: &[u8]) -> bool {
        let text = String::from_utf8_lossy(buf);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..header_end]
            .lines()
            .find_map(|l| {
                let lower = l.to_ascii_lowercase();
                lower
                    .strip_prefix("content-length:")
                    .and_then(|v| v.trim().parse::<usize>().ok())
            })
            .unwrap_or(0);
        buf.len() >= header_end + 4 + length
    }

    fn store(base_url: &str) -> FirestoreStore {
        let config = FirestoreConfig::new("menus").with_base_url(base_url);
        FirestoreStore::new(config, GoogleAuth::None).unwrap()
    }

    #[test]
    fn document_url_includes_collection_and_key() {
        let store = store("http://localhost:8080/v1/");
        let url = store.document_url(RecordKind::Session, &StoreKey::chat(&ChatId::new(100)));
        assert_eq!(
            url,
            "http://localhost:8080/v1/projects/menus/databases/(default)/documents/sessions/c:100"
        );
    }

    #[tokio::test]
    async fn missing_document_is_none() {
        let base = fake_firestore(vec![(404, r#"{"error":{"status":"NOT_FOUND"}}"#.into())]).await;
        let result = store(&base).get(RecordKind::Profile, &StoreKey::user(&UserId::new(42))).await;
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn existing_document_is_decoded() {
        let doc = json!({
            "name": "projects/menus/databases/(default)/documents/profiles/u:42",
            "fields": {"household_size": {"integerValue": "3"}},
            "updateTime": "2024-05-01T10:00:00.123456Z"
        });
        let base = fake_firestore(vec![(200, doc.to_string())]).await;
        let record = store(&base)
            .get(RecordKind::Profile, &StoreKey::user(&UserId::new(42)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record["household_size"], 3);
    }

    #[tokio::test]
    async fn server_error_is_unavailable_not_absent() {
        let base = fake_firestore(vec![(503, "{}".into())]).await;
        let result = store(&base).get(RecordKind::Session, &StoreKey::chat(&ChatId::new(1))).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn unreachable_backend_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let result = store(&format!("http://{}", addr))
            .get(RecordKind::Session, &StoreKey::chat(&ChatId::new(1)))
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn set_retries_after_lost_race() {
        let base = fake_firestore(vec![
            (404, "{}".into()),
            (409, r#"{"error":{"status":"ALREADY_EXISTS"}}"#.into()),
            (404, "{}".into()),
            (200, "{}".into()),
        ])
        .await;
        let stamped = store(&base)
            .set(RecordKind::Favorites, &StoreKey::user(&UserId::new(7)), json!({"dishes": ["A"]}))
            .await
            .unwrap();
        assert_eq!(stamped["dishes"], json!(["A"]));
        assert!(stamped["created_at"].is_string());
    }

    #[tokio::test]
    async fn stale_update_time_is_retried() {
        let existing = json!({
            "fields": {},
            "updateTime": "2024-05-01T10:00:00.123456Z"
        });
        let base = fake_firestore(vec![
            (200, existing.to_string()),
            (400, r#"{"error":{"code":400,"status":"FAILED_PRECONDITION"}}"#.into()),
            (200, existing.to_string()),
            (200, "{}".into()),
        ])
        .await;
        let result = store(&base)
            .set(RecordKind::Favorites, &StoreKey::user(&UserId::new(7)), json!({"dishes": ["A"]}))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn malformed_write_is_not_retried_or_unavailable() {
        let base = fake_firestore(vec![
            (404, "{}".into()),
            (400, r#"{"error":{"code":400,"status":"INVALID_ARGUMENT"}}"#.into()),
        ])
        .await;
        let result = store(&base)
            .set(RecordKind::Favorites, &StoreKey::user(&UserId::new(7)), json!({"dishes": ["A"]}))
            .await;
        let err = result.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
        assert!(!err.is_unavailable());
    }

    #[tokio::test]
    async fn delete_of_missing_document_succeeds() {
        let base = fake_firestore(vec![(404, "{}".into())]).await;
        let result = store(&base).delete(RecordKind::Session, &StoreKey::chat(&ChatId::new(9))).await;
        assert!(result.is_ok());
    }
}
