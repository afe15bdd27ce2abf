//! Bearer tokens for Google REST APIs (Firestore, Sheets).
//!
//! Requests go out unauthenticated (local emulator), with an API key, with a
//! static bearer token, or with a service-account token: an RS256-signed
//! assertion exchanged for an OAuth access token and cached until shortly
//! before it expires.

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens are refreshed this long before Google says they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, thiserror::Error)]
pub enum GoogleAuthError {
    #[error("invalid service account credentials: {0}")]
    Credentials(String),

    #[error("failed to sign token assertion: {0}")]
    Signing(String),

    #[error("token exchange failed: {0}")]
    Exchange(String),
}

/// Fields we need from a service-account JSON key file.
#[derive(Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    private_key: Secret<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, GoogleAuthError> {
        serde_json::from_str(json).map_err(|e| GoogleAuthError::Credentials(e.to_string()))
    }

    pub async fn from_file(path: &Path) -> Result<Self, GoogleAuthError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            GoogleAuthError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    token: Secret<String>,
    expires_at: Instant,
}

/// Service account flow with a cached access token.
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    scope: &'static str,
    client: reqwest::Client,
    cache: RwLock<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey, scope: &'static str, client: reqwest::Client) -> Self {
        Self {
            key,
            scope,
            client,
            cache: RwLock::new(None),
        }
    }

    /// Builds the signed assertion sent to the token endpoint.
    pub fn signed_assertion(&self, now_unix: i64) -> Result<String, GoogleAuthError> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: self.scope,
            aud: &self.key.token_uri,
            iat: now_unix,
            exp: now_unix + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.expose_secret().as_bytes())
            .map_err(|e| GoogleAuthError::Credentials(e.to_string()))?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| GoogleAuthError::Signing(e.to_string()))
    }

    pub async fn access_token(&self) -> Result<String, GoogleAuthError> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            if Instant::now() + REFRESH_MARGIN < cached.expires_at {
                return Ok(cached.token.expose_secret().clone());
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(cached) = cache.as_ref() {
            if Instant::now() + REFRESH_MARGIN < cached.expires_at {
                return Ok(cached.token.expose_secret().clone());
            }
        }

        let assertion = self.signed_assertion(chrono::Utc::now().timestamp())?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| GoogleAuthError::Exchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GoogleAuthError::Exchange(format!("token endpoint returned {}", status)));
        }
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| GoogleAuthError::Exchange(e.to_string()))?;

        tracing::debug!(
            client_email = %self.key.client_email,
            expires_in = body.expires_in,
            "Obtained Google access token"
        );
        let token = body.access_token.clone();
        *cache = Some(CachedToken {
            token: Secret::new(body.access_token),
            expires_at: Instant::now() + Duration::from_secs(body.expires_in),
        });
        Ok(token)
    }
}

/// How requests to a Google API authenticate.
pub enum GoogleAuth {
    /// Local emulator, no `Authorization` header.
    None,
    /// API key sent as the `key` query parameter.
    ApiKey(Secret<String>),
    Static(Secret<String>),
    ServiceAccount(Box<ServiceAccountAuth>),
}

impl GoogleAuth {
    /// Loads a service-account key file and wraps it for `scope`.
    pub async fn service_account(
        path: &Path,
        scope: &'static str,
        client: reqwest::Client,
    ) -> Result<Self, GoogleAuthError> {
        let key = ServiceAccountKey::from_file(path).await?;
        Ok(GoogleAuth::ServiceAccount(Box::new(ServiceAccountAuth::new(key, scope, client))))
    }

    /// Applies credentials to an outgoing request.
    pub async fn apply(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, GoogleAuthError> {
        Ok(match self {
            GoogleAuth::None => request,
            GoogleAuth::ApiKey(key) => request.query(&[("key", key.expose_secret())]),
            GoogleAuth::Static(token) => request.bearer_auth(token.expose_secret()),
            GoogleAuth::ServiceAccount(auth) => request.bearer_auth(auth.access_token().await?),
        })
    }

    pub fn mode(&self) -> &'static str {
        match self {
            GoogleAuth::None => "none",
            GoogleAuth::ApiKey(_) => "api_key",
            GoogleAuth::Static(_) => "static_token",
            GoogleAuth::ServiceAccount(_) => "service_account",
        }
    }
}
