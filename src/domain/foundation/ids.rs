//! Strongly-typed identifier value objects.
//!
//! Messaging platforms hand us numeric identities for both users and chats.
//! They live in separate storage namespaces (`u:<id>` and `c:<id>`), so the
//! same number can safely be both a user and a chat.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Identity of the person talking to the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a UserId from the transport's numeric identity.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric identity.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|e| ValidationError::invalid_format("user_id", e.to_string()))
    }
}

/// Identity of the conversation (private chat or group) a turn arrives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(i64);

impl ChatId {
    /// Creates a ChatId from the transport's numeric identity.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric identity.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChatId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|e| ValidationError::invalid_format("chat_id", e.to_string()))
    }
}

const USER_PREFIX: &str = "u:";
const CHAT_PREFIX: &str = "c:";

/// Namespaced storage key.
///
/// Profiles and favorites are keyed by user (`u:<id>`), sessions by chat
/// (`c:<id>`). The only way to build one is from a typed identity, so the
/// two namespaces cannot be mixed up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoreKey(String);

impl StoreKey {
    /// Key for per-user records (profile, favorites).
    pub fn user(user_id: &UserId) -> Self {
        Self(format!("{}{}", USER_PREFIX, user_id))
    }

    /// Key for per-chat records (session).
    pub fn chat(chat_id: &ChatId) -> Self {
        Self(format!("{}{}", CHAT_PREFIX, chat_id))
    }

    /// Parses a stored key, accepting only the `u:<id>` and `c:<id>` shapes.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if let Some(id) = raw.strip_prefix(USER_PREFIX) {
            return Ok(Self::user(&id.parse()?));
        }
        if let Some(id) = raw.strip_prefix(CHAT_PREFIX) {
            return Ok(Self::chat(&id.parse()?));
        }
        Err(ValidationError::invalid_format(
            "store_key",
            format!("expected 'u:<id>' or 'c:<id>', got '{}'", raw),
        ))
    }

    /// Returns the key as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for per-user keys.
    pub fn is_user(&self) -> bool {
        self.0.starts_with(USER_PREFIX)
    }

    /// True for per-chat keys.
    pub fn is_chat(&self) -> bool {
        self.0.starts_with(CHAT_PREFIX)
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for StoreKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StoreKey> for String {
    fn from(key: StoreKey) -> Self {
        key.0
    }
}
