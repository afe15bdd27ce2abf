//! Shared plumbing for Google REST APIs.

mod auth;

pub use auth::{
    GoogleAuth, GoogleAuthError, ServiceAccountAuth, ServiceAccountKey, DATASTORE_SCOPE,
    SHEETS_READONLY_SCOPE,
};
