//! Storage Adapters
//!
//! Implementations of the `RecordStore` port.
//!
//! ## Available Adapters
//!
//! - **JsonFileStore** - One JSON table file per record kind
//! - **FirestoreStore** - One Firestore document per key
//! - **InMemoryStore** - Process memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::build_record_store;
//!
//! let store = build_record_store(&config.storage).await?;
//! ```

mod factory;
mod firestore_store;
mod firestore_value;
mod in_memory_store;
mod json_file_store;

pub use factory::build_record_store;
pub use firestore_store::{FirestoreConfig, FirestoreStore};
pub use in_memory_store::InMemoryStore;
pub use json_file_store::JsonFileStore;
