//! Application layer - turn handling and the typed persistence facade.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;
pub mod persistence;

pub use handlers::{TurnError, TurnHandler};
pub use persistence::PersistenceStore;
