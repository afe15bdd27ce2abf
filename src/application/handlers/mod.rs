//! Application handlers.
//!
//! The conversation handler turns inbound chat events into replies.

pub mod conversation;

pub use conversation::{TurnError, TurnHandler};
