//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, store keys, timestamps, errors, state machine)
//! - `catalog` - Dishes, ingredients and random selection
//! - `planning` - Working menu, portion scaling, shopping list, export values
//! - `profile` - Per-user household preferences
//! - `favorites` - Per-user liked dishes
//! - `session` - Per-chat dialogue state
//! - `conversation` - Inbound events, commands, actions and replies

pub mod catalog;
pub mod conversation;
pub mod favorites;
pub mod foundation;
pub mod planning;
pub mod profile;
pub mod session;
