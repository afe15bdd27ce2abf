//! Conversation turn handling.
//!
//! `TurnHandler` owns the per-chat dialogue. Each `*_flow` module adds the
//! stage handlers for one part of it; `prompts` renders every reply.

mod errors;
mod export_flow;
mod favorites_flow;
mod menu_flow;
mod profile_flow;
pub mod prompts;
mod quick_flow;
mod review_flow;
mod swap_flow;
mod turn;

pub use errors::TurnError;
pub use turn::TurnHandler;
