//! Conversation module - what comes in from a chat and what goes back out.

mod input;
mod reply;

pub use input::{Action, Command, Inbound, InboundEvent, UserInput};
pub use reply::{Button, Reply};
