//! Dish description adapters.
//!
//! - `AnthropicDescriber` - Claude Messages API
//! - `MockDescriber` - Scripted responses for tests

mod anthropic_describer;
mod mock_describer;

pub use anthropic_describer::{AnthropicConfig, AnthropicDescriber};
pub use mock_describer::MockDescriber;
