//! Mock dish describer for testing.
//!
//! Returns queued descriptions or errors in order and records every dish
//! it was asked about.
//!
//! # Example
//!
//! ```ignore
//! let describer = MockDescriber::new()
//!     .with_description("Layers of pasta and ragù.")
//!     .with_error(DescribeError::Timeout(15));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::ports::{DescribeError, DishDescriber};

#[derive(Debug, Clone, Default)]
pub struct MockDescriber {
    responses: Arc<Mutex<VecDeque<Result<String, DescribeError>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockDescriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(self, text: impl Into<String>) -> Self {
        locked(&self.responses).push_back(Ok(text.into()));
        self
    }

    pub fn with_error(self, error: DescribeError) -> Self {
        locked(&self.responses).push_back(Err(error));
        self
    }

    /// Dish names asked about, in call order.
    pub fn calls(&self) -> Vec<String> {
        locked(&self.calls).clone()
    }
}

#[async_trait]
impl DishDescriber for MockDescriber {
    async fn describe(&self, dish_name: &str) -> Result<String, DescribeError> {
        locked(&self.calls).push(dish_name.to_string());
        locked(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Ok(format!("{} is a household favourite.", dish_name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queued_responses_then_default() {
        let describer = MockDescriber::new()
            .with_error(DescribeError::Timeout(15))
            .with_description("Creamy.");

        assert!(describer.describe("Risotto").await.is_err());
        assert_eq!(describer.describe("Risotto").await.unwrap(), "Creamy.");
        assert!(describer.describe("Chili").await.unwrap().contains("Chili"));
        assert_eq!(describer.calls(), vec!["Risotto", "Risotto", "Chili"]);
    }
}
