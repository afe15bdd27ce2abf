//! Dish Describer Port - optional enrichment of the recipe view.
//!
//! Failures here are never fatal; the recipe is shown without a description.

use async_trait::async_trait;

#[async_trait]
pub trait DishDescriber: Send + Sync {
    /// A short, appetising description of `dish_name`.
    async fn describe(&self, dish_name: &str) -> Result<String, DescribeError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DescribeError {
    #[error("describer unavailable: {0}")]
    Unavailable(String),

    #[error("describer timed out after {0}s")]
    Timeout(u64),

    #[error("invalid describer response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dish_describer_is_object_safe() {
        fn check<T: DishDescriber + ?Sized>() {}
        check::<dyn DishDescriber>();
    }
}
