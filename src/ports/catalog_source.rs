//! Catalog Source Port - read-only access to the recipe catalog.

use async_trait::async_trait;

use crate::domain::catalog::{Dish, DishFilter};

/// Port for listing dishes from wherever the catalog lives.
///
/// Implementations apply `filter` themselves when given one; callers may
/// still filter again, so over-returning is harmless.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_dishes(&self, filter: Option<&DishFilter>) -> Result<Vec<Dish>, CatalogError>;

    /// Short source name for logs.
    fn source_name(&self) -> &'static str;
}

/// Errors that can occur while reading the catalog.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    #[error("catalog request timed out after {0}s")]
    Timeout(u64),

    /// The source answered but its content could not be used at all.
    #[error("invalid catalog data: {0}")]
    InvalidData(String),
}

impl CatalogError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidData(reason.into())
    }
}

/// Applies an optional filter to a fully loaded catalog.
pub fn apply_filter(dishes: Vec<Dish>, filter: Option<&DishFilter>) -> Vec<Dish> {
    match filter {
        Some(filter) => dishes.into_iter().filter(|d| filter.matches(d)).collect(),
        None => dishes,
    }
}
