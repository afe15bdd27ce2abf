//! In-memory catalog
//!
//! Holds a fixed dish list. Tests use it to script catalog outages and to
//! count how often the catalog was consulted.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::domain::catalog::{Dish, DishFilter};
use crate::ports::{apply_filter, CatalogError, CatalogSource};

#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    dishes: Arc<Vec<Dish>>,
    unavailable: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl StaticCatalog {
    pub fn new(dishes: Vec<Dish>) -> Self {
        Self {
            dishes: Arc::new(dishes),
            ..Self::default()
        }
    }

    /// While set, every listing fails with `CatalogError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn list_dishes(&self, filter: Option<&DishFilter>) -> Result<Vec<Dish>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::unavailable("static catalog switched off"));
        }
        Ok(apply_filter(self.dishes.as_ref().clone(), filter))
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}
