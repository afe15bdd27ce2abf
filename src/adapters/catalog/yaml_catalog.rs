//! YAML file catalog, for local use without a spreadsheet.
//!
//! ```yaml
//! mains:
//!   - name: Lasagne
//!     persons: 4
//!     effort: elaborate
//!     ingredients:
//!       - 500 g minced beef
//!       - 12 sheets pasta
//! sides:
//!   - name: Green salad
//!     effort: quick
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::row_parser::parse_ingredient;
use crate::domain::catalog::{Dish, DishCategory, DishFilter, EffortLevel};
use crate::ports::{apply_filter, CatalogError, CatalogSource};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    mains: Vec<DishEntry>,
    #[serde(default)]
    sides: Vec<DishEntry>,
}

#[derive(Debug, Deserialize)]
struct DishEntry {
    name: String,
    #[serde(default = "default_persons")]
    persons: u32,
    #[serde(default)]
    effort: Option<String>,
    #[serde(default)]
    ingredients: Vec<String>,
}

fn default_persons() -> u32 {
    4
}

impl DishEntry {
    fn into_dish(self, category: DishCategory) -> Result<Dish, String> {
        let effort = match self.effort.as_deref() {
            None => EffortLevel::Medium,
            Some(raw) => raw.parse().map_err(|e| format!("{}: {}", self.name, e))?,
        };
        let mut dish = Dish::new(&self.name, self.persons, effort, category).map_err(|e| e.to_string())?;
        for raw in &self.ingredients {
            dish = dish.with_ingredient(parse_ingredient(raw).map_err(|e| format!("{}: {}", self.name, e))?);
        }
        Ok(dish)
    }
}

/// Reads the catalog file on every call, so edits show up without a restart.
#[derive(Debug, Clone)]
pub struct YamlFileCatalog {
    path: PathBuf,
}

impl YamlFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, raw: &str) -> Result<Vec<Dish>, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(raw)
            .map_err(|e| CatalogError::invalid(format!("{}: {}", self.path.display(), e)))?;

        let entries = file
            .mains
            .into_iter()
            .map(|e| (e, DishCategory::Main))
            .chain(file.sides.into_iter().map(|e| (e, DishCategory::Side)));

        let mut dishes = Vec::new();
        for (entry, category) in entries {
            match entry.into_dish(category) {
                Ok(dish) => dishes.push(dish),
                Err(reason) => {
                    tracing::warn!(path = %self.path.display(), %reason, "Skipping catalog entry")
                }
            }
        }
        Ok(dishes)
    }
}

#[async_trait]
impl CatalogSource for YamlFileCatalog {
    async fn list_dishes(&self, filter: Option<&DishFilter>) -> Result<Vec<Dish>, CatalogError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            CatalogError::unavailable(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        Ok(apply_filter(self.parse(&raw)?, filter))
    }

    fn source_name(&self) -> &'static str {
        "file"
    }
}
