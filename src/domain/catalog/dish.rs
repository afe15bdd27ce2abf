//! Dish and ingredient value objects as delivered by the recipe catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// How much work a dish takes to cook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffortLevel {
    Quick,
    Medium,
    Elaborate,
}

impl EffortLevel {
    pub const ALL: [EffortLevel; 3] = [EffortLevel::Quick, EffortLevel::Medium, EffortLevel::Elaborate];

    /// Human-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            EffortLevel::Quick => "Quick (under 30 min)",
            EffortLevel::Medium => "Medium",
            EffortLevel::Elaborate => "Elaborate",
        }
    }

    /// Wire name used in callback data and catalog cells.
    pub fn as_str(&self) -> &'static str {
        match self {
            EffortLevel::Quick => "quick",
            EffortLevel::Medium => "medium",
            EffortLevel::Elaborate => "elaborate",
        }
    }
}

impl fmt::Display for EffortLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffortLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick" | "easy" | "simple" => Ok(EffortLevel::Quick),
            "medium" | "normal" => Ok(EffortLevel::Medium),
            "elaborate" | "hard" | "complex" => Ok(EffortLevel::Elaborate),
            other => Err(ValidationError::invalid_format(
                "effort",
                format!("unknown level '{}'", other),
            )),
        }
    }
}

/// Whether a dish is a main course or a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DishCategory {
    #[default]
    Main,
    Side,
}

/// One line of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::empty_field("ingredient.name"));
        }
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(ValidationError::invalid_format(
                "ingredient.quantity",
                format!("'{}' must be a non-negative number", quantity),
            ));
        }
        Ok(Self {
            name,
            quantity,
            unit: unit.into().trim().to_string(),
        })
    }
}

/// A recipe entry in the catalog.
///
/// # Invariants
///
/// - `name` is non-empty
/// - `base_person_count` is at least 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub name: String,
    pub base_person_count: u32,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    pub effort: EffortLevel,
    #[serde(default)]
    pub category: DishCategory,
}

impl Dish {
    pub fn new(
        name: impl Into<String>,
        base_person_count: u32,
        effort: EffortLevel,
        category: DishCategory,
    ) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::empty_field("dish.name"));
        }
        if base_person_count == 0 {
            return Err(ValidationError::out_of_range(
                "dish.base_person_count",
                1,
                i64::from(u32::MAX),
                0,
            ));
        }
        Ok(Self {
            name,
            base_person_count,
            ingredients: Vec::new(),
            effort,
            category,
        })
    }

    pub fn with_ingredient(mut self, ingredient: Ingredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }

    /// Case-insensitive name comparison, the identity rule for dishes.
    pub fn is_named(&self, name: &str) -> bool {
        same_dish(&self.name, name)
    }
}

/// Dish names compare case-insensitively and ignore surrounding whitespace.
pub fn same_dish(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Looks a dish up by name.
pub fn find_by_name<'a>(dishes: &'a [Dish], name: &str) -> Option<&'a Dish> {
    dishes.iter().find(|d| d.is_named(name))
}

/// Criteria for narrowing the catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DishFilter {
    pub category: Option<DishCategory>,
    pub effort: Option<EffortLevel>,
    pub exclude: Vec<String>,
}

impl DishFilter {
    pub fn mains() -> Self {
        Self {
            category: Some(DishCategory::Main),
            ..Self::default()
        }
    }

    pub fn sides() -> Self {
        Self {
            category: Some(DishCategory::Side),
            ..Self::default()
        }
    }

    pub fn with_effort(mut self, effort: Option<EffortLevel>) -> Self {
        self.effort = effort;
        self
    }

    pub fn excluding<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn matches(&self, dish: &Dish) -> bool {
        if self.category.is_some_and(|c| c != dish.category) {
            return false;
        }
        if self.effort.is_some_and(|e| e != dish.effort) {
            return false;
        }
        !self.exclude.iter().any(|name| dish.is_named(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lasagne() -> Dish {
        Dish::new("Lasagne", 4, EffortLevel::Elaborate, DishCategory::Main).unwrap()
    }

    #[test]
    fn effort_parses_synonyms() {
        assert_eq!("Easy".parse::<EffortLevel>().unwrap(), EffortLevel::Quick);
        assert_eq!(" normal ".parse::<EffortLevel>().unwrap(), EffortLevel::Medium);
        assert_eq!("COMPLEX".parse::<EffortLevel>().unwrap(), EffortLevel::Elaborate);
        assert!("whenever".parse::<EffortLevel>().is_err());
    }

    #[test]
    fn dish_rejects_zero_base_persons() {
        assert!(Dish::new("Soup", 0, EffortLevel::Quick, DishCategory::Main).is_err());
    }

    #[test]
    fn dish_rejects_blank_name() {
        assert!(Dish::new("   ", 2, EffortLevel::Quick, DishCategory::Main).is_err());
    }

    #[test]
    fn ingredient_rejects_negative_quantity() {
        assert!(Ingredient::new("Flour", -1.0, "g").is_err());
        assert!(Ingredient::new("Flour", f64::NAN, "g").is_err());
    }

    #[test]
    fn filter_matches_category_effort_and_exclusions() {
        let dish = lasagne();
        assert!(DishFilter::mains().matches(&dish));
        assert!(!DishFilter::sides().matches(&dish));
        assert!(!DishFilter::mains()
            .with_effort(Some(EffortLevel::Quick))
            .matches(&dish));
        assert!(!DishFilter::mains().excluding(["lasagne"]).matches(&dish));
    }

    #[test]
    fn find_by_name_ignores_case() {
        let dishes = vec![lasagne()];
        assert!(find_by_name(&dishes, " LASAGNE ").is_some());
        assert!(find_by_name(&dishes, "Risotto").is_none());
    }

    #[test]
    fn dish_deserializes_with_missing_optional_fields() {
        let json = r#"{"name":"Salad","base_person_count":2,"effort":"quick","rating":5}"#;
        let dish: Dish = serde_json::from_str(json).unwrap();
        assert_eq!(dish.category, DishCategory::Main);
        assert!(dish.ingredients.is_empty());
    }
}
