//! The finalized plan handed to the export renderer.

use serde::{Deserialize, Serialize};

use super::menu::WorkingMenu;
use super::scaling::{DisplayPrecision, ScaledDish};
use super::shopping_list::ShoppingList;
use crate::domain::catalog::{find_by_name, Dish};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};

/// Everything an exporter needs to render a menu plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuPlanDocument {
    pub title: String,
    pub person_count: u32,
    pub precision: DisplayPrecision,
    pub dishes: Vec<ScaledDish>,
    pub shopping_list: ShoppingList,
    pub created_at: Timestamp,
}

impl MenuPlanDocument {
    /// Scales every menu entry against the catalog and aggregates the list.
    ///
    /// # Errors
    ///
    /// - `DishNotFound` if a menu entry no longer exists in the catalog
    pub fn build(
        menu: &WorkingMenu,
        catalog: &[Dish],
        person_count: u32,
        precision: DisplayPrecision,
    ) -> Result<Self, DomainError> {
        let mut dishes = Vec::with_capacity(menu.len());
        for entry in menu.entries() {
            let dish = find_by_name(catalog, &entry.dish).ok_or_else(|| {
                DomainError::new(
                    ErrorCode::DishNotFound,
                    format!("'{}' is no longer in the catalog", entry.dish),
                )
                .with_detail("dish", entry.dish.clone())
            })?;
            dishes.push(ScaledDish::from_dish(dish, person_count, entry.multiplicity));
        }
        let shopping_list = ShoppingList::aggregate(&dishes);
        let created_at = Timestamp::now();

        Ok(Self {
            title: format!("Menu plan for {} ({})", plural_persons(person_count), created_at.as_datetime().format("%Y-%m-%d")),
            person_count,
            precision,
            dishes,
            shopping_list,
            created_at,
        })
    }
}

/// `1 person`, `4 persons`.
pub fn plural_persons(count: u32) -> String {
    if count == 1 {
        "1 person".to_string()
    } else {
        format!("{} persons", count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{DishCategory, EffortLevel, Ingredient};
    use crate::domain::planning::MenuEntry;

    fn catalog() -> Vec<Dish> {
        vec![
            Dish::new("Carbonara", 2, EffortLevel::Quick, DishCategory::Main)
                .unwrap()
                .with_ingredient(Ingredient::new("Pasta", 250.0, "g").unwrap()),
            Dish::new("Salad", 4, EffortLevel::Quick, DishCategory::Side)
                .unwrap()
                .with_ingredient(Ingredient::new("Lettuce", 1.0, "").unwrap()),
        ]
    }

    #[test]
    fn builds_scaled_plan_and_shopping_list() {
        let mut menu = WorkingMenu::new();
        menu.push(MenuEntry::new("Carbonara", DishCategory::Main));
        menu.push(MenuEntry::new("salad", DishCategory::Side));

        let doc = MenuPlanDocument::build(&menu, &catalog(), 5, DisplayPrecision::Whole).unwrap();

        assert_eq!(doc.dishes.len(), 2);
        assert_eq!(
            doc.shopping_list.lines(DisplayPrecision::Whole),
            vec!["625 g Pasta", "1 Lettuce"]
        );
        assert!(doc.title.contains("5 persons"));
    }

    #[test]
    fn missing_dish_is_reported() {
        let mut menu = WorkingMenu::new();
        menu.push(MenuEntry::new("Goulash", DishCategory::Main));
        let err = MenuPlanDocument::build(&menu, &catalog(), 2, DisplayPrecision::Whole).unwrap_err();
        assert_eq!(err.code, ErrorCode::DishNotFound);
    }
}
