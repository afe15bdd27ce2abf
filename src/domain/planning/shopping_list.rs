//! Aggregated shopping list across every dish of a plan.

use serde::{Deserialize, Serialize};

use super::scaling::{format_quantity, DisplayPrecision, ScaledDish};

/// One line of the shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub name: String,
    pub unit: String,
    /// Unrounded total; round only through `display`.
    pub quantity: f64,
}

impl ShoppingItem {
    pub fn display(&self, precision: DisplayPrecision) -> String {
        let qty = format_quantity(self.quantity, precision);
        if self.unit.is_empty() {
            format!("{} {}", qty, self.name)
        } else {
            format!("{} {} {}", qty, self.unit, self.name)
        }
    }
}

/// Ingredients merged by (name, unit) in the order they first appear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub items: Vec<ShoppingItem>,
}

impl ShoppingList {
    pub fn aggregate<'a, I>(dishes: I) -> Self
    where
        I: IntoIterator<Item = &'a ScaledDish>,
    {
        let mut items: Vec<ShoppingItem> = Vec::new();
        for dish in dishes {
            for ingredient in &dish.ingredients {
                let existing = items.iter_mut().find(|item| {
                    item.name.to_lowercase() == ingredient.name.to_lowercase()
                        && item.unit.to_lowercase() == ingredient.unit.to_lowercase()
                });
                match existing {
                    Some(item) => item.quantity += ingredient.quantity,
                    None => items.push(ShoppingItem {
                        name: ingredient.name.clone(),
                        unit: ingredient.unit.clone(),
                        quantity: ingredient.quantity,
                    }),
                }
            }
        }
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn lines(&self, precision: DisplayPrecision) -> Vec<String> {
        self.items.iter().map(|item| item.display(precision)).collect()
    }
}
