//! Catalog module - dishes as the recipe source describes them, plus the
//! selection algorithms that draw from a catalog snapshot.

mod dish;
mod selection;

pub use dish::{find_by_name, same_dish, Dish, DishCategory, DishFilter, EffortLevel, Ingredient};
pub use selection::{find_replacement, select_dishes, Selection};
