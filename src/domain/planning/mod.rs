//! Planning module - the working menu, portion scaling, shopping list
//! aggregation and the finalized plan document.

mod document;
mod export;
mod menu;
mod scaling;
mod shopping_list;

pub use document::{plural_persons, MenuPlanDocument};
pub use export::{ExportFormat, ExportedDocument};
pub use menu::{MenuEntry, WorkingMenu, MAX_MULTIPLICITY};
pub use scaling::{
    format_quantity, round_half_away_from_zero, scale_quantity, DisplayPrecision, ScaledDish,
    ScaledIngredient,
};
pub use shopping_list::{ShoppingItem, ShoppingList};
