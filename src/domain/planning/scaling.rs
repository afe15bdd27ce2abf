//! Portion scaling.
//!
//! Quantities are scaled in full precision and rounded exactly once, when a
//! value is displayed. A given (dish, persons, precision) triple therefore
//! always renders the same number; scale-then-unscale is not expected to
//! round-trip.

use serde::{Deserialize, Serialize};

use crate::domain::catalog::{Dish, Ingredient};

/// Number of decimals shown for quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisplayPrecision {
    /// Whole numbers (625 g, 2 eggs).
    #[default]
    Whole,
    /// One decimal (62.5 g, 1.5 eggs).
    Tenths,
}

impl DisplayPrecision {
    pub fn decimals(&self) -> u32 {
        match self {
            DisplayPrecision::Whole => 0,
            DisplayPrecision::Tenths => 1,
        }
    }
}

/// Scales `quantity` from `base_persons` to `target_persons` without rounding.
pub fn scale_quantity(quantity: f64, base_persons: u32, target_persons: u32) -> f64 {
    if base_persons == 0 {
        return quantity;
    }
    quantity * f64::from(target_persons) / f64::from(base_persons)
}

/// Rounds half away from zero at the given precision (2.5 → 3, -2.5 → -3).
pub fn round_half_away_from_zero(value: f64, precision: DisplayPrecision) -> f64 {
    let factor = 10f64.powi(precision.decimals() as i32);
    // f64::round already rounds ties away from zero.
    (value * factor).round() / factor
}

/// Renders a quantity for display, dropping a trailing `.0`.
pub fn format_quantity(value: f64, precision: DisplayPrecision) -> String {
    let rounded = round_half_away_from_zero(value, precision);
    if rounded.fract() == 0.0 {
        format!("{:.0}", rounded)
    } else {
        format!("{:.*}", precision.decimals() as usize, rounded)
    }
}

/// An ingredient after scaling; `quantity` is unrounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledIngredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

impl ScaledIngredient {
    pub fn display_quantity(&self, precision: DisplayPrecision) -> String {
        format_quantity(self.quantity, precision)
    }

    /// `625 g Pasta`, or `2 Eggs` when the ingredient has no unit.
    pub fn display(&self, precision: DisplayPrecision) -> String {
        let qty = self.display_quantity(precision);
        if self.unit.is_empty() {
            format!("{} {}", qty, self.name)
        } else {
            format!("{} {} {}", qty, self.unit, self.name)
        }
    }
}

/// A dish with every ingredient scaled to the plan's person count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledDish {
    pub name: String,
    pub persons: u32,
    pub multiplicity: u32,
    pub ingredients: Vec<ScaledIngredient>,
}

impl ScaledDish {
    /// Scales `dish` to `persons`, cooked `multiplicity` times.
    pub fn from_dish(dish: &Dish, persons: u32, multiplicity: u32) -> Self {
        let ingredients = dish
            .ingredients
            .iter()
            .map(|ingredient| scale_ingredient(ingredient, dish.base_person_count, persons, multiplicity))
            .collect();
        Self {
            name: dish.name.clone(),
            persons,
            multiplicity: multiplicity.max(1),
            ingredients,
        }
    }
}

fn scale_ingredient(
    ingredient: &Ingredient,
    base_persons: u32,
    persons: u32,
    multiplicity: u32,
) -> ScaledIngredient {
    ScaledIngredient {
        name: ingredient.name.clone(),
        quantity: scale_quantity(ingredient.quantity, base_persons, persons)
            * f64::from(multiplicity.max(1)),
        unit: ingredient.unit.clone(),
    }
}
