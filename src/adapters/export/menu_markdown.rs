//! Markdown and plain-text renderings of a menu plan.

use std::fmt::Write;

use crate::domain::planning::{plural_persons, MenuPlanDocument, ScaledDish};

/// Markdown source used directly and as input for HTML and PDF.
pub fn render_markdown(plan: &MenuPlanDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", plan.title);
    let _ = writeln!(out);
    let _ = writeln!(out, "*For {}*", plural_persons(plan.person_count));
    let _ = writeln!(out);
    let _ = writeln!(out, "## Dishes");

    for (i, dish) in plan.dishes.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "### {}. {}", i + 1, dish_heading(dish));
        let _ = writeln!(out);
        if dish.ingredients.is_empty() {
            let _ = writeln!(out, "_No ingredients listed._");
        }
        for ingredient in &dish.ingredients {
            let _ = writeln!(out, "- {}", ingredient.display(plan.precision));
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Shopping list");
    let _ = writeln!(out);
    for line in plan.shopping_list.lines(plan.precision) {
        let _ = writeln!(out, "- [ ] {}", line);
    }
    out
}

/// Plain listing for chats that cannot open files.
pub fn render_text(plan: &MenuPlanDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", plan.title.to_uppercase());
    let _ = writeln!(out, "For {}", plural_persons(plan.person_count));

    for (i, dish) in plan.dishes.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}. {}", i + 1, dish_heading(dish));
        for ingredient in &dish.ingredients {
            let _ = writeln!(out, "   * {}", ingredient.display(plan.precision));
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "SHOPPING LIST");
    for line in plan.shopping_list.lines(plan.precision) {
        let _ = writeln!(out, "[ ] {}", line);
    }
    out
}

fn dish_heading(dish: &ScaledDish) -> String {
    if dish.multiplicity > 1 {
        format!("{} (x{})", dish.name, dish.multiplicity)
    } else {
        dish.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{Dish, DishCategory, EffortLevel, Ingredient};
    use crate::domain::planning::{DisplayPrecision, MenuEntry, WorkingMenu};

    fn plan() -> MenuPlanDocument {
        let catalog = vec![
            Dish::new("Carbonara", 2, EffortLevel::Quick, DishCategory::Main)
                .unwrap()
                .with_ingredient(Ingredient::new("Spaghetti", 250.0, "g").unwrap())
                .with_ingredient(Ingredient::new("Eggs", 3.0, "").unwrap()),
            Dish::new("Salad", 4, EffortLevel::Quick, DishCategory::Side).unwrap(),
        ];
        let mut menu = WorkingMenu::new();
        menu.push(MenuEntry::new("Carbonara", DishCategory::Main));
        menu.push(MenuEntry::new("Salad", DishCategory::Side));
        MenuPlanDocument::build(&menu, &catalog, 5, DisplayPrecision::Whole).unwrap()
    }

    #[test]
    fn markdown_lists_scaled_dishes_and_shopping_list() {
        let md = render_markdown(&plan());
        assert!(md.starts_with("# Menu plan for 5 persons"));
        assert!(md.contains("### 1. Carbonara"));
        assert!(md.contains("- 625 g Spaghetti"));
        // 3 eggs * 5 / 2 = 7.5, shown whole, half away from zero.
        assert!(md.contains("- 8 Eggs"));
        assert!(md.contains("_No ingredients listed._"));
        assert!(md.contains("## Shopping list"));
        assert!(md.contains("- [ ] 625 g Spaghetti"));
    }

    #[test]
    fn text_rendering_has_no_markup() {
        let text = render_text(&plan());
        assert!(!text.contains('#'));
        assert!(text.contains("SHOPPING LIST"));
        assert!(text.contains("[ ] 8 Eggs"));
    }
}
