//! Reply builders for every stage. Pure: no I/O, no session mutation.

use crate::domain::catalog::{same_dish, DishCategory, EffortLevel};
use crate::domain::conversation::{Action, Button, Reply};
use crate::domain::favorites::Favorites;
use crate::domain::planning::{plural_persons, DisplayPrecision, ExportFormat, ScaledDish, WorkingMenu};
use crate::domain::profile::{Profile, ScalingPreference, MAX_HOUSEHOLD_SIZE};
use crate::domain::session::PersonCountMode;

pub const MAX_MENU_COUNT: u8 = 7;
pub const MAX_PERSONS: u32 = MAX_HOUSEHOLD_SIZE;
const PRESET_PERSONS: [u32; 6] = [1, 2, 3, 4, 5, 6];

pub const NOT_UNDERSTOOD: &str = "Sorry, I didn't get that.";

pub fn greeting() -> &'static str {
    "Hi! I'll help you plan this week's menu and build the shopping list."
}

pub fn help() -> &'static str {
    "Commands:\n\
     /start - plan a new menu\n\
     /quick - plan a single dish\n\
     /favorites - manage your favorite dishes\n\
     /profile - household size and rounding\n\
     /restart - throw the current plan away"
}

pub fn menu_count() -> Reply {
    let buttons = (1..=MAX_MENU_COUNT)
        .map(|n| Button::new(n.to_string(), Action::MenuCount(n)))
        .collect();
    Reply::text("How many main dishes should the menu have?").grid(buttons, 4)
}

pub fn effort(menu_count: u8) -> Reply {
    let mut buttons: Vec<Button> = EffortLevel::ALL
        .iter()
        .map(|level| Button::new(level.label(), Action::Effort(Some(*level))))
        .collect();
    buttons.push(Button::new("Anything goes", Action::Effort(None)));
    Reply::text(format!(
        "{} main {}. How much effort may they take?",
        menu_count,
        if menu_count == 1 { "dish" } else { "dishes" }
    ))
    .grid(buttons, 2)
    .button("« Back", Action::Back)
}

pub fn dish_selection(menu: &WorkingMenu, menu_count: u8, proposals: &[String]) -> Reply {
    let chosen: Vec<String> = menu.mains().map(|e| e.dish.clone()).collect();
    let mut text = format!("Pick your main dishes ({} of {} chosen).", chosen.len(), menu_count);
    if !chosen.is_empty() {
        text.push_str(&format!("\nOn the menu: {}", chosen.join(", ")));
    }
    if proposals.is_empty() {
        text.push_str("\nNo more suggestions. Reshuffle or type a dish name.");
    }

    let mut reply = Reply::text(text);
    for name in proposals {
        reply = reply.button(name.clone(), Action::PickDish(name.clone()));
    }
    if !proposals.is_empty() {
        reply = reply.button("Take all", Action::TakeAll);
    }
    reply = reply.row(vec![
        Button::new("🔀 Reshuffle", Action::Reshuffle),
        Button::new("⭐ From favorites", Action::FromFavorites),
    ]);
    if !chosen.is_empty() {
        reply = reply.button("Continue with these", Action::Done);
    }
    reply.button("« Back", Action::Back)
}

pub fn side_selection(menu: &WorkingMenu, proposals: &[String]) -> Reply {
    if proposals.is_empty() {
        return Reply::text("No side dishes available. Let's look at the menu.")
            .button("Continue", Action::Done);
    }
    let mut reply = Reply::text("Any side dishes? Tap to add or remove.");
    for name in proposals {
        let label = if menu.sides().any(|e| same_dish(&e.dish, name)) {
            format!("✓ {}", name)
        } else {
            name.clone()
        };
        reply = reply.button(label, Action::ToggleSide(name.clone()));
    }
    reply.button("Done", Action::Done)
}

/// Numbered menu listing, `(x2)` for dishes cooked twice.
pub fn menu_listing(menu: &WorkingMenu) -> String {
    menu.entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let side = match entry.category {
                DishCategory::Side => " (side)",
                DishCategory::Main => "",
            };
            if entry.multiplicity > 1 {
                format!("{}. {}{} (x{})", i + 1, entry.dish, side, entry.multiplicity)
            } else {
                format!("{}. {}{}", i + 1, entry.dish, side)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn final_list(menu: &WorkingMenu) -> Reply {
    let twice = menu
        .entries()
        .iter()
        .enumerate()
        .map(|(i, _)| Button::new(format!("2× #{}", i + 1), Action::Twice(i)))
        .collect();
    Reply::text(format!(
        "Your menu:\n{}\n\nTap 2× to cook a dish twice.",
        menu_listing(menu)
    ))
    .grid(twice, 4)
    .row(vec![
        Button::new("✅ Confirm", Action::Confirm),
        Button::new("🔁 Swap a dish", Action::Swap),
    ])
    .button("« Back", Action::Back)
}

pub fn swap_select(menu: &WorkingMenu) -> Reply {
    let buttons = menu
        .entries()
        .iter()
        .enumerate()
        .map(|(i, e)| Button::new(format!("{}. {}", i + 1, e.dish), Action::SwapPick(i)))
        .collect();
    Reply::text("Which dish should be replaced?")
        .grid(buttons, 1)
        .button("Cancel", Action::Cancel)
}

pub fn swap_confirm(current: &str, replacement: &str) -> Reply {
    Reply::text(format!("Replace {} with {}?", current, replacement))
        .row(vec![
            Button::new("👍 Yes", Action::SwapAccept),
            Button::new("Another one", Action::SwapNext),
        ])
        .button("Cancel", Action::Cancel)
}

pub fn person_count(mode: PersonCountMode, profile: Option<&Profile>) -> Reply {
    if mode == PersonCountMode::Manual {
        return Reply::text(format!("Type the number of persons (1-{}).", MAX_PERSONS))
            .button("« Back", Action::Back);
    }
    let presets = PRESET_PERSONS
        .iter()
        .map(|n| Button::new(n.to_string(), Action::Persons(*n)))
        .collect();
    let reply = Reply::text("For how many persons?")
        .grid(presets, 3)
        .button("Other number", Action::PersonsManual);
    let reply = match profile {
        Some(profile) => reply.button(format!("👤 {}", profile.label()), Action::PersonsProfile),
        None => reply.button("👤 Create a profile", Action::OpenProfile),
    };
    reply.button("« Back", Action::Back)
}

pub fn recipe(
    dish: &ScaledDish,
    position: usize,
    total: usize,
    precision: DisplayPrecision,
    description: Option<&str>,
) -> Reply {
    let mut text = format!("{}/{} · {}", position + 1, total, dish.name);
    if dish.multiplicity > 1 {
        text.push_str(&format!(" (x{})", dish.multiplicity));
    }
    text.push_str(&format!("\nFor {}", plural_persons(dish.persons)));
    if let Some(description) = description {
        text.push_str(&format!("\n\n{}", description));
    }
    text.push('\n');
    if dish.ingredients.is_empty() {
        text.push_str("\nNo ingredients listed.");
    }
    for ingredient in &dish.ingredients {
        text.push_str(&format!("\n• {}", ingredient.display(precision)));
    }

    let mut nav = Vec::new();
    if position > 0 {
        nav.push(Button::new("‹ Previous", Action::Prev));
    }
    if position + 1 < total {
        nav.push(Button::new("Next ›", Action::Next));
    }
    Reply::text(text)
        .row(nav)
        .button("📄 Export", Action::Export)
        .button("« Back", Action::Back)
}

pub fn export_formats(formats: &[ExportFormat], save_favorites: bool) -> Reply {
    let buttons = formats
        .iter()
        .map(|f| Button::new(f.label(), Action::Format(*f)))
        .collect();
    let toggle = if save_favorites {
        "☑ Save dishes to favorites"
    } else {
        "☐ Save dishes to favorites"
    };
    Reply::text("Which format would you like?")
        .grid(buttons, 2)
        .button(toggle, Action::ToggleSaveFavorites)
        .button("« Back", Action::Back)
}

pub fn exported() -> Reply {
    Reply::text("Here is your menu plan. Enjoy cooking! Send /start to plan the next one.")
}

pub fn favorites_overview(favorites: &Favorites) -> Reply {
    let text = if favorites.is_empty() {
        "You have no favorites yet.".to_string()
    } else {
        let list = favorites
            .dishes()
            .iter()
            .map(|d| format!("⭐ {}", d))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Your favorites:\n{}", list)
    };
    let mut row = vec![Button::new("➕ Add", Action::FavAdd)];
    if !favorites.is_empty() {
        row.push(Button::new("➖ Remove", Action::FavDelete));
    }
    Reply::text(text).row(row).button("« Back", Action::Back)
}

pub fn favorites_delete(favorites: &Favorites) -> Reply {
    let buttons = favorites
        .dishes()
        .iter()
        .map(|d| Button::new(d.clone(), Action::FavPickDelete(d.clone())))
        .collect();
    Reply::text("Which favorite should go?")
        .grid(buttons, 2)
        .button("« Back", Action::Back)
}

pub fn favorites_add(candidates: &[String]) -> Reply {
    let buttons = candidates
        .iter()
        .map(|d| Button::new(d.clone(), Action::FavPickAdd(d.clone())))
        .collect();
    Reply::text("Tap a dish to add it, or type any dish name.")
        .grid(buttons, 2)
        .button("« Back", Action::Back)
}

pub fn profile_select(profile: Option<&Profile>) -> Reply {
    match profile {
        Some(profile) => Reply::text(format!(
            "Your profile: {}, {} amounts.",
            profile.label(),
            profile.scaling.as_str()
        ))
        .row(vec![
            Button::new("Use it", Action::ProfileUse),
            Button::new("Create new", Action::ProfileNew),
        ])
        .button("« Back", Action::Back),
        None => Reply::text("You don't have a profile yet.")
            .button("Create profile", Action::ProfileNew)
            .button("« Back", Action::Back),
    }
}

pub fn profile_name() -> Reply {
    Reply::text("What should the profile be called? (e.g. Home)").button("Cancel", Action::Cancel)
}

pub fn profile_household(name: &str) -> Reply {
    let presets = PRESET_PERSONS
        .iter()
        .map(|n| Button::new(n.to_string(), Action::Persons(*n)))
        .collect();
    Reply::text(format!(
        "How many people does {} cook for? Tap or type 1-{}.",
        name, MAX_PERSONS
    ))
    .grid(presets, 3)
    .button("Cancel", Action::Cancel)
}

pub fn profile_scaling() -> Reply {
    Reply::text("How should amounts be shown?")
        .button(
            "Exact (312.5 g)",
            Action::Scaling(ScalingPreference::Exact),
        )
        .button(
            "Rounded (313 g)",
            Action::Scaling(ScalingPreference::Rounded),
        )
        .button("Cancel", Action::Cancel)
}

pub fn quick_start() -> Reply {
    Reply::text("Just one dish? Type its name or let me pick one.")
        .button("🎲 Surprise me", Action::QuickRandom)
        .button("Cancel", Action::Cancel)
}

pub fn quick_confirm(dish: &str) -> Reply {
    Reply::text(format!("How about {}?", dish))
        .row(vec![
            Button::new("👍 Yes", Action::QuickAccept),
            Button::new("Another one", Action::QuickNext),
        ])
        .button("Cancel", Action::Cancel)
}

pub fn confirm_restart() -> Reply {
    Reply::text("Start over? Your current plan will be lost.").row(vec![
        Button::new("Yes, start over", Action::RestartYes),
        Button::new("No, keep it", Action::RestartNo),
    ])
}

/// Offered when the recipe catalog could not be read. `retry` repeats the
/// request that failed.
pub fn catalog_unavailable(retry: Action) -> Reply {
    Reply::text("I can't reach the recipe collection right now. Nothing was changed.")
        .button("Try again", retry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::planning::MenuEntry;

    #[test]
    fn menu_count_offers_every_allowed_count() {
        let reply = menu_count();
        for n in 1..=MAX_MENU_COUNT {
            assert!(reply.offers(&Action::MenuCount(n)));
        }
        assert!(!reply.offers(&Action::MenuCount(MAX_MENU_COUNT + 1)));
    }

    #[test]
    fn listing_marks_sides_and_doubles() {
        let mut menu = WorkingMenu::new();
        menu.push(MenuEntry::new("Chili", DishCategory::Main));
        menu.push(MenuEntry::new("Rice", DishCategory::Side));
        menu.toggle_multiplicity(0);
        assert_eq!(menu_listing(&menu), "1. Chili (x2)\n2. Rice (side)");
    }

    #[test]
    fn person_prompt_offers_profile_shortcut_only_with_profile() {
        let profile = Profile::new(4, ScalingPreference::Rounded).unwrap();
        assert!(person_count(PersonCountMode::Templated, Some(&profile)).offers(&Action::PersonsProfile));
        let without = person_count(PersonCountMode::Templated, None);
        assert!(!without.offers(&Action::PersonsProfile));
        assert!(without.offers(&Action::OpenProfile));
    }

    #[test]
    fn recipe_navigation_depends_on_position() {
        let dish = ScaledDish {
            name: "Chili".into(),
            persons: 4,
            multiplicity: 1,
            ingredients: vec![],
        };
        let first = recipe(&dish, 0, 2, DisplayPrecision::Whole, None);
        assert!(!first.offers(&Action::Prev));
        assert!(first.offers(&Action::Next));
        let last = recipe(&dish, 1, 2, DisplayPrecision::Whole, Some("Smoky."));
        assert!(last.offers(&Action::Prev));
        assert!(!last.offers(&Action::Next));
        assert!(last.text.contains("Smoky."));
    }

    #[test]
    fn side_selection_marks_chosen_sides() {
        let mut menu = WorkingMenu::new();
        menu.push(MenuEntry::new("Rice", DishCategory::Side));
        let reply = side_selection(&menu, &["Rice".to_string(), "Salad".to_string()]);
        let labels: Vec<_> = reply.buttons().map(|b| b.label.as_str()).collect();
        assert!(labels.contains(&"✓ Rice"));
        assert!(labels.contains(&"Salad"));
    }
}
