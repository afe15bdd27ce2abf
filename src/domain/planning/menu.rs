//! The working menu: the ordered dish list a chat is assembling.

use serde::{Deserialize, Serialize};

use crate::domain::catalog::{same_dish, DishCategory};
use crate::domain::foundation::{DomainError, ErrorCode};

/// How many times a dish may be cooked within one plan.
pub const MAX_MULTIPLICITY: u32 = 2;

/// One dish reference on the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub dish: String,
    #[serde(default)]
    pub category: DishCategory,
    #[serde(default = "default_multiplicity")]
    pub multiplicity: u32,
}

fn default_multiplicity() -> u32 {
    1
}

impl MenuEntry {
    pub fn new(dish: impl Into<String>, category: DishCategory) -> Self {
        Self {
            dish: dish.into(),
            category,
            multiplicity: 1,
        }
    }
}

/// Ordered dish list with at most one entry per dish.
///
/// # Invariants
///
/// - no two entries name the same dish (case-insensitive)
/// - swaps keep every untouched entry at its position
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkingMenu {
    entries: Vec<MenuEntry>,
}

impl WorkingMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MenuEntry> {
        self.entries.get(index)
    }

    pub fn contains(&self, dish: &str) -> bool {
        self.entries.iter().any(|e| same_dish(&e.dish, dish))
    }

    /// Names of every dish on the menu, in order.
    pub fn dish_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.dish.clone()).collect()
    }

    pub fn count_of(&self, category: DishCategory) -> usize {
        self.entries.iter().filter(|e| e.category == category).count()
    }

    pub fn mains(&self) -> impl Iterator<Item = &MenuEntry> {
        self.entries.iter().filter(|e| e.category == DishCategory::Main)
    }

    pub fn sides(&self) -> impl Iterator<Item = &MenuEntry> {
        self.entries.iter().filter(|e| e.category == DishCategory::Side)
    }

    /// Appends a dish. Returns false (and changes nothing) if it is already listed.
    pub fn push(&mut self, entry: MenuEntry) -> bool {
        if self.contains(&entry.dish) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Removes and returns the entry at `index`.
    pub fn remove(&mut self, index: usize) -> Option<MenuEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Replaces the dish at `index`, keeping its category and multiplicity.
    ///
    /// # Errors
    ///
    /// - `DishNotFound` if `index` is out of bounds
    /// - `DuplicateDish` if `replacement` already sits elsewhere on the menu
    pub fn swap(&mut self, index: usize, replacement: &str) -> Result<String, DomainError> {
        if index >= self.entries.len() {
            return Err(DomainError::new(
                ErrorCode::DishNotFound,
                format!("No dish at position {}", index + 1),
            ));
        }
        let duplicate = self
            .entries
            .iter()
            .enumerate()
            .any(|(i, e)| i != index && same_dish(&e.dish, replacement));
        if duplicate {
            return Err(DomainError::new(
                ErrorCode::DuplicateDish,
                format!("'{}' is already on the menu", replacement),
            )
            .with_detail("dish", replacement));
        }
        Ok(std::mem::replace(
            &mut self.entries[index].dish,
            replacement.to_string(),
        ))
    }

    /// Flips an entry between cooking once and cooking twice.
    pub fn toggle_multiplicity(&mut self, index: usize) -> Option<u32> {
        let entry = self.entries.get_mut(index)?;
        entry.multiplicity = if entry.multiplicity >= MAX_MULTIPLICITY {
            1
        } else {
            entry.multiplicity + 1
        };
        Some(entry.multiplicity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn menu(names: &[&str]) -> WorkingMenu {
        let mut menu = WorkingMenu::new();
        for name in names {
            menu.push(MenuEntry::new(*name, DishCategory::Main));
        }
        menu
    }

    #[test]
    fn push_ignores_duplicates_case_insensitively() {
        let mut menu = menu(&["Lasagne"]);
        assert!(!menu.push(MenuEntry::new("lasagne", DishCategory::Main)));
        assert_eq!(menu.len(), 1);
    }

    #[test]
    fn swap_replaces_in_place() {
        let mut menu = menu(&["Lasagne", "Risotto", "Omelette"]);
        let old = menu.swap(1, "Curry").unwrap();
        assert_eq!(old, "Risotto");
        assert_eq!(menu.dish_names(), vec!["Lasagne", "Curry", "Omelette"]);
    }

    #[test]
    fn swap_rejects_dish_present_elsewhere() {
        let mut menu = menu(&["Lasagne", "Risotto"]);
        let err = menu.swap(0, "RISOTTO").unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateDish);
        assert_eq!(menu.dish_names(), vec!["Lasagne", "Risotto"]);
    }

    #[test]
    fn swap_out_of_bounds_is_not_found() {
        let mut menu = menu(&["Lasagne"]);
        assert_eq!(menu.swap(3, "Curry").unwrap_err().code, ErrorCode::DishNotFound);
    }

    #[test]
    fn toggle_multiplicity_cycles_between_one_and_two() {
        let mut menu = menu(&["Lasagne"]);
        assert_eq!(menu.toggle_multiplicity(0), Some(2));
        assert_eq!(menu.toggle_multiplicity(0), Some(1));
        assert_eq!(menu.toggle_multiplicity(5), None);
    }

    #[test]
    fn serializes_as_plain_list() {
        let json = serde_json::to_value(menu(&["Lasagne"])).unwrap();
        assert!(json.is_array());
        let back: WorkingMenu =
            serde_json::from_str(r#"[{"dish":"Lasagne"}]"#).unwrap();
        assert_eq!(back.get(0).unwrap().multiplicity, 1);
    }

    proptest! {
        #[test]
        fn swap_preserves_untouched_positions_and_uniqueness(
            names in proptest::collection::hash_set("[a-h]{1,3}", 1..8),
            replacement in "[a-h]{1,3}",
            pick in any::<prop::sample::Index>(),
        ) {
            let names: Vec<String> = names.into_iter().collect();
            let mut menu = WorkingMenu::new();
            for name in &names {
                menu.push(MenuEntry::new(name.clone(), DishCategory::Main));
            }
            let before = menu.dish_names();
            let index = pick.index(before.len());

            let result = menu.swap(index, &replacement);
            let after = menu.dish_names();

            for (i, name) in before.iter().enumerate() {
                if i != index {
                    prop_assert_eq!(&after[i], name);
                }
            }
            let unique: HashSet<String> = after.iter().map(|n| n.to_lowercase()).collect();
            prop_assert_eq!(unique.len(), after.len());
            if result.is_err() {
                prop_assert_eq!(after, before);
            }
        }
    }
}
