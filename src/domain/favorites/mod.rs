//! Favorites record - per-user set of liked dishes, kept in insertion order.

use serde::{Deserialize, Serialize};

use crate::domain::catalog::same_dish;
use crate::domain::foundation::Timestamp;

/// Stored per user under `u:<id>`.
///
/// # Invariants
///
/// - no two entries name the same dish (case-insensitive)
/// - entries keep the order in which they were first added
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorites {
    #[serde(default, deserialize_with = "dedup_on_read")]
    dishes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Favorites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from arbitrary names, dropping later duplicates.
    pub fn from_dishes<I, S>(dishes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut favorites = Self::new();
        favorites.replace_all(dishes);
        favorites
    }

    pub fn dishes(&self) -> &[String] {
        &self.dishes
    }

    pub fn len(&self) -> usize {
        self.dishes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dishes.is_empty()
    }

    pub fn contains(&self, dish: &str) -> bool {
        self.dishes.iter().any(|d| same_dish(d, dish))
    }

    /// Adds a dish. A duplicate (or blank name) is a no-op; returns whether
    /// the list changed.
    pub fn add(&mut self, dish: &str) -> bool {
        let dish = dish.trim();
        if dish.is_empty() || self.contains(dish) {
            return false;
        }
        self.dishes.push(dish.to_string());
        true
    }

    /// Removes a dish; returns whether it was present.
    pub fn remove(&mut self, dish: &str) -> bool {
        let before = self.dishes.len();
        self.dishes.retain(|d| !same_dish(d, dish));
        self.dishes.len() != before
    }

    /// Overwrites the whole list, keeping the first occurrence of each dish.
    pub fn replace_all<I, S>(&mut self, dishes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dishes.clear();
        for dish in dishes {
            self.add(&dish.into());
        }
    }
}

fn dedup_on_read<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(Favorites::from_dishes(raw).dishes)
}
