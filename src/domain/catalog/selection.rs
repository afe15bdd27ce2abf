//! Randomised dish selection and replacement.
//!
//! Both operations are pure over a catalog snapshot and an injected RNG, so
//! callers decide where randomness comes from (seeded in tests).

use rand::seq::SliceRandom;
use rand::Rng;

use super::dish::{same_dish, Dish, DishFilter};

/// Outcome of drawing dishes from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub dishes: Vec<Dish>,
    pub requested: usize,
}

impl Selection {
    /// How many dishes could not be supplied.
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.dishes.len())
    }

    pub fn is_short(&self) -> bool {
        self.shortfall() > 0
    }

    pub fn names(&self) -> Vec<String> {
        self.dishes.iter().map(|d| d.name.clone()).collect()
    }
}

/// Draws up to `count` distinct dishes that satisfy `filter`.
///
/// Never returns the same dish twice (names compare case-insensitively, so
/// duplicate catalog rows collapse). When fewer eligible dishes exist than
/// requested, all of them are returned and `Selection::shortfall` says by how
/// much the request fell short.
pub fn select_dishes<R: Rng + ?Sized>(
    catalog: &[Dish],
    count: usize,
    filter: &DishFilter,
    rng: &mut R,
) -> Selection {
    let eligible = distinct_eligible(catalog, filter);
    let dishes = eligible
        .choose_multiple(rng, count)
        .map(|d| (*d).clone())
        .collect();

    Selection {
        dishes,
        requested: count,
    }
}

/// Picks a replacement for `current` among dishes of `category`-compatible
/// `filter` that are not already on the menu.
///
/// `on_menu` holds every dish currently in the working list, including the
/// one being replaced, so the replacement can never duplicate an entry.
pub fn find_replacement<R: Rng + ?Sized>(
    catalog: &[Dish],
    on_menu: &[String],
    filter: &DishFilter,
    rng: &mut R,
) -> Option<Dish> {
    let filter = filter.clone().excluding(on_menu.iter().cloned());
    distinct_eligible(catalog, &filter)
        .choose(rng)
        .map(|d| (*d).clone())
}

fn distinct_eligible<'a>(catalog: &'a [Dish], filter: &DishFilter) -> Vec<&'a Dish> {
    let mut eligible: Vec<&Dish> = Vec::new();
    for dish in catalog.iter().filter(|d| filter.matches(d)) {
        if !eligible.iter().any(|seen| same_dish(&seen.name, &dish.name)) {
            eligible.push(dish);
        }
    }
    eligible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{DishCategory, EffortLevel};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn dish(name: &str, effort: EffortLevel, category: DishCategory) -> Dish {
        Dish::new(name, 2, effort, category).unwrap()
    }

    fn catalog() -> Vec<Dish> {
        vec![
            dish("Lasagne", EffortLevel::Elaborate, DishCategory::Main),
            dish("Omelette", EffortLevel::Quick, DishCategory::Main),
            dish("Risotto", EffortLevel::Medium, DishCategory::Main),
            dish("Pancakes", EffortLevel::Quick, DishCategory::Main),
            dish("Green Salad", EffortLevel::Quick, DishCategory::Side),
            dish("Fries", EffortLevel::Medium, DishCategory::Side),
        ]
    }

    #[test]
    fn select_returns_requested_count_when_available() {
        let mut rng = StdRng::seed_from_u64(7);
        let selection = select_dishes(&catalog(), 3, &DishFilter::mains(), &mut rng);
        assert_eq!(selection.dishes.len(), 3);
        assert!(!selection.is_short());
        assert!(selection.dishes.iter().all(|d| d.category == DishCategory::Main));
    }

    #[test]
    fn select_degrades_to_available_count() {
        // Five requested, only the three mains that are not elaborate qualify.
        let mut rng = StdRng::seed_from_u64(1);
        let filter = DishFilter::mains().excluding(["Lasagne"]);
        let selection = select_dishes(&catalog(), 5, &filter, &mut rng);
        assert_eq!(selection.dishes.len(), 3);
        assert_eq!(selection.shortfall(), 2);
    }

    #[test]
    fn select_honours_effort_filter() {
        let mut rng = StdRng::seed_from_u64(3);
        let filter = DishFilter::mains().with_effort(Some(EffortLevel::Quick));
        let selection = select_dishes(&catalog(), 4, &filter, &mut rng);
        let names: HashSet<String> = selection.names().into_iter().collect();
        assert_eq!(
            names,
            HashSet::from(["Omelette".to_string(), "Pancakes".to_string()])
        );
    }

    #[test]
    fn select_collapses_duplicate_catalog_rows() {
        let mut dishes = catalog();
        dishes.push(dish("lasagne", EffortLevel::Elaborate, DishCategory::Main));
        let mut rng = StdRng::seed_from_u64(11);
        let selection = select_dishes(&dishes, 10, &DishFilter::mains(), &mut rng);
        assert_eq!(selection.dishes.len(), 4);
    }

    #[test]
    fn select_from_empty_catalog_is_empty_not_error() {
        let mut rng = StdRng::seed_from_u64(0);
        let selection = select_dishes(&[], 2, &DishFilter::default(), &mut rng);
        assert!(selection.dishes.is_empty());
        assert_eq!(selection.shortfall(), 2);
    }

    #[test]
    fn replacement_avoids_everything_on_the_menu() {
        let mut rng = StdRng::seed_from_u64(5);
        let on_menu = vec!["Lasagne".to_string(), "Omelette".to_string(), "Risotto".to_string()];
        let replacement = find_replacement(&catalog(), &on_menu, &DishFilter::mains(), &mut rng);
        assert_eq!(replacement.map(|d| d.name), Some("Pancakes".to_string()));
    }

    #[test]
    fn replacement_is_none_when_catalog_exhausted() {
        let mut rng = StdRng::seed_from_u64(5);
        let on_menu = vec!["Green Salad".to_string(), "Fries".to_string()];
        assert!(find_replacement(&catalog(), &on_menu, &DishFilter::sides(), &mut rng).is_none());
    }

    proptest! {
        #[test]
        fn selection_is_distinct_and_bounded(
            names in proptest::collection::vec("[a-e]{1,2}", 0..20),
            count in 0usize..12,
            seed in any::<u64>(),
        ) {
            let dishes: Vec<Dish> = names
                .iter()
                .map(|n| dish(n, EffortLevel::Quick, DishCategory::Main))
                .collect();
            let distinct: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
            let mut rng = StdRng::seed_from_u64(seed);

            let selection = select_dishes(&dishes, count, &DishFilter::default(), &mut rng);

            let picked: HashSet<String> = selection.dishes.iter().map(|d| d.name.to_lowercase()).collect();
            prop_assert_eq!(picked.len(), selection.dishes.len());
            prop_assert_eq!(selection.dishes.len(), count.min(distinct.len()));
        }
    }
}
