//! Menu Planner - Conversational weekly menu planning
//!
//! A chat assistant that walks a user through choosing main and side dishes,
//! scales the recipes to a household, and exports the plan with a combined
//! shopping list. Profiles, favorites and in-flight conversations are kept
//! in a pluggable record store.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
