//! Session module - per-chat dialogue state.

mod aggregate;
mod stage;

pub use aggregate::Session;
pub use stage::{
    DialogueStage, FavoritesView, PersonCountMode, ProfileStep, QuickStep, StageKind, SwapStep,
};
