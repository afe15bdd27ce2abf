//! Dialogue stages.
//!
//! `DialogueStage` is what gets persisted: each variant carries exactly the
//! data its step needs. `StageKind` is the data-free shadow used to declare
//! legal transitions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// How the person count is being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PersonCountMode {
    /// Preset buttons (plus profile shortcut when one exists).
    #[default]
    Templated,
    /// Free-text number entry.
    Manual,
}

/// Two-step swap: pick the dish, then accept a proposed replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum SwapStep {
    SelectTarget,
    Confirm { index: usize, replacement: String },
}

/// Sub-views of the favorites manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum FavoritesView {
    Overview,
    DeleteSelect,
    AddSelect { candidates: Vec<String> },
}

/// Profile selection and the three-step creation wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ProfileStep {
    Select,
    EnterName,
    EnterHouseholdSize { name: String },
    ChooseScaling { name: String, household_size: u32 },
}

/// Single-dish shortcut flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum QuickStep {
    Start,
    Confirm { dish: String },
}

/// Where a chat currently is in the menu dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum DialogueStage {
    #[default]
    AwaitingMenuCount,
    AwaitingEffortLevel {
        menu_count: u8,
    },
    SelectingDishes {
        menu_count: u8,
        #[serde(default)]
        proposals: Vec<String>,
    },
    SelectingSideDishes {
        #[serde(default)]
        proposals: Vec<String>,
    },
    ConfirmingFinalList,
    AwaitingPersonCount {
        #[serde(default)]
        mode: PersonCountMode,
    },
    ReviewingRecipe {
        #[serde(default)]
        index: usize,
    },
    SwappingDish {
        step: SwapStep,
    },
    ChoosingExportFormat {
        #[serde(default)]
        save_favorites: bool,
    },
    ManagingFavorites {
        view: FavoritesView,
        return_to: Box<DialogueStage>,
    },
    ChoosingProfile {
        step: ProfileStep,
        return_to: Box<DialogueStage>,
    },
    QuickDish {
        step: QuickStep,
    },
    ConfirmingRestart {
        return_to: Box<DialogueStage>,
    },
}

impl DialogueStage {
    pub fn kind(&self) -> StageKind {
        match self {
            DialogueStage::AwaitingMenuCount => StageKind::AwaitingMenuCount,
            DialogueStage::AwaitingEffortLevel { .. } => StageKind::AwaitingEffortLevel,
            DialogueStage::SelectingDishes { .. } => StageKind::SelectingDishes,
            DialogueStage::SelectingSideDishes { .. } => StageKind::SelectingSideDishes,
            DialogueStage::ConfirmingFinalList => StageKind::ConfirmingFinalList,
            DialogueStage::AwaitingPersonCount { .. } => StageKind::AwaitingPersonCount,
            DialogueStage::ReviewingRecipe { .. } => StageKind::ReviewingRecipe,
            DialogueStage::SwappingDish { .. } => StageKind::SwappingDish,
            DialogueStage::ChoosingExportFormat { .. } => StageKind::ChoosingExportFormat,
            DialogueStage::ManagingFavorites { .. } => StageKind::ManagingFavorites,
            DialogueStage::ChoosingProfile { .. } => StageKind::ChoosingProfile,
            DialogueStage::QuickDish { .. } => StageKind::QuickDish,
            DialogueStage::ConfirmingRestart { .. } => StageKind::ConfirmingRestart,
        }
    }

    /// The stage an overlay (favorites, profile, restart prompt) returns to.
    ///
    /// For non-overlay stages this is the stage itself, so opening an overlay
    /// from inside another overlay still returns to the underlying flow.
    pub fn resume_point(&self) -> DialogueStage {
        match self {
            DialogueStage::ManagingFavorites { return_to, .. }
            | DialogueStage::ChoosingProfile { return_to, .. }
            | DialogueStage::ConfirmingRestart { return_to } => (**return_to).clone(),
            other => other.clone(),
        }
    }
}

/// Data-free mirror of `DialogueStage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    AwaitingMenuCount,
    AwaitingEffortLevel,
    SelectingDishes,
    SelectingSideDishes,
    ConfirmingFinalList,
    AwaitingPersonCount,
    ReviewingRecipe,
    SwappingDish,
    ChoosingExportFormat,
    ManagingFavorites,
    ChoosingProfile,
    QuickDish,
    ConfirmingRestart,
}

impl StageKind {
    pub const ALL: [StageKind; 13] = [
        StageKind::AwaitingMenuCount,
        StageKind::AwaitingEffortLevel,
        StageKind::SelectingDishes,
        StageKind::SelectingSideDishes,
        StageKind::ConfirmingFinalList,
        StageKind::AwaitingPersonCount,
        StageKind::ReviewingRecipe,
        StageKind::SwappingDish,
        StageKind::ChoosingExportFormat,
        StageKind::ManagingFavorites,
        StageKind::ChoosingProfile,
        StageKind::QuickDish,
        StageKind::ConfirmingRestart,
    ];

    /// Stages reachable from anywhere through a global command.
    pub const GLOBAL_ENTRY: [StageKind; 4] = [
        StageKind::ManagingFavorites,
        StageKind::ChoosingProfile,
        StageKind::QuickDish,
        StageKind::ConfirmingRestart,
    ];

    /// Overlays remember a `return_to` stage and may resume any of them.
    pub fn is_overlay(&self) -> bool {
        matches!(
            self,
            StageKind::ManagingFavorites | StageKind::ChoosingProfile | StageKind::ConfirmingRestart
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::AwaitingMenuCount => "awaiting_menu_count",
            StageKind::AwaitingEffortLevel => "awaiting_effort_level",
            StageKind::SelectingDishes => "selecting_dishes",
            StageKind::SelectingSideDishes => "selecting_side_dishes",
            StageKind::ConfirmingFinalList => "confirming_final_list",
            StageKind::AwaitingPersonCount => "awaiting_person_count",
            StageKind::ReviewingRecipe => "reviewing_recipe",
            StageKind::SwappingDish => "swapping_dish",
            StageKind::ChoosingExportFormat => "choosing_export_format",
            StageKind::ManagingFavorites => "managing_favorites",
            StageKind::ChoosingProfile => "choosing_profile",
            StageKind::QuickDish => "quick_dish",
            StageKind::ConfirmingRestart => "confirming_restart",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for StageKind {
    fn valid_transitions(&self) -> Vec<Self> {
        use StageKind::*;
        if self.is_overlay() {
            return StageKind::ALL.to_vec();
        }
        let mut targets = match self {
            AwaitingMenuCount => vec![AwaitingMenuCount, AwaitingEffortLevel],
            AwaitingEffortLevel => vec![AwaitingMenuCount, SelectingDishes],
            SelectingDishes => vec![AwaitingEffortLevel, SelectingDishes, SelectingSideDishes],
            SelectingSideDishes => vec![SelectingSideDishes, ConfirmingFinalList],
            ConfirmingFinalList => vec![
                SelectingSideDishes,
                ConfirmingFinalList,
                SwappingDish,
                AwaitingPersonCount,
            ],
            SwappingDish => vec![SwappingDish, ConfirmingFinalList],
            AwaitingPersonCount => vec![AwaitingPersonCount, ConfirmingFinalList, ReviewingRecipe],
            ReviewingRecipe => vec![AwaitingPersonCount, ReviewingRecipe, ChoosingExportFormat],
            ChoosingExportFormat => vec![ReviewingRecipe, ChoosingExportFormat],
            QuickDish => vec![AwaitingMenuCount, AwaitingPersonCount],
            ManagingFavorites | ChoosingProfile | ConfirmingRestart => vec![],
        };
        for entry in StageKind::GLOBAL_ENTRY {
            if !targets.contains(&entry) {
                targets.push(entry);
            }
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stage_is_awaiting_menu_count() {
        assert_eq!(DialogueStage::default().kind(), StageKind::AwaitingMenuCount);
    }

    #[test]
    fn stage_serializes_with_tag_and_data() {
        let stage = DialogueStage::SelectingDishes {
            menu_count: 3,
            proposals: vec!["Lasagne".into()],
        };
        let json = serde_json::to_value(&stage).unwrap();
        assert_eq!(json["stage"], "selecting_dishes");
        assert_eq!(json["menu_count"], 3);
        let back: DialogueStage = serde_json::from_value(json).unwrap();
        assert_eq!(back, stage);
    }

    #[test]
    fn nested_overlay_round_trips() {
        let stage = DialogueStage::ChoosingProfile {
            step: ProfileStep::EnterHouseholdSize { name: "Home".into() },
            return_to: Box::new(DialogueStage::AwaitingPersonCount {
                mode: PersonCountMode::Templated,
            }),
        };
        let json = serde_json::to_string(&stage).unwrap();
        let back: DialogueStage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stage);
    }

    #[test]
    fn resume_point_unwraps_overlays() {
        let inner = DialogueStage::ReviewingRecipe { index: 2 };
        let overlay = DialogueStage::ConfirmingRestart {
            return_to: Box::new(inner.clone()),
        };
        assert_eq!(overlay.resume_point(), inner);
        assert_eq!(inner.resume_point(), inner);
    }

    #[test]
    fn forward_flow_edges_are_declared() {
        use StageKind::*;
        let path = [
            AwaitingMenuCount,
            AwaitingEffortLevel,
            SelectingDishes,
            SelectingSideDishes,
            ConfirmingFinalList,
            AwaitingPersonCount,
            ReviewingRecipe,
            ChoosingExportFormat,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(&pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn skipping_ahead_is_rejected() {
        assert!(StageKind::AwaitingMenuCount
            .transition_to(StageKind::ChoosingExportFormat)
            .is_err());
        assert!(!StageKind::SelectingDishes.can_transition_to(&StageKind::ReviewingRecipe));
    }

    #[test]
    fn global_entries_reachable_from_every_stage() {
        for kind in StageKind::ALL {
            for entry in StageKind::GLOBAL_ENTRY {
                assert!(kind.can_transition_to(&entry), "{:?} -> {:?}", kind, entry);
            }
        }
    }

    #[test]
    fn overlays_can_resume_any_stage() {
        for kind in StageKind::ALL {
            assert!(StageKind::ManagingFavorites.can_transition_to(&kind));
        }
        assert!(!StageKind::ConfirmingRestart.is_terminal());
    }
}
