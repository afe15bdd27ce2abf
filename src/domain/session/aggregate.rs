//! Session aggregate - the persisted per-chat conversation state.
//!
//! Everything a turn needs is in here. A worker that has never seen the chat
//! before can pick the conversation up from the stored record alone.

use serde::{Deserialize, Serialize};

use super::stage::{DialogueStage, StageKind};
use crate::domain::catalog::EffortLevel;
use crate::domain::foundation::{ChatId, DomainError, StateMachine, Timestamp, UserId};
use crate::domain::planning::WorkingMenu;

/// Session aggregate, stored under `c:<chat_id>`.
///
/// # Invariants
///
/// - `stage` only changes through `advance`, which enforces the declared edges
/// - `menu` never contains the same dish twice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    chat_id: ChatId,
    user_id: UserId,
    #[serde(default)]
    stage: DialogueStage,
    #[serde(default)]
    pub menu: WorkingMenu,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<EffortLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Session {
    /// Fresh session at the initial stage.
    pub fn new(chat_id: ChatId, user_id: UserId) -> Self {
        Self {
            chat_id,
            user_id,
            stage: DialogueStage::default(),
            menu: WorkingMenu::new(),
            effort: None,
            person_count: None,
            created_at: None,
            updated_at: None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// The user who last spoke in this chat.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn stage(&self) -> &DialogueStage {
        &self.stage
    }

    pub fn kind(&self) -> StageKind {
        self.stage.kind()
    }

    /// True once the user has put anything into the plan. Overlays opened
    /// from a fresh start do not count.
    pub fn has_work_in_progress(&self) -> bool {
        !self.menu.is_empty() || self.stage.resume_point().kind() != StageKind::AwaitingMenuCount
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Group chats may have several speakers; the latest one owns the turn.
    pub fn touch_user(&mut self, user_id: UserId) {
        self.user_id = user_id;
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the edge is not declared by `StageKind`
    pub fn advance(&mut self, next: DialogueStage) -> Result<(), DomainError> {
        self.kind().transition_to(next.kind())?;
        self.stage = next;
        Ok(())
    }

    /// Opens an overlay stage, remembering where to come back to.
    pub fn open_overlay<F>(&mut self, build: F) -> Result<(), DomainError>
    where
        F: FnOnce(Box<DialogueStage>) -> DialogueStage,
    {
        let return_to = Box::new(self.stage.resume_point());
        self.advance(build(return_to))
    }

    /// Leaves an overlay and resumes the stage it was opened from.
    pub fn close_overlay(&mut self) -> Result<(), DomainError> {
        let resume = self.stage.resume_point();
        self.advance(resume)
    }

    /// Drops the plan and returns to the first question.
    pub fn reset_plan(&mut self) {
        self.menu = WorkingMenu::new();
        self.effort = None;
        self.person_count = None;
        self.stage = DialogueStage::default();
    }
}
