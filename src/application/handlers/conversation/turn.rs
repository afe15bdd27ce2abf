//! Turn handler - one inbound event in, one reply out.
//!
//! A turn loads the chat's session, lets the current stage interpret the
//! input, writes the session back (or deletes it when the flow is finished)
//! and returns the reply. Turns for the same chat are serialised through a
//! per-chat lock; turns for different chats run independently.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use super::errors::TurnError;
use super::prompts;
use crate::application::PersistenceStore;
use crate::domain::catalog::{Dish, DishFilter};
use crate::domain::conversation::{Action, Command, Inbound, Reply, UserInput};
use crate::domain::favorites::Favorites;
use crate::domain::foundation::{ChatId, UserId};
use crate::domain::planning::DisplayPrecision;
use crate::domain::profile::Profile;
use crate::domain::session::{DialogueStage, QuickStep, Session, StageKind, SwapStep};
use crate::ports::{CatalogError, CatalogSource, DishDescriber, MenuExporter, RecordStore, StoreError};

/// What a flow decided: the reply, and whether the session is finished.
pub(super) struct Outcome {
    pub reply: Reply,
    pub end_session: bool,
}

impl Outcome {
    /// Reply and drop the stored session.
    pub fn end(reply: Reply) -> Self {
        Self {
            reply,
            end_session: true,
        }
    }
}

impl From<Reply> for Outcome {
    fn from(reply: Reply) -> Self {
        Self {
            reply,
            end_session: false,
        }
    }
}

/// The button that repeats a failed request.
pub(super) fn retry_action(input: &UserInput) -> Action {
    match input {
        UserInput::Action(action) => action.clone(),
        _ => Action::Retry,
    }
}

pub struct TurnHandler {
    pub(super) store: PersistenceStore,
    pub(super) catalog: Arc<dyn CatalogSource>,
    pub(super) exporter: Arc<dyn MenuExporter>,
    pub(super) describer: Option<Arc<dyn DishDescriber>>,
    rng: StdMutex<StdRng>,
    chat_locks: Mutex<HashMap<ChatId, Arc<Mutex<()>>>>,
}

impl TurnHandler {
    pub fn new(
        store: Arc<dyn RecordStore>,
        catalog: Arc<dyn CatalogSource>,
        exporter: Arc<dyn MenuExporter>,
    ) -> Self {
        Self {
            store: PersistenceStore::new(store),
            catalog,
            exporter,
            describer: None,
            rng: StdMutex::new(StdRng::from_entropy()),
            chat_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Enables dish descriptions on the recipe view.
    pub fn with_describer(mut self, describer: Arc<dyn DishDescriber>) -> Self {
        self.describer = Some(describer);
        self
    }

    /// Makes dish draws reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdMutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn persistence(&self) -> &PersistenceStore {
        &self.store
    }

    /// Handles one inbound event.
    ///
    /// # Errors
    ///
    /// - `StorageUnavailable` if the session could not be read or written;
    ///   the stored session is left as it was before the turn
    pub async fn handle(&self, inbound: Inbound) -> Result<Reply, TurnError> {
        let turn_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "turn",
            chat_id = %inbound.chat_id,
            user_id = %inbound.user_id,
            %turn_id
        );
        self.handle_turn(inbound).instrument(span).await
    }

    async fn handle_turn(&self, inbound: Inbound) -> Result<Reply, TurnError> {
        let lock = self.chat_lock(inbound.chat_id).await;
        let _guard = lock.lock().await;

        let (mut session, stored) = self.load_session(&inbound).await?;
        let before = session.clone();
        session.touch_user(inbound.user_id);

        let input = UserInput::from_event(&inbound.event);
        tracing::debug!(stage = %session.kind(), input = %input.log_label(), "Handling input");

        let outcome = self.dispatch(&mut session, &input).await?;

        if outcome.end_session {
            self.store.delete_session(&inbound.chat_id).await?;
            tracing::info!(stage = %before.kind(), "Session finished");
        } else if !stored || session != before {
            self.store.set_session(&session).await?;
            if before.kind() != session.kind() {
                tracing::info!(from = %before.kind(), to = %session.kind(), "Stage changed");
            }
        }
        Ok(outcome.reply)
    }

    /// Lock for one chat. Idle entries are pruned on every lookup.
    async fn chat_lock(&self, chat_id: ChatId) -> Arc<Mutex<()>> {
        let mut locks = self.chat_locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(chat_id).or_default().clone()
    }

    /// Returns the session and whether it came from the store.
    async fn load_session(&self, inbound: &Inbound) -> Result<(Session, bool), TurnError> {
        match self.store.get_session(&inbound.chat_id).await {
            Ok(Some(session)) => Ok((session, true)),
            Ok(None) => Ok((Session::new(inbound.chat_id, inbound.user_id), false)),
            Err(StoreError::Corrupt { reason, .. }) => {
                tracing::warn!(%reason, "Stored session unreadable, starting fresh");
                Ok((Session::new(inbound.chat_id, inbound.user_id), false))
            }
            Err(err) => {
                tracing::error!(error = %err, "Could not load session");
                Err(err.into())
            }
        }
    }

    async fn dispatch(&self, session: &mut Session, input: &UserInput) -> Result<Outcome, TurnError> {
        if let UserInput::Command(command) = input {
            return self.on_command(session, *command).await;
        }
        if matches!(input, UserInput::Action(Action::Retry)) {
            return Ok(self.render_stage(session).await?.into());
        }

        match session.kind() {
            StageKind::AwaitingMenuCount => self.on_menu_count(session, input).await,
            StageKind::AwaitingEffortLevel => self.on_effort(session, input).await,
            StageKind::SelectingDishes => self.on_dish_selection(session, input).await,
            StageKind::SelectingSideDishes => self.on_side_selection(session, input).await,
            StageKind::ConfirmingFinalList => self.on_final_list(session, input).await,
            StageKind::SwappingDish => self.on_swap(session, input).await,
            StageKind::AwaitingPersonCount => self.on_person_count(session, input).await,
            StageKind::ReviewingRecipe => self.on_recipe(session, input).await,
            StageKind::ChoosingExportFormat => self.on_export(session, input).await,
            StageKind::ManagingFavorites => self.on_favorites(session, input).await,
            StageKind::ChoosingProfile => self.on_profile(session, input).await,
            StageKind::QuickDish => self.on_quick(session, input).await,
            StageKind::ConfirmingRestart => self.on_restart(session, input).await,
        }
    }

    async fn on_command(&self, session: &mut Session, command: Command) -> Result<Outcome, TurnError> {
        match command {
            Command::Start | Command::Restart => {
                if session.has_work_in_progress() {
                    session.open_overlay(|return_to| DialogueStage::ConfirmingRestart { return_to })?;
                    return Ok(prompts::confirm_restart().into());
                }
                session.reset_plan();
                let reply = prompts::menu_count();
                Ok(match command {
                    Command::Start => reply.prepend(prompts::greeting()),
                    _ => reply,
                }
                .into())
            }
            Command::Favorites => self.open_favorites(session).await,
            Command::Profile => self.open_profile(session).await,
            Command::Quick => self.start_quick(session),
            Command::Help => Ok(self.render_stage(session).await?.prepend(prompts::help()).into()),
        }
    }

    async fn on_restart(&self, session: &mut Session, input: &UserInput) -> Result<Outcome, TurnError> {
        match input {
            UserInput::Action(Action::RestartYes) => {
                session.reset_plan();
                Ok(Outcome::end(prompts::menu_count().prepend("Okay, a fresh start.")))
            }
            UserInput::Action(Action::RestartNo | Action::Cancel) => {
                session.close_overlay()?;
                Ok(self.render_stage(session).await?.into())
            }
            _ => self.not_understood(session).await,
        }
    }

    /// The prompt for wherever the session currently is.
    pub(super) async fn render_stage(&self, session: &Session) -> Result<Reply, TurnError> {
        let reply = match session.stage() {
            DialogueStage::AwaitingMenuCount => prompts::menu_count(),
            DialogueStage::AwaitingEffortLevel { menu_count } => prompts::effort(*menu_count),
            DialogueStage::SelectingDishes { menu_count, proposals } => {
                prompts::dish_selection(&session.menu, *menu_count, proposals)
            }
            DialogueStage::SelectingSideDishes { proposals } => {
                prompts::side_selection(&session.menu, proposals)
            }
            DialogueStage::ConfirmingFinalList => prompts::final_list(&session.menu),
            DialogueStage::SwappingDish { step: SwapStep::SelectTarget } => {
                prompts::swap_select(&session.menu)
            }
            DialogueStage::SwappingDish {
                step: SwapStep::Confirm { index, replacement },
            } => {
                let current = session.menu.get(*index).map(|e| e.dish.as_str()).unwrap_or("?");
                prompts::swap_confirm(current, replacement)
            }
            DialogueStage::AwaitingPersonCount { mode } => {
                let profile = self.profile(session.user_id()).await?;
                prompts::person_count(*mode, profile.as_ref())
            }
            DialogueStage::ReviewingRecipe { index } => match self.dishes(None).await {
                Ok(catalog) => self.recipe_view(session, *index, &catalog).await?,
                Err(_) => prompts::catalog_unavailable(Action::Retry),
            },
            DialogueStage::ChoosingExportFormat { save_favorites } => {
                let formats = self.exporter.available_formats().await;
                prompts::export_formats(&formats, *save_favorites)
            }
            DialogueStage::ManagingFavorites { view, .. } => self.favorites_prompt(session, view).await?,
            DialogueStage::ChoosingProfile { step, .. } => self.profile_prompt(session, step).await?,
            DialogueStage::QuickDish { step: QuickStep::Start } => prompts::quick_start(),
            DialogueStage::QuickDish {
                step: QuickStep::Confirm { dish },
            } => prompts::quick_confirm(dish),
            DialogueStage::ConfirmingRestart { .. } => prompts::confirm_restart(),
        };
        Ok(reply)
    }

    /// Re-prompt without changing anything.
    pub(super) async fn not_understood(&self, session: &Session) -> Result<Outcome, TurnError> {
        Ok(self
            .render_stage(session)
            .await?
            .prepend(prompts::NOT_UNDERSTOOD)
            .into())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Collaborator helpers
    // ─────────────────────────────────────────────────────────────────────

    pub(super) async fn dishes(&self, filter: Option<&DishFilter>) -> Result<Vec<Dish>, CatalogError> {
        let result = self.catalog.list_dishes(filter).await;
        if let Err(err) = &result {
            tracing::warn!(source = self.catalog.source_name(), error = %err, "Catalog unavailable");
        }
        result
    }

    /// Runs `f` with the shared RNG. Never hold the RNG across an await.
    pub(super) fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    /// The user's profile. An unreadable record counts as no profile.
    pub(super) async fn profile(&self, user_id: UserId) -> Result<Option<Profile>, TurnError> {
        match self.store.get_profile(&user_id).await {
            Err(StoreError::Corrupt { reason, .. }) => {
                tracing::warn!(%user_id, %reason, "Ignoring unreadable profile");
                Ok(None)
            }
            other => Ok(other?),
        }
    }

    pub(super) async fn precision(&self, user_id: UserId) -> Result<DisplayPrecision, TurnError> {
        Ok(self
            .profile(user_id)
            .await?
            .map(|p| p.scaling)
            .unwrap_or_default()
            .precision())
    }

    /// The user's favorites. An unreadable record counts as empty.
    pub(super) async fn favorites(&self, user_id: UserId) -> Result<Favorites, TurnError> {
        match self.store.get_favorites(&user_id).await {
            Err(StoreError::Corrupt { reason, .. }) => {
                tracing::warn!(%user_id, %reason, "Ignoring unreadable favorites");
                Ok(Favorites::new())
            }
            other => Ok(other?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::foundation::StoreKey;
    use crate::ports::RecordKind;
    use serde_json::json;

    #[tokio::test]
    async fn start_greets_and_asks_for_menu_count() {
        let harness = Harness::new();
        let reply = harness.command("/start").await;
        assert!(reply.text.starts_with(prompts::greeting()));
        assert!(reply.offers(&Action::MenuCount(3)));
        assert_eq!(harness.stage().await, StageKind::AwaitingMenuCount);
    }

    #[tokio::test]
    async fn restart_with_work_in_progress_asks_first() {
        let harness = Harness::new();
        harness.press(Action::MenuCount(2)).await;

        let reply = harness.command("/restart").await;
        assert!(reply.offers(&Action::RestartYes));

        harness.press(Action::RestartNo).await;
        assert_eq!(
            harness.session().await.stage(),
            &DialogueStage::AwaitingEffortLevel { menu_count: 2 }
        );
    }

    #[tokio::test]
    async fn confirmed_restart_deletes_session() {
        let harness = Harness::new();
        harness.build_menu(&["Lasagne"], &[]).await;
        harness.command("/start").await;
        let reply = harness.press(Action::RestartYes).await;

        assert!(reply.offers(&Action::MenuCount(1)));
        let stored = harness.persistence().get_session(&ChatId::new(CHAT)).await.unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn storage_outage_aborts_turn_and_keeps_prior_session() {
        let harness = Harness::new();
        harness.press(Action::MenuCount(2)).await;

        harness.store.set_unavailable(true);
        let err = harness
            .handler
            .handle(Inbound::button(ChatId::new(CHAT), UserId::new(USER), &Action::Effort(None)))
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::StorageUnavailable(_)));
        assert!(err.user_reply().offers(&Action::Retry));

        harness.store.set_unavailable(false);
        assert_eq!(
            harness.session().await.stage(),
            &DialogueStage::AwaitingEffortLevel { menu_count: 2 }
        );
    }

    #[tokio::test]
    async fn unreadable_session_starts_fresh() {
        let harness = Harness::new();
        harness
            .store
            .put_raw(
                RecordKind::Session,
                StoreKey::chat(&ChatId::new(CHAT)),
                json!({"chat_id": CHAT, "user_id": USER, "stage": {"stage": "warp_drive"}}),
            )
            .await;

        harness.say("3").await;
        assert_eq!(
            harness.session().await.stage(),
            &DialogueStage::AwaitingEffortLevel { menu_count: 3 }
        );
    }

    #[tokio::test]
    async fn unrecognised_input_reprompts_without_change() {
        let harness = Harness::new();
        harness.press(Action::MenuCount(2)).await;
        let before = harness.session().await;

        let reply = harness
            .handler
            .handle(Inbound {
                chat_id: ChatId::new(CHAT),
                user_id: UserId::new(USER),
                event: crate::domain::conversation::InboundEvent::Button("legacy_7".into()),
            })
            .await
            .unwrap();
        assert!(reply.text.starts_with(prompts::NOT_UNDERSTOOD));
        assert_eq!(harness.session().await, before);
    }

    #[tokio::test]
    async fn help_keeps_stage() {
        let harness = Harness::new();
        harness.press(Action::MenuCount(2)).await;
        let reply = harness.command("/help").await;
        assert!(reply.text.contains("/favorites"));
        assert!(reply.offers(&Action::Effort(None)));
        assert_eq!(harness.stage().await, StageKind::AwaitingEffortLevel);
    }

    #[tokio::test]
    async fn chats_do_not_share_sessions() {
        let harness = Harness::new();
        harness.press(Action::MenuCount(2)).await;
        harness
            .handler
            .handle(Inbound::text(ChatId::new(CHAT + 1), UserId::new(USER), "5"))
            .await
            .unwrap();

        let other = harness
            .persistence()
            .get_session(&ChatId::new(CHAT + 1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(other.stage(), &DialogueStage::AwaitingEffortLevel { menu_count: 5 });
        assert_eq!(
            harness.session().await.stage(),
            &DialogueStage::AwaitingEffortLevel { menu_count: 2 }
        );
    }

    #[tokio::test]
    async fn concurrent_turns_for_one_chat_are_serialised() {
        let harness = Harness::new();
        let first = harness.press(Action::MenuCount(2));
        let second = harness.press(Action::Effort(None));
        let (_, _) = tokio::join!(first, second);

        // Whichever ran second saw the first one's write.
        let kind = harness.stage().await;
        assert!(
            kind == StageKind::SelectingDishes || kind == StageKind::AwaitingEffortLevel,
            "{:?}",
            kind
        );
        assert!(harness.handler.chat_locks.lock().await.len() <= 1);
    }
}
