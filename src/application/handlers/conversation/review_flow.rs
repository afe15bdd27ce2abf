//! Person count and the scaled recipe walkthrough.

use super::errors::TurnError;
use super::prompts::{self, MAX_PERSONS};
use super::turn::{retry_action, Outcome, TurnHandler};
use crate::domain::catalog::{find_by_name, Dish};
use crate::domain::conversation::{Action, Reply, UserInput};
use crate::domain::planning::ScaledDish;
use crate::domain::session::{DialogueStage, PersonCountMode, Session};

/// Used when a recipe is shown before any person count was chosen.
pub(super) const FALLBACK_PERSONS: u32 = 2;

impl TurnHandler {
    pub(super) async fn on_person_count(
        &self,
        session: &mut Session,
        input: &UserInput,
    ) -> Result<Outcome, TurnError> {
        let persons = match input {
            UserInput::Action(Action::Persons(n)) => *n,
            UserInput::Action(Action::PersonsManual) => {
                session.advance(DialogueStage::AwaitingPersonCount {
                    mode: PersonCountMode::Manual,
                })?;
                return Ok(self.render_stage(session).await?.into());
            }
            UserInput::Action(Action::PersonsProfile) => match self.profile(session.user_id()).await? {
                Some(profile) => profile.household_size,
                None => return self.open_profile(session).await,
            },
            UserInput::Action(Action::OpenProfile) => return self.open_profile(session).await,
            UserInput::Action(Action::Back) => {
                session.advance(DialogueStage::ConfirmingFinalList)?;
                return Ok(prompts::final_list(&session.menu).into());
            }
            UserInput::Text(_) => match input.as_number() {
                Some(n) => n,
                None => return self.not_understood(session).await,
            },
            _ => return self.not_understood(session).await,
        };

        if !(1..=MAX_PERSONS).contains(&persons) {
            return Ok(self
                .render_stage(session)
                .await?
                .prepend(format!("Please pick between 1 and {} persons.", MAX_PERSONS))
                .into());
        }
        self.start_review(session, persons, retry_action(input)).await
    }

    /// Sets the person count and shows the first recipe. The catalog is read
    /// first; on failure nothing changes.
    pub(super) async fn start_review(
        &self,
        session: &mut Session,
        persons: u32,
        retry: Action,
    ) -> Result<Outcome, TurnError> {
        let catalog = match self.dishes(None).await {
            Ok(catalog) => catalog,
            Err(_) => return Ok(prompts::catalog_unavailable(retry).into()),
        };
        session.person_count = Some(persons);
        session.advance(DialogueStage::ReviewingRecipe { index: 0 })?;
        Ok(self.recipe_view(session, 0, &catalog).await?.into())
    }

    pub(super) async fn on_recipe(&self, session: &mut Session, input: &UserInput) -> Result<Outcome, TurnError> {
        let DialogueStage::ReviewingRecipe { index } = *session.stage() else {
            return self.not_understood(session).await;
        };
        let last = session.menu.len().saturating_sub(1);

        let target = match input {
            UserInput::Action(Action::Prev) => index.saturating_sub(1),
            UserInput::Action(Action::Next) => (index + 1).min(last),
            UserInput::Action(Action::Export) => {
                session.advance(DialogueStage::ChoosingExportFormat {
                    save_favorites: false,
                })?;
                return Ok(self.render_stage(session).await?.into());
            }
            UserInput::Action(Action::Back) => {
                session.advance(DialogueStage::AwaitingPersonCount {
                    mode: PersonCountMode::Templated,
                })?;
                return Ok(self.render_stage(session).await?.into());
            }
            _ => return self.not_understood(session).await,
        };

        let catalog = match self.dishes(None).await {
            Ok(catalog) => catalog,
            Err(_) => return Ok(prompts::catalog_unavailable(retry_action(input)).into()),
        };
        session.advance(DialogueStage::ReviewingRecipe { index: target })?;
        Ok(self.recipe_view(session, target, &catalog).await?.into())
    }

    /// One scaled recipe. Enrichment is best effort: a failing describer
    /// only costs the description.
    pub(super) async fn recipe_view(
        &self,
        session: &Session,
        index: usize,
        catalog: &[Dish],
    ) -> Result<Reply, TurnError> {
        let Some(entry) = session.menu.get(index) else {
            return Ok(Reply::text("The menu is empty. Send /start to plan one."));
        };
        let persons = session.person_count.unwrap_or(FALLBACK_PERSONS);
        let precision = self.precision(session.user_id()).await?;

        let (scaled, note) = match find_by_name(catalog, &entry.dish) {
            Some(dish) => (ScaledDish::from_dish(dish, persons, entry.multiplicity), None),
            None => (
                ScaledDish {
                    name: entry.dish.clone(),
                    persons,
                    multiplicity: entry.multiplicity,
                    ingredients: Vec::new(),
                },
                Some(format!("{} is no longer in the recipe collection.", entry.dish)),
            ),
        };

        let description = match &self.describer {
            Some(describer) => match describer.describe(&entry.dish).await {
                Ok(text) => Some(text),
                Err(err) => {
                    tracing::warn!(dish = %entry.dish, error = %err, "Dish description unavailable");
                    None
                }
            },
            None => None,
        };

        let reply = prompts::recipe(&scaled, index, session.menu.len(), precision, description.as_deref());
        Ok(match note {
            Some(note) => reply.prepend(note),
            None => reply,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::adapters::ai::MockDescriber;
    use crate::domain::session::StageKind;
    use crate::ports::DescribeError;
    use std::sync::Arc;

    #[tokio::test]
    async fn preset_persons_scale_first_recipe() {
        let harness = Harness::new();
        harness.build_menu(&["Lasagne"], &[]).await;
        harness.press(Action::Confirm).await;
        let reply = harness.press(Action::Persons(5)).await;

        // Lasagne: 250 g minced beef for 2 persons.
        assert!(reply.text.contains("625 g minced beef"), "{}", reply.text);
        let session = harness.session().await;
        assert_eq!(session.person_count, Some(5));
        assert_eq!(session.kind(), StageKind::ReviewingRecipe);
    }

    #[tokio::test]
    async fn manual_entry_rejects_out_of_range() {
        let harness = Harness::new();
        harness.build_menu(&["Lasagne"], &[]).await;
        harness.press(Action::Confirm).await;
        harness.press(Action::PersonsManual).await;

        let reply = harness.say("40").await;
        assert!(reply.text.contains("between 1 and 20"));
        assert_eq!(
            harness.session().await.stage(),
            &DialogueStage::AwaitingPersonCount {
                mode: PersonCountMode::Manual
            }
        );
        harness.say("3").await;
        assert_eq!(harness.session().await.person_count, Some(3));
    }

    #[tokio::test]
    async fn navigation_stays_within_menu() {
        let harness = Harness::new();
        harness.build_menu(&["Lasagne", "Omelette"], &[]).await;
        harness.press(Action::Confirm).await;
        harness.press(Action::Persons(2)).await;

        harness.press(Action::Next).await;
        harness.press(Action::Next).await;
        assert_eq!(
            harness.session().await.stage(),
            &DialogueStage::ReviewingRecipe { index: 1 }
        );
        harness.press(Action::Prev).await;
        harness.press(Action::Prev).await;
        assert_eq!(
            harness.session().await.stage(),
            &DialogueStage::ReviewingRecipe { index: 0 }
        );
    }

    #[tokio::test]
    async fn describer_failure_is_not_fatal() {
        let describer = MockDescriber::new().with_error(DescribeError::Timeout(15));
        let harness = Harness::new().describer(Arc::new(describer.clone()));
        harness.build_menu(&["Lasagne"], &[]).await;
        harness.press(Action::Confirm).await;
        let reply = harness.press(Action::Persons(2)).await;

        assert!(reply.text.contains("Lasagne"));
        assert_eq!(describer.calls(), ["Lasagne"]);
        assert_eq!(harness.stage().await, StageKind::ReviewingRecipe);
    }

    #[tokio::test]
    async fn description_is_shown_when_available() {
        let describer = MockDescriber::new().with_description("Layers of joy.");
        let harness = Harness::new().describer(Arc::new(describer));
        harness.build_menu(&["Lasagne"], &[]).await;
        harness.press(Action::Confirm).await;
        let reply = harness.press(Action::Persons(2)).await;
        assert!(reply.text.contains("Layers of joy."));
    }

    #[tokio::test]
    async fn catalog_outage_keeps_person_prompt() {
        let harness = Harness::new();
        harness.build_menu(&["Lasagne"], &[]).await;
        harness.press(Action::Confirm).await;
        harness.catalog.set_unavailable(true);

        let reply = harness.press(Action::Persons(4)).await;
        assert!(reply.offers(&Action::Persons(4)));
        let session = harness.session().await;
        assert_eq!(session.kind(), StageKind::AwaitingPersonCount);
        assert_eq!(session.person_count, None);
    }
}
