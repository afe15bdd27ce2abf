//! Swapping one dish of the final list for a catalog alternative.

use super::errors::TurnError;
use super::prompts;
use super::turn::{retry_action, Outcome, TurnHandler};
use crate::domain::catalog::{find_replacement, DishCategory, DishFilter};
use crate::domain::conversation::{Action, UserInput};
use crate::domain::session::{DialogueStage, Session, SwapStep};

impl TurnHandler {
    pub(super) async fn on_swap(&self, session: &mut Session, input: &UserInput) -> Result<Outcome, TurnError> {
        let step = match session.stage() {
            DialogueStage::SwappingDish { step } => step.clone(),
            _ => return self.not_understood(session).await,
        };

        match (step, input) {
            (_, UserInput::Action(Action::Cancel | Action::Back)) => {
                session.advance(DialogueStage::ConfirmingFinalList)?;
                Ok(prompts::final_list(&session.menu).into())
            }
            (SwapStep::SelectTarget, UserInput::Action(Action::SwapPick(index))) => {
                self.propose_replacement(session, *index, None, input).await
            }
            (SwapStep::SelectTarget, UserInput::Text(_)) => match input.as_number() {
                Some(position) if position >= 1 => {
                    self.propose_replacement(session, position as usize - 1, None, input)
                        .await
                }
                _ => self.not_understood(session).await,
            },
            (SwapStep::Confirm { index, replacement }, UserInput::Action(Action::SwapAccept)) => {
                match session.menu.swap(index, &replacement) {
                    Ok(previous) => {
                        tracing::debug!(%previous, %replacement, index, "Dish swapped");
                        session.advance(DialogueStage::ConfirmingFinalList)?;
                        Ok(prompts::final_list(&session.menu)
                            .prepend(format!("Swapped {} for {}.", previous, replacement))
                            .into())
                    }
                    Err(err) => {
                        session.advance(DialogueStage::SwappingDish {
                            step: SwapStep::SelectTarget,
                        })?;
                        Ok(prompts::swap_select(&session.menu).prepend(err.message).into())
                    }
                }
            }
            (SwapStep::Confirm { index, replacement }, UserInput::Action(Action::SwapNext)) => {
                self.propose_replacement(session, index, Some(&replacement), input)
                    .await
            }
            _ => self.not_understood(session).await,
        }
    }

    /// Finds a same-category alternative for the entry at `index` that is not
    /// on the menu (and is not `skip`, the replacement just declined).
    async fn propose_replacement(
        &self,
        session: &mut Session,
        index: usize,
        skip: Option<&str>,
        input: &UserInput,
    ) -> Result<Outcome, TurnError> {
        let Some(entry) = session.menu.get(index).cloned() else {
            return self.not_understood(session).await;
        };
        let filter = match entry.category {
            DishCategory::Main => DishFilter::mains().with_effort(session.effort),
            DishCategory::Side => DishFilter::sides(),
        };
        let catalog = match self.dishes(Some(&filter)).await {
            Ok(catalog) => catalog,
            Err(_) => return Ok(prompts::catalog_unavailable(retry_action(input)).into()),
        };

        let mut on_menu = session.menu.dish_names();
        on_menu.extend(skip.map(str::to_string));
        let mut replacement = self.with_rng(|rng| find_replacement(&catalog, &on_menu, &filter, rng));
        if replacement.is_none() && skip.is_some() {
            // Only the declined one is left; offer it again rather than nothing.
            replacement = self.with_rng(|rng| {
                find_replacement(&catalog, &session.menu.dish_names(), &filter, rng)
            });
        }

        match replacement {
            Some(dish) => {
                session.advance(DialogueStage::SwappingDish {
                    step: SwapStep::Confirm {
                        index,
                        replacement: dish.name.clone(),
                    },
                })?;
                Ok(prompts::swap_confirm(&entry.dish, &dish.name).into())
            }
            None => Ok(self
                .render_stage(session)
                .await?
                .prepend(format!("There is no alternative for {} right now.", entry.dish))
                .into()),
        }
    }
}
