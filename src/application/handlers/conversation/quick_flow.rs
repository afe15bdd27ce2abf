//! Single-dish shortcut: propose one main, then jump to the person count.

use super::errors::TurnError;
use super::prompts;
use super::turn::{retry_action, Outcome, TurnHandler};
use crate::domain::catalog::{find_by_name, find_replacement, DishCategory, DishFilter};
use crate::domain::conversation::{Action, UserInput};
use crate::domain::planning::{MenuEntry, WorkingMenu};
use crate::domain::session::{DialogueStage, PersonCountMode, QuickStep, Session};

impl TurnHandler {
    /// Drops any plan in progress and starts the quick flow.
    pub(super) fn start_quick(&self, session: &mut Session) -> Result<Outcome, TurnError> {
        session.reset_plan();
        session.advance(DialogueStage::QuickDish {
            step: QuickStep::Start,
        })?;
        Ok(prompts::quick_start().into())
    }

    pub(super) async fn on_quick(&self, session: &mut Session, input: &UserInput) -> Result<Outcome, TurnError> {
        let step = match session.stage() {
            DialogueStage::QuickDish { step } => step.clone(),
            _ => return self.not_understood(session).await,
        };

        match (step, input) {
            (_, UserInput::Action(Action::Cancel)) => {
                session.advance(DialogueStage::AwaitingMenuCount)?;
                Ok(prompts::menu_count().into())
            }
            (QuickStep::Start, UserInput::Action(Action::QuickRandom)) => {
                self.propose_quick(session, None, input).await
            }
            (QuickStep::Confirm { dish }, UserInput::Action(Action::QuickNext)) => {
                self.propose_quick(session, Some(&dish), input).await
            }
            (QuickStep::Confirm { dish }, UserInput::Action(Action::QuickAccept)) => {
                let mut menu = WorkingMenu::new();
                menu.push(MenuEntry::new(dish, DishCategory::Main));
                session.menu = menu;
                session.advance(DialogueStage::AwaitingPersonCount {
                    mode: PersonCountMode::Templated,
                })?;
                Ok(self.render_stage(session).await?.into())
            }
            (_, UserInput::Text(name)) => {
                let mains = match self.dishes(Some(&DishFilter::mains())).await {
                    Ok(mains) => mains,
                    Err(_) => return Ok(prompts::catalog_unavailable(Action::Retry).into()),
                };
                match find_by_name(&mains, name) {
                    Some(dish) => {
                        session.advance(DialogueStage::QuickDish {
                            step: QuickStep::Confirm {
                                dish: dish.name.clone(),
                            },
                        })?;
                        Ok(prompts::quick_confirm(&dish.name).into())
                    }
                    None => Ok(self
                        .render_stage(session)
                        .await?
                        .prepend(format!("I don't know a main dish called \"{}\".", name))
                        .into()),
                }
            }
            _ => self.not_understood(session).await,
        }
    }

    async fn propose_quick(
        &self,
        session: &mut Session,
        declined: Option<&str>,
        input: &UserInput,
    ) -> Result<Outcome, TurnError> {
        let filter = DishFilter::mains();
        let mains = match self.dishes(Some(&filter)).await {
            Ok(mains) => mains,
            Err(_) => return Ok(prompts::catalog_unavailable(retry_action(input)).into()),
        };
        let skip: Vec<String> = declined.map(str::to_string).into_iter().collect();
        let pick = self
            .with_rng(|rng| find_replacement(&mains, &skip, &filter, rng))
            .or_else(|| {
                // The declined dish is the only one; offer it again.
                declined.and_then(|name| find_by_name(&mains, name).cloned())
            });

        match pick {
            Some(dish) => {
                session.advance(DialogueStage::QuickDish {
                    step: QuickStep::Confirm {
                        dish: dish.name.clone(),
                    },
                })?;
                Ok(prompts::quick_confirm(&dish.name).into())
            }
            None => Ok(self
                .render_stage(session)
                .await?
                .prepend("The recipe collection has no main dishes yet.")
                .into()),
        }
    }
}
