//! Menu assembly: count, effort, main dishes, side dishes, final list.

use super::errors::TurnError;
use super::prompts::{self, MAX_MENU_COUNT};
use super::turn::{retry_action, Outcome, TurnHandler};
use crate::domain::catalog::{find_by_name, same_dish, select_dishes, DishCategory, DishFilter, EffortLevel};
use crate::domain::conversation::{Action, UserInput};
use crate::domain::planning::{MenuEntry, WorkingMenu};
use crate::domain::session::{DialogueStage, PersonCountMode, Session, SwapStep};
use crate::ports::CatalogError;

/// Side dishes offered at once, chosen ones included.
const SIDE_PROPOSALS: usize = 6;

impl TurnHandler {
    pub(super) async fn on_menu_count(
        &self,
        session: &mut Session,
        input: &UserInput,
    ) -> Result<Outcome, TurnError> {
        let count = match input {
            UserInput::Action(Action::MenuCount(n)) => Some(u32::from(*n)),
            _ => input.as_number(),
        };
        let Some(count) = count else {
            return self.not_understood(session).await;
        };
        let menu_count = match u8::try_from(count) {
            Ok(n) if (1..=MAX_MENU_COUNT).contains(&n) => n,
            _ => {
                return Ok(prompts::menu_count()
                    .prepend(format!("Please choose between 1 and {} dishes.", MAX_MENU_COUNT))
                    .into())
            }
        };
        session.advance(DialogueStage::AwaitingEffortLevel { menu_count })?;
        Ok(prompts::effort(menu_count).into())
    }

    pub(super) async fn on_effort(
        &self,
        session: &mut Session,
        input: &UserInput,
    ) -> Result<Outcome, TurnError> {
        let DialogueStage::AwaitingEffortLevel { menu_count } = *session.stage() else {
            return self.not_understood(session).await;
        };
        let effort = match input {
            UserInput::Action(Action::Effort(level)) => *level,
            UserInput::Action(Action::Back) => {
                session.menu = WorkingMenu::new();
                session.advance(DialogueStage::AwaitingMenuCount)?;
                return Ok(prompts::menu_count().into());
            }
            UserInput::Text(text) if is_any(text) => None,
            UserInput::Text(text) => match text.parse::<EffortLevel>() {
                Ok(level) => Some(level),
                Err(_) => return self.not_understood(session).await,
            },
            _ => return self.not_understood(session).await,
        };

        let chosen = session.menu.count_of(DishCategory::Main);
        let wanted = usize::from(menu_count).saturating_sub(chosen).max(1);
        let filter = DishFilter::mains()
            .with_effort(effort)
            .excluding(session.menu.dish_names());
        let catalog = match self.dishes(Some(&filter)).await {
            Ok(catalog) => catalog,
            Err(_) => return Ok(prompts::catalog_unavailable(retry_action(input)).into()),
        };

        let selection = self.with_rng(|rng| select_dishes(&catalog, wanted, &filter, rng));
        if selection.dishes.is_empty() {
            return Ok(prompts::effort(menu_count)
                .prepend("No dishes match that effort level. Try another one.")
                .into());
        }
        let notice = if selection.is_short() {
            tracing::info!(
                requested = selection.requested,
                available = selection.dishes.len(),
                "Catalog short of eligible dishes"
            );
            format!(
                "Only {} matching {} available.",
                selection.dishes.len(),
                if selection.dishes.len() == 1 { "dish" } else { "dishes" }
            )
        } else {
            String::new()
        };

        session.effort = effort;
        session.advance(DialogueStage::SelectingDishes {
            menu_count,
            proposals: selection.names(),
        })?;
        Ok(self.render_stage(session).await?.prepend(notice).into())
    }

    pub(super) async fn on_dish_selection(
        &self,
        session: &mut Session,
        input: &UserInput,
    ) -> Result<Outcome, TurnError> {
        let (menu_count, proposals) = match session.stage() {
            DialogueStage::SelectingDishes {
                menu_count,
                proposals,
            } => (*menu_count, proposals.clone()),
            _ => return self.not_understood(session).await,
        };

        match input {
            UserInput::Action(Action::PickDish(name)) | UserInput::Text(name) => {
                self.pick_main(session, menu_count, proposals, name, input).await
            }
            UserInput::Action(Action::TakeAll) if !proposals.is_empty() => {
                let picks = proposals.clone();
                self.add_mains(session, menu_count, picks, proposals, input).await
            }
            UserInput::Action(Action::Reshuffle) => self.reshuffle(session, menu_count, &proposals).await,
            UserInput::Action(Action::FromFavorites) => self.propose_favorites(session, menu_count).await,
            UserInput::Action(Action::Done) => {
                if session.menu.count_of(DishCategory::Main) == 0 {
                    return Ok(self
                        .render_stage(session)
                        .await?
                        .prepend("Pick at least one dish first.")
                        .into());
                }
                let sides = match self.side_proposals(&session.menu).await {
                    Ok(sides) => sides,
                    Err(_) => return Ok(prompts::catalog_unavailable(Action::Done).into()),
                };
                session.advance(DialogueStage::SelectingSideDishes { proposals: sides })?;
                Ok(self.render_stage(session).await?.into())
            }
            UserInput::Action(Action::Back) => {
                session.advance(DialogueStage::AwaitingEffortLevel { menu_count })?;
                Ok(prompts::effort(menu_count).into())
            }
            _ => self.not_understood(session).await,
        }
    }

    /// Resolves `name` against the proposals first, then the whole catalog.
    async fn pick_main(
        &self,
        session: &mut Session,
        menu_count: u8,
        proposals: Vec<String>,
        name: &str,
        input: &UserInput,
    ) -> Result<Outcome, TurnError> {
        let dish = match proposals.iter().find(|p| same_dish(p, name)) {
            Some(proposed) => proposed.clone(),
            None => {
                let mains = match self.dishes(Some(&DishFilter::mains())).await {
                    Ok(mains) => mains,
                    Err(_) => return Ok(prompts::catalog_unavailable(retry_action(input)).into()),
                };
                match find_by_name(&mains, name) {
                    Some(dish) => dish.name.clone(),
                    None => {
                        return Ok(self
                            .render_stage(session)
                            .await?
                            .prepend(format!("I don't know a main dish called \"{}\".", name))
                            .into())
                    }
                }
            }
        };
        if session.menu.contains(&dish) {
            return Ok(self
                .render_stage(session)
                .await?
                .prepend(format!("{} is already on the menu.", dish))
                .into());
        }
        self.add_mains(session, menu_count, vec![dish], proposals, input).await
    }

    /// Adds mains until the requested count is reached. Completing the mains
    /// moves on to side dishes, whose proposals are fetched before anything
    /// changes so a catalog failure leaves the session untouched.
    async fn add_mains(
        &self,
        session: &mut Session,
        menu_count: u8,
        picks: Vec<String>,
        mut proposals: Vec<String>,
        input: &UserInput,
    ) -> Result<Outcome, TurnError> {
        let chosen = session.menu.count_of(DishCategory::Main);
        let room = usize::from(menu_count).saturating_sub(chosen);
        let picks: Vec<String> = picks
            .into_iter()
            .filter(|p| !session.menu.contains(p))
            .take(room)
            .collect();
        let complete = chosen + picks.len() >= usize::from(menu_count);

        let sides = if complete {
            let mut preview = session.menu.clone();
            for pick in &picks {
                preview.push(MenuEntry::new(pick.clone(), DishCategory::Main));
            }
            match self.side_proposals(&preview).await {
                Ok(sides) => Some(sides),
                Err(_) => return Ok(prompts::catalog_unavailable(retry_action(input)).into()),
            }
        } else {
            None
        };

        for pick in &picks {
            session.menu.push(MenuEntry::new(pick.clone(), DishCategory::Main));
        }
        proposals.retain(|p| !picks.iter().any(|pick| same_dish(p, pick)));

        match sides {
            Some(proposals) => session.advance(DialogueStage::SelectingSideDishes { proposals })?,
            None => session.advance(DialogueStage::SelectingDishes {
                menu_count,
                proposals,
            })?,
        }
        Ok(self.render_stage(session).await?.into())
    }

    /// New proposals. Prefers dishes not shown yet and falls back to any
    /// eligible dish once those run out.
    async fn reshuffle(
        &self,
        session: &mut Session,
        menu_count: u8,
        shown: &[String],
    ) -> Result<Outcome, TurnError> {
        let wanted = usize::from(menu_count)
            .saturating_sub(session.menu.count_of(DishCategory::Main))
            .max(1);
        let base = DishFilter::mains()
            .with_effort(session.effort)
            .excluding(session.menu.dish_names());
        let catalog = match self.dishes(Some(&base)).await {
            Ok(catalog) => catalog,
            Err(_) => return Ok(prompts::catalog_unavailable(Action::Reshuffle).into()),
        };

        let unseen = base.clone().excluding(shown.iter().cloned());
        let mut selection = self.with_rng(|rng| select_dishes(&catalog, wanted, &unseen, rng));
        if selection.dishes.is_empty() {
            selection = self.with_rng(|rng| select_dishes(&catalog, wanted, &base, rng));
        }
        if selection.dishes.is_empty() {
            return Ok(self
                .render_stage(session)
                .await?
                .prepend("There are no other dishes to suggest.")
                .into());
        }

        session.advance(DialogueStage::SelectingDishes {
            menu_count,
            proposals: selection.names(),
        })?;
        Ok(self.render_stage(session).await?.into())
    }

    async fn propose_favorites(&self, session: &mut Session, menu_count: u8) -> Result<Outcome, TurnError> {
        let favorites = self.favorites(session.user_id()).await?;
        if favorites.is_empty() {
            return Ok(self
                .render_stage(session)
                .await?
                .prepend("You have no favorites yet.")
                .into());
        }
        let filter = DishFilter::mains().excluding(session.menu.dish_names());
        let mains = match self.dishes(Some(&filter)).await {
            Ok(mains) => mains,
            Err(_) => return Ok(prompts::catalog_unavailable(Action::FromFavorites).into()),
        };
        let proposals: Vec<String> = favorites
            .dishes()
            .iter()
            .filter_map(|name| find_by_name(&mains, name))
            .map(|dish| dish.name.clone())
            .collect();
        if proposals.is_empty() {
            return Ok(self
                .render_stage(session)
                .await?
                .prepend("None of your favorites can be added as a main dish.")
                .into());
        }

        session.advance(DialogueStage::SelectingDishes {
            menu_count,
            proposals,
        })?;
        Ok(self.render_stage(session).await?.into())
    }

    /// Sides already chosen plus a fresh draw, up to `SIDE_PROPOSALS`.
    pub(super) async fn side_proposals(&self, menu: &WorkingMenu) -> Result<Vec<String>, CatalogError> {
        let current: Vec<String> = menu.sides().map(|e| e.dish.clone()).collect();
        let wanted = SIDE_PROPOSALS.saturating_sub(current.len());
        let filter = DishFilter::sides().excluding(menu.dish_names());
        let sides = self.dishes(Some(&filter)).await?;
        let drawn = self.with_rng(|rng| select_dishes(&sides, wanted, &filter, rng));
        Ok(current.into_iter().chain(drawn.names()).collect())
    }

    pub(super) async fn on_side_selection(
        &self,
        session: &mut Session,
        input: &UserInput,
    ) -> Result<Outcome, TurnError> {
        let proposals = match session.stage() {
            DialogueStage::SelectingSideDishes { proposals } => proposals.clone(),
            _ => return self.not_understood(session).await,
        };

        match input {
            UserInput::Action(Action::ToggleSide(name)) | UserInput::Text(name) => {
                let Some(side) = proposals.iter().find(|p| same_dish(p, name)).cloned() else {
                    return Ok(self
                        .render_stage(session)
                        .await?
                        .prepend("Pick one of the listed side dishes.")
                        .into());
                };
                let existing = session
                    .menu
                    .entries()
                    .iter()
                    .position(|e| e.category == DishCategory::Side && same_dish(&e.dish, &side));
                match existing {
                    Some(index) => {
                        session.menu.remove(index);
                    }
                    None => {
                        if !session.menu.push(MenuEntry::new(side.clone(), DishCategory::Side)) {
                            return Ok(self
                                .render_stage(session)
                                .await?
                                .prepend(format!("{} is already on the menu.", side))
                                .into());
                        }
                    }
                }
                Ok(self.render_stage(session).await?.into())
            }
            UserInput::Action(Action::Done) => {
                session.advance(DialogueStage::ConfirmingFinalList)?;
                Ok(prompts::final_list(&session.menu).into())
            }
            _ => self.not_understood(session).await,
        }
    }

    pub(super) async fn on_final_list(
        &self,
        session: &mut Session,
        input: &UserInput,
    ) -> Result<Outcome, TurnError> {
        match input {
            UserInput::Action(Action::Confirm) => {
                session.advance(DialogueStage::AwaitingPersonCount {
                    mode: PersonCountMode::Templated,
                })?;
                Ok(self.render_stage(session).await?.into())
            }
            UserInput::Action(Action::Swap) => {
                session.advance(DialogueStage::SwappingDish {
                    step: SwapStep::SelectTarget,
                })?;
                Ok(prompts::swap_select(&session.menu).into())
            }
            UserInput::Action(Action::Twice(index)) => {
                if session.menu.toggle_multiplicity(*index).is_none() {
                    return self.not_understood(session).await;
                }
                Ok(prompts::final_list(&session.menu).into())
            }
            UserInput::Action(Action::Back) => {
                let sides = match self.side_proposals(&session.menu).await {
                    Ok(sides) => sides,
                    Err(_) => return Ok(prompts::catalog_unavailable(Action::Back).into()),
                };
                session.advance(DialogueStage::SelectingSideDishes { proposals: sides })?;
                Ok(self.render_stage(session).await?.into())
            }
            _ => self.not_understood(session).await,
        }
    }
}

fn is_any(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "any" | "anything" | "whatever" | "egal"
    )
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::session::StageKind;

    #[tokio::test]
    async fn menu_count_accepts_button_and_text() {
        let harness = Harness::new();
        let reply = harness.press(Action::MenuCount(3)).await;
        assert!(reply.offers(&Action::Effort(None)));
        assert_eq!(harness.stage().await, StageKind::AwaitingEffortLevel);

        let other = Harness::new();
        other.say("2").await;
        assert_eq!(
            other.session().await.stage(),
            &DialogueStage::AwaitingEffortLevel { menu_count: 2 }
        );
    }

    #[tokio::test]
    async fn menu_count_out_of_range_stays() {
        let harness = Harness::new();
        let reply = harness.say("12").await;
        assert!(reply.text.contains("between 1 and 7"));
        assert_eq!(harness.stage().await, StageKind::AwaitingMenuCount);
    }

    #[tokio::test]
    async fn effort_filter_limits_proposals() {
        let harness = Harness::new();
        harness.press(Action::MenuCount(2)).await;
        harness.press(Action::Effort(Some(EffortLevel::Quick))).await;

        let session = harness.session().await;
        let DialogueStage::SelectingDishes { proposals, .. } = session.stage() else {
            panic!("expected dish selection, got {:?}", session.stage());
        };
        assert_eq!(proposals.len(), 2);
        for name in proposals {
            assert!(["Omelette", "Pancakes"].contains(&name.as_str()), "{}", name);
        }
        assert_eq!(session.effort, Some(EffortLevel::Quick));
    }

    #[tokio::test]
    async fn short_catalog_informs_user() {
        let harness = Harness::new();
        harness.press(Action::MenuCount(5)).await;
        let reply = harness.press(Action::Effort(Some(EffortLevel::Quick))).await;
        assert!(reply.text.starts_with("Only 2 matching dishes"));
    }

    #[tokio::test]
    async fn picking_all_mains_moves_to_sides() {
        let harness = Harness::new();
        harness.press(Action::MenuCount(2)).await;
        harness.press(Action::Effort(None)).await;
        harness.say("Lasagne").await;
        assert_eq!(harness.stage().await, StageKind::SelectingDishes);
        harness.say("risotto").await;

        let session = harness.session().await;
        assert_eq!(session.kind(), StageKind::SelectingSideDishes);
        assert_eq!(session.menu.dish_names(), ["Lasagne", "Risotto"]);
    }

    #[tokio::test]
    async fn unknown_dish_keeps_stage() {
        let harness = Harness::new();
        harness.press(Action::MenuCount(2)).await;
        harness.press(Action::Effort(None)).await;
        let reply = harness.say("Sushi").await;
        assert!(reply.text.contains("Sushi"));
        assert!(harness.session().await.menu.is_empty());
    }

    #[tokio::test]
    async fn side_toggle_adds_and_removes() {
        let harness = Harness::new();
        harness.press(Action::MenuCount(1)).await;
        harness.press(Action::Effort(None)).await;
        harness.say("Lasagne").await;

        harness.press(Action::ToggleSide("Green Salad".into())).await;
        assert!(harness.session().await.menu.contains("Green Salad"));
        harness.press(Action::ToggleSide("Green Salad".into())).await;
        assert!(!harness.session().await.menu.contains("Green Salad"));

        let reply = harness.press(Action::Done).await;
        assert!(reply.offers(&Action::Confirm));
        assert_eq!(harness.stage().await, StageKind::ConfirmingFinalList);
    }

    #[tokio::test]
    async fn catalog_outage_keeps_stage_and_offers_retry() {
        let harness = Harness::new();
        harness.press(Action::MenuCount(2)).await;
        harness.catalog.set_unavailable(true);

        let reply = harness.press(Action::Effort(None)).await;
        assert!(reply.offers(&Action::Effort(None)));
        assert_eq!(harness.stage().await, StageKind::AwaitingEffortLevel);

        harness.catalog.set_unavailable(false);
        harness.press(Action::Effort(None)).await;
        assert_eq!(harness.stage().await, StageKind::SelectingDishes);
    }

    #[tokio::test]
    async fn twice_toggles_multiplicity_on_final_list() {
        let harness = Harness::new();
        harness.build_menu(&["Lasagne"], &[]).await;
        harness.press(Action::Twice(0)).await;
        assert_eq!(harness.session().await.menu.entries()[0].multiplicity, 2);
        harness.press(Action::Twice(0)).await;
        assert_eq!(harness.session().await.menu.entries()[0].multiplicity, 1);
    }
}
