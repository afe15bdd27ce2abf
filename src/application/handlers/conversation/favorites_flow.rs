//! Favorites manager overlay: overview, add, remove.

use super::errors::TurnError;
use super::prompts;
use super::turn::{Outcome, TurnHandler};
use crate::domain::catalog::{same_dish, select_dishes, DishFilter};
use crate::domain::conversation::{Action, Reply, UserInput};
use crate::domain::session::{DialogueStage, FavoritesView, Session};

/// Catalog dishes offered when the menu has nothing new to add.
const ADD_CANDIDATES: usize = 8;

/// Switches the favorites sub-view, keeping the stage to return to.
fn set_view(session: &mut Session, view: FavoritesView) -> Result<(), TurnError> {
    let return_to = Box::new(session.stage().resume_point());
    session.advance(DialogueStage::ManagingFavorites { view, return_to })?;
    Ok(())
}

impl TurnHandler {
    pub(super) async fn open_favorites(&self, session: &mut Session) -> Result<Outcome, TurnError> {
        session.open_overlay(|return_to| DialogueStage::ManagingFavorites {
            view: FavoritesView::Overview,
            return_to,
        })?;
        Ok(self.render_stage(session).await?.into())
    }

    pub(super) async fn favorites_prompt(&self, session: &Session, view: &FavoritesView) -> Result<Reply, TurnError> {
        Ok(match view {
            FavoritesView::Overview => prompts::favorites_overview(&self.favorites(session.user_id()).await?),
            FavoritesView::DeleteSelect => prompts::favorites_delete(&self.favorites(session.user_id()).await?),
            FavoritesView::AddSelect { candidates } => prompts::favorites_add(candidates),
        })
    }

    pub(super) async fn on_favorites(
        &self,
        session: &mut Session,
        input: &UserInput,
    ) -> Result<Outcome, TurnError> {
        let view = match session.stage() {
            DialogueStage::ManagingFavorites { view, .. } => view.clone(),
            _ => return self.not_understood(session).await,
        };
        let user_id = session.user_id();

        match (view, input) {
            (FavoritesView::Overview, UserInput::Action(Action::Back | Action::Cancel)) => {
                session.close_overlay()?;
                Ok(self.render_stage(session).await?.into())
            }
            (_, UserInput::Action(Action::Back | Action::Cancel)) => {
                set_view(session, FavoritesView::Overview)?;
                Ok(self.render_stage(session).await?.into())
            }
            (FavoritesView::Overview, UserInput::Action(Action::FavAdd)) => {
                let favorites = self.favorites(user_id).await?;
                let mut candidates: Vec<String> = session
                    .menu
                    .dish_names()
                    .into_iter()
                    .filter(|dish| !favorites.contains(dish))
                    .collect();
                if candidates.is_empty() {
                    let filter = DishFilter::mains().excluding(favorites.dishes().iter().cloned());
                    let mains = match self.dishes(Some(&filter)).await {
                        Ok(mains) => mains,
                        Err(_) => return Ok(prompts::catalog_unavailable(Action::FavAdd).into()),
                    };
                    candidates = self
                        .with_rng(|rng| select_dishes(&mains, ADD_CANDIDATES, &filter, rng))
                        .names();
                }
                set_view(session, FavoritesView::AddSelect { candidates })?;
                Ok(self.render_stage(session).await?.into())
            }
            (FavoritesView::Overview, UserInput::Action(Action::FavDelete)) => {
                if self.favorites(user_id).await?.is_empty() {
                    return Ok(self.render_stage(session).await?.prepend("Nothing to remove.").into());
                }
                set_view(session, FavoritesView::DeleteSelect)?;
                Ok(self.render_stage(session).await?.into())
            }
            (FavoritesView::Overview, UserInput::Text(name)) if !name.is_empty() => {
                self.store.add_favorite(&user_id, name).await?;
                Ok(self
                    .render_stage(session)
                    .await?
                    .prepend(format!("⭐ {} is a favorite.", name))
                    .into())
            }
            (
                FavoritesView::AddSelect { mut candidates },
                UserInput::Action(Action::FavPickAdd(name)) | UserInput::Text(name),
            ) if !name.is_empty() => {
                self.store.add_favorite(&user_id, name).await?;
                candidates.retain(|c| !same_dish(c, name));
                let view = if candidates.is_empty() {
                    FavoritesView::Overview
                } else {
                    FavoritesView::AddSelect { candidates }
                };
                set_view(session, view)?;
                Ok(self
                    .render_stage(session)
                    .await?
                    .prepend(format!("⭐ {} added.", name))
                    .into())
            }
            (
                FavoritesView::DeleteSelect,
                UserInput::Action(Action::FavPickDelete(name)) | UserInput::Text(name),
            ) => {
                if !self.favorites(user_id).await?.contains(name) {
                    return Ok(self
                        .render_stage(session)
                        .await?
                        .prepend(format!("{} is not among your favorites.", name))
                        .into());
                }
                let remaining = self.store.remove_favorite(&user_id, name).await?;
                if remaining.is_empty() {
                    set_view(session, FavoritesView::Overview)?;
                }
                Ok(self
                    .render_stage(session)
                    .await?
                    .prepend(format!("Removed {}.", name))
                    .into())
            }
            _ => self.not_understood(session).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::session::StageKind;

    #[tokio::test]
    async fn overlay_returns_to_interrupted_stage() {
        let harness = Harness::new();
        harness.press(Action::MenuCount(2)).await;
        harness.command("/favorites").await;
        assert_eq!(harness.stage().await, StageKind::ManagingFavorites);

        harness.press(Action::Back).await;
        assert_eq!(
            harness.session().await.stage(),
            &DialogueStage::AwaitingEffortLevel { menu_count: 2 }
        );
    }

    #[tokio::test]
    async fn add_from_menu_candidates() {
        let harness = Harness::new();
        harness.build_menu(&["Lasagne", "Omelette"], &[]).await;
        harness.command("/favorites").await;

        let reply = harness.press(Action::FavAdd).await;
        assert!(reply.offers(&Action::FavPickAdd("Lasagne".into())));

        harness.press(Action::FavPickAdd("Lasagne".into())).await;
        harness.press(Action::FavPickAdd("Omelette".into())).await;
        assert_eq!(harness.favorites().await.dishes(), ["Lasagne", "Omelette"]);

        // Candidates exhausted, back on the overview.
        let session = harness.session().await;
        assert!(matches!(
            session.stage(),
            DialogueStage::ManagingFavorites {
                view: FavoritesView::Overview,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn typed_names_are_added_once() {
        let harness = Harness::new();
        harness.command("/favorites").await;
        harness.say("Grandma's soup").await;
        harness.say("grandma's soup").await;
        assert_eq!(harness.favorites().await.dishes(), ["Grandma's soup"]);
    }

    #[tokio::test]
    async fn delete_removes_and_returns_to_overview_when_empty() {
        let harness = Harness::new();
        harness.seed_favorites(&["Chili"]).await;
        harness.command("/favorites").await;
        harness.press(Action::FavDelete).await;
        harness.press(Action::FavPickDelete("Chili".into())).await;

        assert!(harness.favorites().await.is_empty());
        assert!(matches!(
            harness.session().await.stage(),
            DialogueStage::ManagingFavorites {
                view: FavoritesView::Overview,
                ..
            }
        ));
    }
}
