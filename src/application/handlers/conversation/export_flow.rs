//! Export: pick a format, render the plan, finish the session.

use super::errors::TurnError;
use super::prompts;
use super::review_flow::FALLBACK_PERSONS;
use super::turn::{Outcome, TurnHandler};
use crate::domain::conversation::{Action, UserInput};
use crate::domain::planning::{ExportFormat, MenuPlanDocument};
use crate::domain::session::{DialogueStage, Session};

impl TurnHandler {
    pub(super) async fn on_export(&self, session: &mut Session, input: &UserInput) -> Result<Outcome, TurnError> {
        let DialogueStage::ChoosingExportFormat { save_favorites } = *session.stage() else {
            return self.not_understood(session).await;
        };

        let format = match input {
            UserInput::Action(Action::ToggleSaveFavorites) => {
                session.advance(DialogueStage::ChoosingExportFormat {
                    save_favorites: !save_favorites,
                })?;
                return Ok(self.render_stage(session).await?.into());
            }
            UserInput::Action(Action::Format(format)) => *format,
            UserInput::Text(text) => match text.parse::<ExportFormat>() {
                Ok(format) => format,
                Err(_) => return self.not_understood(session).await,
            },
            UserInput::Action(Action::Back) => {
                let catalog = match self.dishes(None).await {
                    Ok(catalog) => catalog,
                    Err(_) => return Ok(prompts::catalog_unavailable(Action::Back).into()),
                };
                session.advance(DialogueStage::ReviewingRecipe { index: 0 })?;
                return Ok(self.recipe_view(session, 0, &catalog).await?.into());
            }
            _ => return self.not_understood(session).await,
        };

        self.export(session, format, save_favorites).await
    }

    /// Renders the plan. Any failure keeps the session in format selection
    /// so the export can be retried without redoing the menu.
    async fn export(
        &self,
        session: &mut Session,
        format: ExportFormat,
        save_favorites: bool,
    ) -> Result<Outcome, TurnError> {
        let catalog = match self.dishes(None).await {
            Ok(catalog) => catalog,
            Err(_) => return Ok(prompts::catalog_unavailable(Action::Format(format)).into()),
        };
        let persons = session.person_count.unwrap_or(FALLBACK_PERSONS);
        let precision = self.precision(session.user_id()).await?;

        let plan = match MenuPlanDocument::build(&session.menu, &catalog, persons, precision) {
            Ok(plan) => plan,
            Err(err) => {
                tracing::warn!(error = %err, "Menu plan could not be built");
                return Ok(self.render_stage(session).await?.prepend(err.message).into());
            }
        };

        let document = match self.exporter.render(&plan, format).await {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(%format, error = %err, "Export failed");
                return Ok(self
                    .render_stage(session)
                    .await?
                    .prepend("The export didn't work. Your menu is still here, please try again.")
                    .into());
            }
        };
        tracing::info!(
            %format,
            dishes = plan.dishes.len(),
            bytes = document.len(),
            "Menu plan exported"
        );

        let mut reply = prompts::exported();
        if save_favorites {
            let saved = self
                .store
                .add_favorites(&session.user_id(), session.menu.dish_names())
                .await?;
            reply = reply.prepend(format!("Saved to your favorites ({} in total).", saved.len()));
        }
        Ok(Outcome::end(reply.with_document(document)))
    }
}
