//! Profile overlay: use the stored profile or create one in three steps.

use super::errors::TurnError;
use super::prompts;
use super::turn::{Outcome, TurnHandler};
use crate::domain::conversation::{Action, Reply, UserInput};
use crate::domain::foundation::DomainError;
use crate::domain::profile::{
    validate_display_name, validate_household_size, Profile, ScalingPreference, MAX_HOUSEHOLD_SIZE,
    MAX_NAME_LENGTH,
};
use crate::domain::session::{DialogueStage, ProfileStep, Session};

fn set_step(session: &mut Session, step: ProfileStep) -> Result<(), TurnError> {
    let return_to = Box::new(session.stage().resume_point());
    session.advance(DialogueStage::ChoosingProfile { step, return_to })?;
    Ok(())
}

impl TurnHandler {
    pub(super) async fn open_profile(&self, session: &mut Session) -> Result<Outcome, TurnError> {
        session.open_overlay(|return_to| DialogueStage::ChoosingProfile {
            step: ProfileStep::Select,
            return_to,
        })?;
        Ok(self.render_stage(session).await?.into())
    }

    pub(super) async fn profile_prompt(&self, session: &Session, step: &ProfileStep) -> Result<Reply, TurnError> {
        Ok(match step {
            ProfileStep::Select => prompts::profile_select(self.profile(session.user_id()).await?.as_ref()),
            ProfileStep::EnterName => prompts::profile_name(),
            ProfileStep::EnterHouseholdSize { name } => prompts::profile_household(name),
            ProfileStep::ChooseScaling { .. } => prompts::profile_scaling(),
        })
    }

    pub(super) async fn on_profile(&self, session: &mut Session, input: &UserInput) -> Result<Outcome, TurnError> {
        let step = match session.stage() {
            DialogueStage::ChoosingProfile { step, .. } => step.clone(),
            _ => return self.not_understood(session).await,
        };
        let user_id = session.user_id();

        match (step, input) {
            (_, UserInput::Action(Action::Back | Action::Cancel)) => {
                session.close_overlay()?;
                Ok(self.render_stage(session).await?.into())
            }
            (ProfileStep::Select, UserInput::Action(Action::ProfileUse)) => match self.profile(user_id).await? {
                Some(profile) => self.use_profile(session, &profile, "").await,
                None => self.not_understood(session).await,
            },
            (ProfileStep::Select, UserInput::Action(Action::ProfileNew)) => {
                set_step(session, ProfileStep::EnterName)?;
                Ok(self.render_stage(session).await?.into())
            }
            (ProfileStep::EnterName, UserInput::Text(name)) => match validate_display_name(name) {
                Ok(name) => {
                    set_step(session, ProfileStep::EnterHouseholdSize { name })?;
                    Ok(self.render_stage(session).await?.into())
                }
                Err(_) => Ok(self
                    .render_stage(session)
                    .await?
                    .prepend(format!("Please use a name of 1 to {} characters.", MAX_NAME_LENGTH))
                    .into()),
            },
            (ProfileStep::EnterHouseholdSize { name }, _) => {
                let size = match input {
                    UserInput::Action(Action::Persons(n)) => Some(*n),
                    _ => input.as_number(),
                };
                let Some(size) = size else {
                    return self.not_understood(session).await;
                };
                match validate_household_size(size) {
                    Ok(household_size) => {
                        set_step(session, ProfileStep::ChooseScaling { name, household_size })?;
                        Ok(self.render_stage(session).await?.into())
                    }
                    Err(_) => Ok(self
                        .render_stage(session)
                        .await?
                        .prepend(format!("Please pick between 1 and {} persons.", MAX_HOUSEHOLD_SIZE))
                        .into()),
                }
            }
            (ProfileStep::ChooseScaling { name, household_size }, _) => {
                let scaling = match input {
                    UserInput::Action(Action::Scaling(preference)) => *preference,
                    UserInput::Text(text) => match text.parse::<ScalingPreference>() {
                        Ok(preference) => preference,
                        Err(_) => return self.not_understood(session).await,
                    },
                    _ => return self.not_understood(session).await,
                };
                let profile = Profile::new(household_size, scaling)
                    .and_then(|p| p.with_display_name(name))
                    .map_err(DomainError::from)?;
                let saved = self.store.set_profile(&user_id, &profile).await?;
                tracing::info!(%user_id, household_size, scaling = scaling.as_str(), "Profile saved");
                self.use_profile(session, &saved, "Profile saved.").await
            }
            _ => self.not_understood(session).await,
        }
    }

    /// Leaves the overlay. When the person count was pending, the profile
    /// answers it and the recipes are shown right away.
    async fn use_profile(&self, session: &mut Session, profile: &Profile, notice: &str) -> Result<Outcome, TurnError> {
        session.close_overlay()?;
        if matches!(session.stage(), DialogueStage::AwaitingPersonCount { .. }) {
            let outcome = self
                .start_review(session, profile.household_size, Action::PersonsProfile)
                .await?;
            return Ok(Outcome {
                reply: outcome.reply.prepend(notice),
                ..outcome
            });
        }
        Ok(self.render_stage(session).await?.prepend(notice).into())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::domain::session::StageKind;

    #[tokio::test]
    async fn wizard_creates_profile_and_answers_person_count() {
        let harness = Harness::new();
        harness.build_menu(&["Lasagne"], &[]).await;
        harness.press(Action::Confirm).await;
        harness.press(Action::OpenProfile).await;
        harness.press(Action::ProfileNew).await;
        harness.say("Home").await;
        harness.press(Action::Persons(5)).await;
        let reply = harness.press(Action::Scaling(ScalingPreference::Exact)).await;

        assert!(reply.text.starts_with("Profile saved."));
        assert!(reply.text.contains("625 g minced beef"), "{}", reply.text);

        let profile = harness
            .persistence()
            .get_profile(&UserId::new(USER))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.household_size, 5);
        assert_eq!(profile.display_name.as_deref(), Some("Home"));
        assert!(profile.created_at.is_some());

        let session = harness.session().await;
        assert_eq!(session.kind(), StageKind::ReviewingRecipe);
        assert_eq!(session.person_count, Some(5));
    }

    #[tokio::test]
    async fn invalid_household_size_stays_on_step() {
        let harness = Harness::new();
        harness.command("/profile").await;
        harness.press(Action::ProfileNew).await;
        harness.say("Flat").await;
        let reply = harness.say("0").await;

        assert!(reply.text.contains("between 1 and 20"));
        assert!(matches!(
            harness.session().await.stage(),
            DialogueStage::ChoosingProfile {
                step: ProfileStep::EnterHouseholdSize { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn stored_profile_shortcut_on_person_prompt() {
        let harness = Harness::new();
        harness.seed_profile(3).await;
        harness.build_menu(&["Lasagne"], &[]).await;
        let reply = harness.press(Action::Confirm).await;
        assert!(reply.offers(&Action::PersonsProfile));

        harness.press(Action::PersonsProfile).await;
        assert_eq!(harness.session().await.person_count, Some(3));
    }

    #[tokio::test]
    async fn cancel_mid_wizard_resumes_flow() {
        let harness = Harness::new();
        harness.press(Action::MenuCount(1)).await;
        harness.command("/profile").await;
        harness.press(Action::ProfileNew).await;
        harness.press(Action::Cancel).await;
        assert_eq!(harness.stage().await, StageKind::AwaitingEffortLevel);
    }
}
