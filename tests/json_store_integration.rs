//! Integration tests for the JSON file backend.
//!
//! Records go through `PersistenceStore` into real files in a temp dir, and
//! conversations survive a process restart.

use std::sync::Arc;
use tempfile::TempDir;

use menu_planner::adapters::catalog::StaticCatalog;
use menu_planner::adapters::export::PulldownMenuExporter;
use menu_planner::adapters::storage::JsonFileStore;
use menu_planner::application::{PersistenceStore, TurnHandler};
use menu_planner::domain::catalog::{Dish, DishCategory, EffortLevel};
use menu_planner::domain::conversation::{Action, Inbound};
use menu_planner::domain::foundation::{ChatId, UserId};
use menu_planner::domain::profile::{Profile, ScalingPreference};
use menu_planner::domain::session::DialogueStage;

fn persistence(dir: &TempDir) -> PersistenceStore {
    PersistenceStore::new(Arc::new(JsonFileStore::new(dir.path())))
}

fn handler(dir: &TempDir) -> TurnHandler {
    let dishes = vec![Dish::new("Chili", 4, EffortLevel::Medium, DishCategory::Main).unwrap()];
    TurnHandler::new(
        Arc::new(JsonFileStore::new(dir.path())),
        Arc::new(StaticCatalog::new(dishes)),
        Arc::new(PulldownMenuExporter::new()),
    )
}

#[tokio::test]
async fn profile_is_stamped_and_keyed_by_user() {
    let dir = TempDir::new().unwrap();
    let store = persistence(&dir);
    let user = UserId::new(42);

    let profile = Profile::new(3, ScalingPreference::Rounded).unwrap();
    let saved = store.set_profile(&user, &profile).await.unwrap();
    assert_eq!(saved.household_size, 3);
    assert!(saved.created_at.is_some());
    assert!(saved.updated_at.is_some());

    let raw = std::fs::read_to_string(dir.path().join("profiles.json")).unwrap();
    let table: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(table["u:42"]["household_size"], 3);
}

#[tokio::test]
async fn rewrite_keeps_created_at_and_advances_updated_at() {
    let dir = TempDir::new().unwrap();
    let store = persistence(&dir);
    let user = UserId::new(7);

    let first = store
        .set_profile(&user, &Profile::new(2, ScalingPreference::Exact).unwrap())
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = store
        .set_profile(&user, &Profile::new(4, ScalingPreference::Exact).unwrap())
        .await
        .unwrap();

    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(store.get_profile(&user).await.unwrap().unwrap().household_size, 4);
}

#[tokio::test]
async fn corrupt_table_reads_as_empty() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("favorites.json"), "{ not json").unwrap();
    let store = persistence(&dir);
    let user = UserId::new(1);

    assert!(store.get_favorites(&user).await.unwrap().is_empty());

    store.add_favorite(&user, "Chili").await.unwrap();
    assert!(store.get_favorites(&user).await.unwrap().contains("Chili"));
}

#[tokio::test]
async fn conversation_resumes_after_restart() {
    let dir = TempDir::new().unwrap();
    let chat = ChatId::new(100);
    let user = UserId::new(42);

    {
        let first = handler(&dir);
        first.handle(Inbound::text(chat, user, "/start")).await.unwrap();
        first
            .handle(Inbound::button(chat, user, &Action::MenuCount(3)))
            .await
            .unwrap();
    }

    let second = handler(&dir);
    let session = second.persistence().get_session(&chat).await.unwrap().unwrap();
    assert_eq!(session.stage(), &DialogueStage::AwaitingEffortLevel { menu_count: 3 });

    let raw = std::fs::read_to_string(dir.path().join("sessions.json")).unwrap();
    assert!(raw.contains("c:100"));
}
