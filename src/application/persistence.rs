//! Typed persistence facade over a `RecordStore`.
//!
//! The store speaks JSON objects; this layer maps them to `Profile`,
//! `Favorites` and `Session` and picks the namespaced key for each kind.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::favorites::Favorites;
use crate::domain::foundation::{ChatId, StoreKey, UserId};
use crate::domain::profile::Profile;
use crate::domain::session::Session;
use crate::ports::{RecordKind, RecordStore, StoreError};

/// Clones share the store and the per-user favorites locks.
#[derive(Clone)]
pub struct PersistenceStore {
    store: Arc<dyn RecordStore>,
    favorites_locks: Arc<Mutex<HashMap<UserId, Arc<Mutex<()>>>>>,
}

impl PersistenceStore {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            favorites_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    async fn load<T: DeserializeOwned>(
        &self,
        kind: RecordKind,
        key: &StoreKey,
    ) -> Result<Option<T>, StoreError> {
        match self.store.get(kind, key).await? {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StoreError::corrupt(kind, key, e.to_string())),
        }
    }

    /// Writes `record` and returns it as stored, timestamps included.
    async fn save<T: Serialize + DeserializeOwned>(
        &self,
        kind: RecordKind,
        key: &StoreKey,
        record: &T,
    ) -> Result<T, StoreError> {
        let value =
            serde_json::to_value(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let stamped = self.store.set(kind, key, value).await?;
        serde_json::from_value(stamped).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    // ───────────────────────────────────────────────────────────────────
    // Profiles
    // ───────────────────────────────────────────────────────────────────

    pub async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        self.load(RecordKind::Profile, &StoreKey::user(user_id)).await
    }

    pub async fn set_profile(&self, user_id: &UserId, profile: &Profile) -> Result<Profile, StoreError> {
        self.save(RecordKind::Profile, &StoreKey::user(user_id), profile)
            .await
    }

    // ───────────────────────────────────────────────────────────────────
    // Favorites
    // ───────────────────────────────────────────────────────────────────

    /// A user without a favorites record has an empty list.
    pub async fn get_favorites(&self, user_id: &UserId) -> Result<Favorites, StoreError> {
        Ok(self
            .load(RecordKind::Favorites, &StoreKey::user(user_id))
            .await?
            .unwrap_or_default())
    }

    /// Replaces the whole list. Duplicates collapse to their first occurrence.
    pub async fn set_favorites<I, S>(&self, user_id: &UserId, dishes: I) -> Result<Favorites, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let _guard = self.lock_favorites(user_id).await;
        let mut favorites = self.favorites_for_update(user_id).await?;
        favorites.replace_all(dishes);
        self.save(RecordKind::Favorites, &StoreKey::user(user_id), &favorites)
            .await
    }

    pub async fn add_favorite(&self, user_id: &UserId, dish: &str) -> Result<Favorites, StoreError> {
        self.add_favorites(user_id, [dish]).await
    }

    /// Adds every dish not yet listed. Writes only if something changed.
    pub async fn add_favorites<I, S>(&self, user_id: &UserId, dishes: I) -> Result<Favorites, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let _guard = self.lock_favorites(user_id).await;
        let mut favorites = self.favorites_for_update(user_id).await?;
        let mut changed = false;
        for dish in dishes {
            changed |= favorites.add(dish.as_ref());
        }
        if !changed {
            return Ok(favorites);
        }
        self.save(RecordKind::Favorites, &StoreKey::user(user_id), &favorites)
            .await
    }

    pub async fn remove_favorite(&self, user_id: &UserId, dish: &str) -> Result<Favorites, StoreError> {
        let _guard = self.lock_favorites(user_id).await;
        let mut favorites = self.favorites_for_update(user_id).await?;
        if !favorites.remove(dish) {
            return Ok(favorites);
        }
        self.save(RecordKind::Favorites, &StoreKey::user(user_id), &favorites)
            .await
    }

    /// Serialises read-modify-write of one user's favorites. Several chats
    /// of the same user share the record. Idle entries are pruned on lookup.
    async fn lock_favorites(&self, user_id: &UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.favorites_locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(*user_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Read side of a read-modify-write. A corrupt record is rebuilt from
    /// scratch rather than blocking every later update.
    async fn favorites_for_update(&self, user_id: &UserId) -> Result<Favorites, StoreError> {
        match self.get_favorites(user_id).await {
            Err(StoreError::Corrupt { kind, key, reason }) => {
                tracing::warn!(%kind, %key, %reason, "Replacing unreadable favorites record");
                Ok(Favorites::new())
            }
            other => other,
        }
    }

    // ───────────────────────────────────────────────────────────────────
    // Sessions
    // ───────────────────────────────────────────────────────────────────

    pub async fn get_session(&self, chat_id: &ChatId) -> Result<Option<Session>, StoreError> {
        self.load(RecordKind::Session, &StoreKey::chat(chat_id)).await
    }

    pub async fn set_session(&self, session: &Session) -> Result<Session, StoreError> {
        self.save(RecordKind::Session, &StoreKey::chat(&session.chat_id()), session)
            .await
    }

    pub async fn delete_session(&self, chat_id: &ChatId) -> Result<(), StoreError> {
        self.store
            .delete(RecordKind::Session, &StoreKey::chat(chat_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::{InMemoryStore, JsonFileStore};
    use crate::domain::profile::ScalingPreference;
    use crate::domain::session::{DialogueStage, StageKind};
    use proptest::prelude::*;
    use serde_json::json;

    fn facade() -> (InMemoryStore, PersistenceStore) {
        let memory = InMemoryStore::new();
        (memory.clone(), PersistenceStore::new(Arc::new(memory)))
    }

    #[tokio::test]
    async fn profile_round_trip_carries_timestamps() {
        let (_, store) = facade();
        let user = UserId::new(42);
        let saved = store
            .set_profile(&user, &Profile::new(3, ScalingPreference::Rounded).unwrap())
            .await
            .unwrap();
        assert!(saved.created_at.is_some());

        let loaded = store.get_profile(&user).await.unwrap().unwrap();
        assert_eq!(loaded.household_size, 3);
        assert_eq!(loaded.created_at, saved.created_at);
        assert!(loaded.updated_at.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_favorite_adds_from_two_chats_keep_both() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = PersistenceStore::new(Arc::new(JsonFileStore::new(dir.path())));
        for round in 0..20 {
            let user = UserId::new(round);
            let first = tokio::spawn({
                let store = store.clone();
                async move { store.add_favorite(&user, "Lasagne").await }
            });
            let second = tokio::spawn({
                let store = store.clone();
                async move { store.add_favorite(&user, "Curry").await }
            });
            first.await.unwrap().unwrap();
            second.await.unwrap().unwrap();

            let favorites = store.get_favorites(&user).await.unwrap();
            assert!(favorites.contains("Lasagne"), "round {}", round);
            assert!(favorites.contains("Curry"), "round {}", round);
        }
    }

    #[tokio::test]
    async fn missing_records_are_not_errors() {
        let (_, store) = facade();
        assert!(store.get_profile(&UserId::new(1)).await.unwrap().is_none());
        assert!(store.get_favorites(&UserId::new(1)).await.unwrap().is_empty());
        assert!(store.get_session(&ChatId::new(1)).await.unwrap().is_none());
        store.delete_session(&ChatId::new(1)).await.unwrap();
    }

    #[tokio::test]
    async fn undecodable_profile_is_corrupt() {
        let (memory, store) = facade();
        let user = UserId::new(7);
        memory
            .put_raw(RecordKind::Profile, StoreKey::user(&user), json!({"household_size": "many"}))
            .await;
        assert!(matches!(
            store.get_profile(&user).await,
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn corrupt_favorites_are_rebuilt_on_add() {
        let (memory, store) = facade();
        let user = UserId::new(7);
        memory
            .put_raw(RecordKind::Favorites, StoreKey::user(&user), json!({"dishes": 12}))
            .await;
        let favorites = store.add_favorite(&user, "Chili").await.unwrap();
        assert_eq!(favorites.dishes(), ["Chili"]);
    }

    #[tokio::test]
    async fn favorites_stay_unique_in_insertion_order() {
        let (_, store) = facade();
        let user = UserId::new(5);
        store.add_favorite(&user, "Lasagne").await.unwrap();
        store.add_favorite(&user, "Curry").await.unwrap();
        store.add_favorite(&user, "lasagne").await.unwrap();
        let favorites = store.get_favorites(&user).await.unwrap();
        assert_eq!(favorites.dishes(), ["Lasagne", "Curry"]);

        store.remove_favorite(&user, "LASAGNE").await.unwrap();
        assert_eq!(store.get_favorites(&user).await.unwrap().dishes(), ["Curry"]);
    }

    #[tokio::test]
    async fn user_and_chat_namespaces_do_not_collide() {
        let (memory, store) = facade();
        store.add_favorite(&UserId::new(100), "Soup").await.unwrap();
        let mut session = Session::new(ChatId::new(100), UserId::new(100));
        session
            .advance(DialogueStage::AwaitingEffortLevel { menu_count: 2 })
            .unwrap();
        store.set_session(&session).await.unwrap();

        assert_eq!(memory.len(RecordKind::Favorites).await, 1);
        assert_eq!(memory.len(RecordKind::Session).await, 1);
        let loaded = store.get_session(&ChatId::new(100)).await.unwrap().unwrap();
        assert_eq!(loaded.kind(), StageKind::AwaitingEffortLevel);
    }

    #[tokio::test]
    async fn unavailable_backend_is_reported_not_hidden() {
        let (memory, store) = facade();
        memory.set_unavailable(true);
        let err = store.get_session(&ChatId::new(1)).await.unwrap_err();
        assert!(err.is_unavailable());
    }

    proptest! {
        #[test]
        fn favorites_never_hold_duplicates(names in prop::collection::vec("[a-cA-C]{1,2}", 0..12)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let (_, store) = facade();
                let user = UserId::new(9);
                for name in &names {
                    store.add_favorite(&user, name).await.unwrap();
                }
                let stored = store.get_favorites(&user).await.unwrap();
                let unique: std::collections::HashSet<String> =
                    stored.dishes().iter().map(|d| d.to_lowercase()).collect();
                prop_assert_eq!(unique.len(), stored.len());

                // First-insertion order is kept.
                let mut expected: Vec<String> = Vec::new();
                for name in &names {
                    if !expected.iter().any(|e| e.eq_ignore_ascii_case(name)) {
                        expected.push(name.clone());
                    }
                }
                prop_assert_eq!(stored.dishes().to_vec(), expected);
                Ok(())
            })?;
        }
    }
}
