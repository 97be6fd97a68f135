//! Track repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::{Track, UploadRequest, User};
use async_trait::async_trait;
use bridge_traits::{Clock, KeyValueStore};
use core_runtime::config::DEFAULT_STORAGE_KEY;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use core_runtime::logging::{redact_if_sensitive, strip_path};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Track repository interface for data access operations
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// All tracks, newest first
    async fn list(&self) -> Result<Vec<Track>>;

    /// Find a track by its ID
    ///
    /// # Returns
    /// - `Ok(Some(track))` if found
    /// - `Ok(None)` if not found
    async fn get(&self, id: &str) -> Result<Option<Track>>;

    /// Tracks the current user liked, newest first
    async fn liked(&self) -> Result<Vec<Track>>;

    /// Case-insensitive substring search over title and artist.
    ///
    /// A blank query returns no results.
    async fn search(&self, query: &str) -> Result<Vec<Track>>;

    /// Add a picked file to the library as a new track
    ///
    /// # Errors
    /// Returns `InvalidInput` if the file locator is empty or the built
    /// track fails validation (for example, no title can be derived).
    async fn upload(&self, request: UploadRequest, uploader: &User) -> Result<Track>;

    /// Delete a track by ID
    ///
    /// # Returns
    /// - `Ok(true)` if track was deleted
    /// - `Ok(false)` if track was not found
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Flip the current user's like on a track
    ///
    /// # Returns
    /// The new liked flag; `Ok(false)` for an unknown track.
    async fn toggle_like(&self, id: &str) -> Result<bool>;

    /// The signed-in user
    async fn current_user(&self) -> Result<User>;
}

/// `TrackRepository` that keeps the whole collection as one JSON array in a
/// host key-value store.
pub struct KvTrackRepository {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    event_bus: Option<EventBus>,
    storage_key: String,
    // Serializes read-modify-write cycles on the stored document
    write_lock: Mutex<()>,
}

impl KvTrackRepository {
    /// Create a repository over `store`, using `clock` for ids and timestamps
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            event_bus: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store the collection under a different key
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Announce library changes on `bus`
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    async fn read(&self) -> Result<Option<Vec<Track>>> {
        let Some(json) = self.store.get_item(&self.storage_key).await? else {
            return Ok(None);
        };
        let mut tracks: Vec<Track> = serde_json::from_str(&json)?;
        tracks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Some(tracks))
    }

    /// Read the collection, seeding an empty one on first access.
    async fn load(&self) -> Result<Vec<Track>> {
        if let Some(tracks) = self.read().await? {
            return Ok(tracks);
        }

        // A writer may have created the collection while we waited
        let _guard = self.write_lock.lock().await;
        if let Some(tracks) = self.read().await? {
            return Ok(tracks);
        }
        debug!(key = %self.storage_key, "Seeding empty track collection");
        self.save(&[]).await?;
        Ok(Vec::new())
    }

    /// Read the collection for a mutation. Caller must hold `write_lock`.
    async fn load_for_write(&self) -> Result<Vec<Track>> {
        Ok(self.read().await?.unwrap_or_default())
    }

    async fn save(&self, tracks: &[Track]) -> Result<()> {
        let json = serde_json::to_string(tracks)?;
        self.store.set_item(&self.storage_key, &json).await?;
        Ok(())
    }

    fn emit(&self, event: LibraryEvent) {
        if let Some(bus) = &self.event_bus {
            // No subscribers is fine
            let _ = bus.emit(CoreEvent::Library(event));
        }
    }

    fn next_id(&self, existing: &[Track]) -> i64 {
        let mut millis = self.clock.unix_timestamp_millis();
        while existing.iter().any(|t| t.id == millis.to_string()) {
            millis += 1;
        }
        millis
    }
}

#[async_trait]
impl TrackRepository for KvTrackRepository {
    async fn list(&self) -> Result<Vec<Track>> {
        self.load().await
    }

    async fn get(&self, id: &str) -> Result<Option<Track>> {
        Ok(self.load().await?.into_iter().find(|t| t.id == id))
    }

    async fn liked(&self) -> Result<Vec<Track>> {
        let mut tracks = self.load().await?;
        tracks.retain(|t| t.liked_by_user);
        Ok(tracks)
    }

    async fn search(&self, query: &str) -> Result<Vec<Track>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut tracks = self.load().await?;
        tracks.retain(|t| t.matches(&needle));
        Ok(tracks)
    }

    async fn upload(&self, request: UploadRequest, uploader: &User) -> Result<Track> {
        if request.uri.trim().is_empty() {
            return Err(LibraryError::InvalidInput {
                field: "uri".to_string(),
                message: "a media file is required".to_string(),
            });
        }

        let _guard = self.write_lock.lock().await;
        let mut tracks = self.load_for_write().await?;

        let millis = self.next_id(&tracks);
        let track = Track {
            id: millis.to_string(),
            title: request.resolved_title(),
            artist: uploader.name.clone(),
            url: request.uri,
            cover_url: format!("https://picsum.photos/400/400?random={}", millis),
            uploaded_by: uploader.clone(),
            duration: 0.0,
            created_at: millis,
            likes: 0,
            liked_by_user: false,
        };
        track
            .validate()
            .map_err(|message| LibraryError::InvalidInput {
                field: "track".to_string(),
                message,
            })?;

        tracks.insert(0, track.clone());
        self.save(&tracks).await?;

        info!(
            track_id = %track.id,
            file = %strip_path(&track.url),
            uploader = %redact_if_sensitive("email", &uploader.email),
            "Track uploaded"
        );
        self.emit(LibraryEvent::TrackAdded {
            track_id: track.id.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
        });

        Ok(track)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut tracks = self.load_for_write().await?;

        let before = tracks.len();
        tracks.retain(|t| t.id != id);
        if tracks.len() == before {
            return Ok(false);
        }

        self.save(&tracks).await?;
        info!(track_id = id, "Track deleted");
        self.emit(LibraryEvent::TrackDeleted {
            track_id: id.to_string(),
        });
        Ok(true)
    }

    async fn toggle_like(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut tracks = self.load_for_write().await?;

        let Some(track) = tracks.iter_mut().find(|t| t.id == id) else {
            debug!(track_id = id, "Like toggled on unknown track");
            return Ok(false);
        };
        let liked = track.toggle_like();
        let likes = track.likes;

        self.save(&tracks).await?;
        debug!(track_id = id, liked, likes, "Like toggled");
        self.emit(LibraryEvent::TrackUpdated {
            track_id: id.to_string(),
            updated_fields: vec!["likes".to_string(), "likedByUser".to_string()],
        });
        Ok(liked)
    }

    async fn current_user(&self) -> Result<User> {
        Ok(User::current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::ManualClock;
    use mockall::mock;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore {
        items: std::sync::Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl KeyValueStore for MemoryStore {
        async fn get_item(&self, key: &str) -> BridgeResult<Option<String>> {
            Ok(self.items.lock().unwrap().get(key).cloned())
        }

        async fn set_item(&self, key: &str, value: &str) -> BridgeResult<()> {
            self.items
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn remove_item(&self, key: &str) -> BridgeResult<()> {
            self.items.lock().unwrap().remove(key);
            Ok(())
        }
    }

    mock! {
        Store {}

        #[async_trait]
        impl KeyValueStore for Store {
            async fn get_item(&self, key: &str) -> BridgeResult<Option<String>>;
            async fn set_item(&self, key: &str, value: &str) -> BridgeResult<()>;
            async fn remove_item(&self, key: &str) -> BridgeResult<()>;
        }
    }

    fn repo() -> (KvTrackRepository, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let repo = KvTrackRepository::new(store.clone(), clock.clone());
        (repo, store, clock)
    }

    async fn upload(repo: &KvTrackRepository, clock: &ManualClock, name: &str) -> Track {
        let track = repo
            .upload(
                UploadRequest::new(format!("file:///picked/{}", name), name),
                &User::current(),
            )
            .await
            .unwrap();
        clock.advance_millis(1_000);
        track
    }

    #[tokio::test]
    async fn test_first_list_seeds_empty_collection() {
        let (repo, store, _) = repo();

        assert!(repo.list().await.unwrap().is_empty());
        assert_eq!(
            store.get_item(DEFAULT_STORAGE_KEY).await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn test_upload_builds_track_from_request() {
        let (repo, _, _) = repo();

        let track = repo
            .upload(
                UploadRequest::new("file:///picked/sunrise.mp3", "sunrise.mp3"),
                &User::current(),
            )
            .await
            .unwrap();

        assert_eq!(track.id, "1700000000000");
        assert_eq!(track.title, "sunrise");
        assert_eq!(track.artist, "Neo User");
        assert_eq!(track.url, "file:///picked/sunrise.mp3");
        assert_eq!(
            track.cover_url,
            "https://picsum.photos/400/400?random=1700000000000"
        );
        assert_eq!(track.duration, 0.0);
        assert_eq!(track.likes, 0);
        assert!(!track.liked_by_user);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_upload_prepends() {
        let (repo, _, clock) = repo();

        let first = upload(&repo, &clock, "a.mp3").await;
        let second = upload(&repo, &clock, "b.mp3").await;

        let ids: Vec<_> = repo.list().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_list_sorts_unordered_storage() {
        let (repo, store, _) = repo();
        let stored = |id: &str, created_at: i64| Track {
            id: id.to_string(),
            title: id.to_string(),
            artist: "Neo User".to_string(),
            url: format!("file:///{}", id),
            cover_url: String::new(),
            uploaded_by: User::current(),
            duration: 0.0,
            created_at,
            likes: 0,
            liked_by_user: false,
        };
        let json = serde_json::to_string(&vec![stored("old", 1), stored("new", 2)]).unwrap();
        store.set_item(DEFAULT_STORAGE_KEY, &json).await.unwrap();

        let ids: Vec<_> = repo.list().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["new".to_string(), "old".to_string()]);
    }

    #[tokio::test]
    async fn test_upload_in_same_millisecond_gets_unique_id() {
        let (repo, _, _) = repo();
        let user = User::current();

        let a = repo
            .upload(UploadRequest::new("file:///a", "a.mp3"), &user)
            .await
            .unwrap();
        let b = repo
            .upload(UploadRequest::new("file:///b", "b.mp3"), &user)
            .await
            .unwrap();

        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_upload_rejects_missing_file() {
        let (repo, _, _) = repo();

        let result = repo
            .upload(UploadRequest::new("  ", "a.mp3"), &User::current())
            .await;

        assert!(matches!(
            result,
            Err(LibraryError::InvalidInput { ref field, .. }) if field == "uri"
        ));
    }

    #[tokio::test]
    async fn test_upload_rejects_blank_title() {
        let (repo, store, _) = repo();

        let result = repo
            .upload(UploadRequest::new("file:///picked/x", "   "), &User::current())
            .await;

        assert!(matches!(
            result,
            Err(LibraryError::InvalidInput { ref field, .. }) if field == "track"
        ));
        assert!(store.get_item(DEFAULT_STORAGE_KEY).await.unwrap().is_none());
    }

    /// Holds its first `set_item` until released.
    #[derive(Default)]
    struct SlowFirstWrite {
        inner: MemoryStore,
        armed: std::sync::atomic::AtomicBool,
        entered: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl KeyValueStore for SlowFirstWrite {
        async fn get_item(&self, key: &str) -> BridgeResult<Option<String>> {
            self.inner.get_item(key).await
        }

        async fn set_item(&self, key: &str, value: &str) -> BridgeResult<()> {
            if self.armed.swap(false, std::sync::atomic::Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.set_item(key, value).await
        }

        async fn remove_item(&self, key: &str) -> BridgeResult<()> {
            self.inner.remove_item(key).await
        }
    }

    #[tokio::test]
    async fn test_seeding_does_not_clobber_concurrent_upload() {
        let store = Arc::new(SlowFirstWrite::default());
        store.armed.store(true, std::sync::atomic::Ordering::SeqCst);
        let repo = Arc::new(KvTrackRepository::new(
            store.clone(),
            Arc::new(ManualClock::new(1_700_000_000_000)),
        ));

        let lister = tokio::spawn({
            let repo = repo.clone();
            async move { repo.list().await }
        });
        store.entered.notified().await;

        let uploader = tokio::spawn({
            let repo = repo.clone();
            async move {
                repo.upload(UploadRequest::new("file:///a", "a.mp3"), &User::current())
                    .await
            }
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        store.release.notify_one();

        lister.await.unwrap().unwrap();
        let uploaded = uploader.await.unwrap().unwrap();

        let ids: Vec<_> = repo.list().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![uploaded.id]);
    }

    #[tokio::test]
    async fn test_toggle_like_twice_restores_count() {
        let (repo, _, clock) = repo();
        let track = upload(&repo, &clock, "a.mp3").await;

        assert!(repo.toggle_like(&track.id).await.unwrap());
        let liked = repo.get(&track.id).await.unwrap().unwrap();
        assert_eq!(liked.likes, 1);
        assert_eq!(repo.liked().await.unwrap().len(), 1);

        assert!(!repo.toggle_like(&track.id).await.unwrap());
        let restored = repo.get(&track.id).await.unwrap().unwrap();
        assert_eq!(restored.likes, 0);
        assert!(repo.liked().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_like_unknown_id_does_not_write() {
        let mut store = MockStore::new();
        store
            .expect_get_item()
            .returning(|_| Ok(Some("[]".to_string())));
        store.expect_set_item().times(0);

        let repo = KvTrackRepository::new(Arc::new(store), Arc::new(ManualClock::new(0)));
        assert!(!repo.toggle_like("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let (repo, _, clock) = repo();
        upload(&repo, &clock, "Midnight City.mp3").await;
        upload(&repo, &clock, "sunrise.mp3").await;

        let hits = repo.search("MIDNIGHT").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Midnight City");

        // Artist match
        assert_eq!(repo.search("neo user").await.unwrap().len(), 2);
        assert!(repo.search("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let (repo, _, clock) = repo();
        let track = upload(&repo, &clock, "a.mp3").await;

        assert!(repo.delete(&track.id).await.unwrap());
        assert!(!repo.delete(&track.id).await.unwrap());
        assert!(repo.get(&track.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_events_are_emitted() {
        let (repo, _, clock) = repo();
        let bus = EventBus::new(16);
        let mut events = bus.subscribe();
        let repo = repo.with_event_bus(bus);

        let track = upload(&repo, &clock, "a.mp3").await;
        repo.toggle_like(&track.id).await.unwrap();
        repo.delete(&track.id).await.unwrap();

        assert!(matches!(
            events.recv().await.unwrap(),
            CoreEvent::Library(LibraryEvent::TrackAdded { ref title, .. }) if title == "a"
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            CoreEvent::Library(LibraryEvent::TrackUpdated { .. })
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            CoreEvent::Library(LibraryEvent::TrackDeleted { .. })
        ));
    }

    #[tokio::test]
    async fn test_corrupt_collection_is_reported() {
        let (repo, store, _) = repo();
        store
            .set_item(DEFAULT_STORAGE_KEY, "{not json")
            .await
            .unwrap();

        assert!(matches!(
            repo.list().await,
            Err(LibraryError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_store_failure_is_propagated() {
        let mut store = MockStore::new();
        store
            .expect_get_item()
            .returning(|_| Err(BridgeError::DatabaseError("disk full".to_string())));

        let repo = KvTrackRepository::new(Arc::new(store), Arc::new(ManualClock::new(0)));
        assert!(matches!(repo.list().await, Err(LibraryError::Bridge(_))));
    }

    #[tokio::test]
    async fn test_custom_storage_key() {
        let (repo, store, _) = repo();
        let repo = repo.with_storage_key("songs_test");

        repo.list().await.unwrap();
        assert!(store.get_item("songs_test").await.unwrap().is_some());
        assert!(store.get_item(DEFAULT_STORAGE_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_current_user() {
        let (repo, _, _) = repo();
        let user = repo.current_user().await.unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.email, "neo@greenwave.fm");
    }
}
