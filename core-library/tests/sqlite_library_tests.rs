//! Track library backed by the desktop SQLite key-value store

use bridge_desktop::SqliteKeyValueStore;
use bridge_traits::{KeyValueStore, ManualClock};
use core_library::{KvTrackRepository, TrackRepository, UploadRequest, User};
use std::sync::Arc;

#[tokio::test]
async fn test_collection_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("greenwave.db");
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));

    let uploaded = {
        let store = Arc::new(SqliteKeyValueStore::new(db_path.clone()).await.unwrap());
        let repo = KvTrackRepository::new(store, clock.clone());
        let track = repo
            .upload(
                UploadRequest::new("file:///picked/demo.m4a", "demo.m4a").with_title("Demo Take"),
                &User::current(),
            )
            .await
            .unwrap();
        repo.toggle_like(&track.id).await.unwrap();
        track
    };

    let store = Arc::new(SqliteKeyValueStore::new(db_path).await.unwrap());
    let repo = KvTrackRepository::new(store.clone(), clock);

    let tracks = repo.list().await.unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, uploaded.id);
    assert_eq!(tracks[0].title, "Demo Take");
    assert!(tracks[0].liked_by_user);
    assert_eq!(tracks[0].likes, 1);

    // Stored document keeps the mobile app's camelCase shape
    let raw = store.get_item("greenwave_songs_v1").await.unwrap().unwrap();
    assert!(raw.contains("\"likedByUser\":true"));
    assert!(raw.contains("\"coverUrl\""));
}

#[tokio::test]
async fn test_concurrent_likes_are_not_lost() {
    let store = Arc::new(SqliteKeyValueStore::in_memory().await.unwrap());
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let repo = Arc::new(KvTrackRepository::new(store, clock.clone()));
    let user = User::current();

    let mut ids = Vec::new();
    for i in 0..4 {
        let track = repo
            .upload(UploadRequest::new(format!("file:///{}.mp3", i), format!("{}.mp3", i)), &user)
            .await
            .unwrap();
        clock.advance_millis(10);
        ids.push(track.id);
    }

    let tasks: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move { repo.toggle_like(&id).await.unwrap() })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap());
    }

    assert_eq!(repo.liked().await.unwrap().len(), 4);
}
