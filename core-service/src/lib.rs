//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (audio engine,
//! key-value storage, clock, log sink) into the shared Rust core and hands
//! the app one context object holding the track library and the single
//! playback session. Desktop apps typically enable the `desktop-shims`
//! feature, which lets [`CoreConfig`] fall back to the simulated engine and
//! the SQLite-backed store from `bridge-desktop`.
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use core_service::{CoreService, PlaybackContext};
//!
//! let core = CoreService::new(CoreConfig::builder().build()?)?;
//! let liked = core.library().liked().await?;
//! core.play_from_library(&liked[0].id, PlaybackContext::Liked).await?;
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use core_library::{KvTrackRepository, Track, TrackRepository, UploadRequest};
use core_playback::{PlaybackCoordinator, SwitchOutcome};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream};
use core_runtime::logging::{init_logging, LoggingConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Which list a track was picked from; that list becomes the play queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "query", rename_all = "lowercase")]
pub enum PlaybackContext {
    /// The whole library, newest first
    All,
    Liked,
    /// Search results for the query
    Search(String),
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    library: Arc<dyn TrackRepository>,
    playback: PlaybackCoordinator,
    events: EventBus,
}

impl CoreService {
    /// Create the service from a built configuration.
    ///
    /// When the configuration carries a host log sink, logging is initialized
    /// to forward into it (a no-op if a subscriber is already installed).
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        if let Some(sink) = &config.logger_sink {
            let logging = LoggingConfig::default().with_logger_sink(Arc::clone(sink));
            if let Err(err) = init_logging(logging) {
                debug!(error = %err, "Logging already initialized, keeping existing subscriber");
            }
        }

        let events = EventBus::new(config.player.event_buffer_size);

        let library: Arc<dyn TrackRepository> = Arc::new(
            KvTrackRepository::new(Arc::clone(&config.kv_store), Arc::clone(&config.clock))
                .with_storage_key(config.library.storage_key.clone())
                .with_event_bus(events.clone()),
        );

        let playback = PlaybackCoordinator::builder(Arc::clone(&config.audio_engine))
            .config(config.player.clone())
            .audio_session(config.audio_session)
            .event_bus(events.clone())
            .build()?;

        info!(
            storage_key = %config.library.storage_key,
            scrub_back_threshold = config.player.scrub_back_threshold,
            "Core service initialized"
        );

        Ok(Self {
            library,
            playback,
            events,
        })
    }

    pub fn library(&self) -> Arc<dyn TrackRepository> {
        Arc::clone(&self.library)
    }

    /// The app's single playback session.
    pub fn playback(&self) -> &PlaybackCoordinator {
        &self.playback
    }

    /// Subscribe to library and playback events.
    pub fn events(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    /// Start `track_id` with the list it was picked from as the queue.
    pub async fn play_from_library(
        &self,
        track_id: &str,
        context: PlaybackContext,
    ) -> Result<SwitchOutcome> {
        let queue = match &context {
            PlaybackContext::All => self.library.list().await?,
            PlaybackContext::Liked => self.library.liked().await?,
            PlaybackContext::Search(query) => self.library.search(query).await?,
        };

        let track = match queue.iter().find(|t| t.id == track_id) {
            Some(track) => track.clone(),
            None => self
                .library
                .get(track_id)
                .await?
                .ok_or_else(|| CoreError::TrackNotFound(track_id.to_string()))?,
        };

        debug!(track_id, ?context, queue_len = queue.len(), "Playing from library");
        Ok(self.playback.play_song(track, Some(queue)).await?)
    }

    /// Add a picked file to the library as the current user.
    pub async fn upload(&self, request: UploadRequest) -> Result<Track> {
        let user = self.library.current_user().await?;
        Ok(self.library.upload(request, &user).await?)
    }

    /// Stop playback and release the engine handle.
    pub async fn shutdown(&self) {
        self.playback.shutdown().await;
    }
}

