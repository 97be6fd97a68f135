//! # Core Configuration Module
//!
//! Provides configuration management for the Greenwave core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all bridges and settings required by the library and
//! playback crates. It enforces fail-fast validation so that a missing
//! capability is reported at startup instead of at the first tap on a song.
//!
//! ## Required Dependencies
//!
//! - `AudioEngine` - Loads and controls native player instances
//! - `KeyValueStore` - Persists the track collection
//!
//! ## Optional Dependencies (with defaults)
//!
//! - `Clock` - Time source (default: [`SystemClock`])
//! - `LoggerSink` - Host log forwarding (default: none)
//!
//! When the `desktop-shims` feature is enabled, desktop defaults are injected
//! for missing bridges: a [`SimulatedAudioEngine`](bridge_desktop::SimulatedAudioEngine)
//! and a [`SqliteKeyValueStore`](bridge_desktop::SqliteKeyValueStore) stored at
//! `database_path` (in memory, with a warning, when no path is given).
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, PlayerConfig};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .audio_engine(Arc::new(MyAudioEngine))
//!     .kv_store(Arc::new(MyPreferences))
//!     .player(PlayerConfig {
//!         scrub_back_threshold: 5.0,
//!         ..PlayerConfig::default()
//!     })
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! Without `desktop-shims`, a missing bridge is reported with an actionable
//! message:
//!
//! ```ignore
//! use core_runtime::{config::CoreConfig, Error};
//!
//! let err = CoreConfig::builder().build().unwrap_err();
//! assert!(matches!(err, Error::CapabilityMissing { .. }));
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{
    AudioEngine, AudioSessionConfig, Clock, KeyValueStore, LoggerSink, SystemClock,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Storage key of the persisted track collection.
pub const DEFAULT_STORAGE_KEY: &str = "greenwave_songs_v1";

/// Position (seconds) past which "previous" restarts the current track.
pub const DEFAULT_SCRUB_BACK_THRESHOLD_SECS: f64 = 3.0;

/// Core configuration for the Greenwave core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Host audio engine (required)
    pub audio_engine: Arc<dyn AudioEngine>,

    /// Persistent key-value storage (required)
    pub kv_store: Arc<dyn KeyValueStore>,

    /// Time source
    pub clock: Arc<dyn Clock>,

    /// Optional host log sink
    pub logger_sink: Option<Arc<dyn LoggerSink>>,

    /// Audio session behaviour applied before the first load
    pub audio_session: AudioSessionConfig,

    /// Playback tuning
    pub player: PlayerConfig,

    /// Track library settings
    pub library: LibraryConfig,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("audio_engine", &"AudioEngine { ... }")
            .field("kv_store", &"KeyValueStore { ... }")
            .field("clock", &"Clock { ... }")
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .field("audio_session", &self.audio_session)
            .field("player", &self.player)
            .field("library", &self.library)
            .finish()
    }
}

/// Playback coordinator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// "Previous" restarts the current track instead of changing tracks once
    /// playback has passed this many seconds.
    pub scrub_back_threshold: f64,

    /// Capacity of the event bus channel.
    pub event_buffer_size: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            scrub_back_threshold: DEFAULT_SCRUB_BACK_THRESHOLD_SECS,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl PlayerConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.scrub_back_threshold.is_finite() || self.scrub_back_threshold < 0.0 {
            return Err(Error::Config(format!(
                "scrub_back_threshold must be a non-negative number of seconds, got {}",
                self.scrub_back_threshold
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "event_buffer_size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > 10_000 {
            return Err(Error::Config(
                "event_buffer_size exceeds maximum of 10,000 events".to_string(),
            ));
        }

        Ok(())
    }
}

/// Track library settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Key under which the track collection is stored.
    pub storage_key: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl LibraryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(Error::Config("storage_key cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        self.player.validate()?;
        self.library.validate()?;
        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_audio_engine() -> Result<Arc<dyn AudioEngine>> {
    Err(Error::CapabilityMissing {
        capability: "AudioEngine".to_string(),
        message: "AudioEngine implementation is required for playback. \
                 Desktop: enable the 'desktop-shims' feature to use the SimulatedAudioEngine. \
                 Mobile: inject an adapter over the platform player (AVPlayer/ExoPlayer)."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_audio_engine() -> Result<Arc<dyn AudioEngine>> {
    use bridge_desktop::SimulatedAudioEngine;

    let engine: Arc<dyn AudioEngine> = Arc::new(SimulatedAudioEngine::default());
    Ok(engine)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_kv_store(_database_path: Option<PathBuf>) -> Result<Arc<dyn KeyValueStore>> {
    Err(Error::CapabilityMissing {
        capability: "KeyValueStore".to_string(),
        message: "KeyValueStore implementation is required for the track library. \
                 Desktop: enable the 'desktop-shims' feature to use the SqliteKeyValueStore. \
                 Mobile: inject platform preferences storage (UserDefaults/DataStore)."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_kv_store(database_path: Option<PathBuf>) -> Result<Arc<dyn KeyValueStore>> {
    use bridge_desktop::SqliteKeyValueStore;
    use std::thread;
    use tokio::runtime::{Builder, Handle};

    let init_store = move || -> Result<SqliteKeyValueStore> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::Internal(format!(
                    "Failed to create Tokio runtime for default KeyValueStore: {}",
                    e
                ))
            })?;

        runtime
            .block_on(async {
                match database_path {
                    Some(path) => SqliteKeyValueStore::new(path).await,
                    None => {
                        tracing::warn!(
                            "No database path configured; the track library will not survive a restart"
                        );
                        SqliteKeyValueStore::in_memory().await
                    }
                }
            })
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default KeyValueStore: {}", e))
            })
    };

    // block_on panics inside a runtime, so build on a scratch thread there
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(init_store).join().map_err(|_| {
            Error::Internal(
                "Worker thread panicked while creating default KeyValueStore".to_string(),
            )
        })??,
        Err(_) => init_store()?,
    };

    let store: Arc<dyn KeyValueStore> = Arc::new(store);
    Ok(store)
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    audio_engine: Option<Arc<dyn AudioEngine>>,
    kv_store: Option<Arc<dyn KeyValueStore>>,
    clock: Option<Arc<dyn Clock>>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
    database_path: Option<PathBuf>,
    audio_session: Option<AudioSessionConfig>,
    player: Option<PlayerConfig>,
    library: Option<LibraryConfig>,
}

impl CoreConfigBuilder {
    /// Sets the audio engine bridge.
    pub fn audio_engine(mut self, engine: Arc<dyn AudioEngine>) -> Self {
        self.audio_engine = Some(engine);
        self
    }

    /// Sets the key-value storage bridge.
    pub fn kv_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.kv_store = Some(store);
        self
    }

    /// Sets the time source.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the host log sink.
    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Location of the desktop default key-value database.
    ///
    /// Only consulted when no `kv_store` is set and `desktop-shims` is enabled.
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the audio session behaviour.
    pub fn audio_session(mut self, config: AudioSessionConfig) -> Self {
        self.audio_session = Some(config);
        self
    }

    /// Sets playback tuning.
    pub fn player(mut self, config: PlayerConfig) -> Self {
        self.player = Some(config);
        self
    }

    /// Sets track library settings.
    pub fn library(mut self, config: LibraryConfig) -> Self {
        self.library = Some(config);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns an error if:
    /// - A required bridge is missing and no desktop default is available
    ///   (`Error::CapabilityMissing`)
    /// - Configuration values are invalid (`Error::Config`)
    pub fn build(self) -> Result<CoreConfig> {
        let audio_engine = match self.audio_engine {
            Some(engine) => engine,
            None => provide_default_audio_engine()?,
        };

        let kv_store = match self.kv_store {
            Some(store) => store,
            None => provide_default_kv_store(self.database_path)?,
        };

        let config = CoreConfig {
            audio_engine,
            kv_store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            logger_sink: self.logger_sink,
            audio_session: self.audio_session.unwrap_or_default(),
            player: self.player.unwrap_or_default(),
            library: self.library.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}
