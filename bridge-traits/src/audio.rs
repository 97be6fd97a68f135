//! Audio engine bridge traits and status types.
//!
//! The core never decodes or mixes audio itself. Hosts hand it an
//! [`AudioEngine`] that can load a media locator into a native player
//! instance and report progress back through asynchronous status snapshots.
//! Each loaded instance is represented by an [`EngineHandle`].
//!
//! The contract mirrors what mobile audio stacks (AVPlayer, ExoPlayer,
//! HTMLAudioElement) already provide:
//!
//! - `load` is asynchronous and may fail.
//! - Every control call on a handle is asynchronous and may fail. Failures of
//!   `stop`/`unload` must be tolerated by callers.
//! - Status snapshots arrive at an engine-determined cadence while the
//!   instance is loaded. An unloaded instance must stop emitting them.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Identifier of one loaded-audio instance inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleId(Uuid);

impl HandleId {
    /// Generate a new handle identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Options supplied alongside a load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// Start playing as soon as the media is ready.
    pub autoplay: bool,
    /// Loop the track instead of finishing.
    pub looping: bool,
}

impl LoadOptions {
    /// Options for a load that starts playing immediately.
    pub fn autoplay() -> Self {
        Self {
            autoplay: true,
            looping: false,
        }
    }
}

/// Process-wide audio session behaviour requested from the host.
///
/// Applied once before the first load. Hosts that have no equivalent setting
/// may ignore individual flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSessionConfig {
    /// Keep playing when the app moves to the background.
    pub stays_active_in_background: bool,
    /// Play even when the device's silent switch is on (iOS).
    pub plays_in_silent_mode: bool,
    /// Lower the volume of other apps instead of stopping them (Android).
    pub duck_others: bool,
    /// Route audio through the earpiece instead of the speaker (Android).
    pub play_through_earpiece: bool,
}

impl Default for AudioSessionConfig {
    fn default() -> Self {
        Self {
            stays_active_in_background: true,
            plays_in_silent_mode: true,
            duck_others: true,
            play_through_earpiece: false,
        }
    }
}

/// Status snapshot emitted by an engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaybackStatus {
    /// Whether the instance currently holds loaded media.
    pub is_loaded: bool,
    /// Current playback position in milliseconds.
    pub position_millis: u64,
    /// Total duration in milliseconds, if the engine knows it yet.
    pub duration_millis: Option<u64>,
    /// Whether audio is audibly playing.
    pub is_playing: bool,
    /// Set on the single snapshot that reports reaching end-of-track.
    pub did_just_finish: bool,
    /// Whether the instance is in loop mode.
    pub is_looping: bool,
}

impl PlaybackStatus {
    /// Snapshot reported for an instance that holds no media.
    pub fn unloaded() -> Self {
        Self::default()
    }

    /// Snapshot for a loaded instance at the given position.
    pub fn loaded(position_millis: u64, duration_millis: Option<u64>, is_playing: bool) -> Self {
        Self {
            is_loaded: true,
            position_millis,
            duration_millis,
            is_playing,
            did_just_finish: false,
            is_looping: false,
        }
    }

    /// Snapshot reporting natural end-of-track.
    pub fn finished(duration_millis: u64) -> Self {
        Self {
            is_loaded: true,
            position_millis: duration_millis,
            duration_millis: Some(duration_millis),
            is_playing: false,
            did_just_finish: true,
            is_looping: false,
        }
    }

    /// `true` when the track ended by itself and will not loop.
    pub fn is_natural_completion(&self) -> bool {
        self.is_loaded && self.did_just_finish && !self.is_looping
    }
}

/// Callback invoked by the engine for every status snapshot.
pub type StatusCallback = Arc<dyn Fn(PlaybackStatus) + Send + Sync>;

/// One loaded-audio instance inside the host engine.
#[async_trait]
pub trait EngineHandle: Send + Sync {
    /// Stable identifier of this instance.
    fn id(&self) -> HandleId;

    /// Begin or resume playback.
    async fn play(&self) -> Result<()>;

    /// Pause playback, keeping the position.
    async fn pause(&self) -> Result<()>;

    /// Move to an absolute position in milliseconds.
    ///
    /// Values outside `[0, duration]` are passed through as-is; clamping is
    /// the engine's responsibility.
    async fn seek(&self, position_millis: i64) -> Result<()>;

    /// Stop playback and rewind.
    async fn stop(&self) -> Result<()>;

    /// Release the instance. No status snapshots are emitted afterwards.
    async fn unload(&self) -> Result<()>;
}

impl fmt::Debug for dyn EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle").field("id", &self.id()).finish()
    }
}

/// Host audio engine capable of loading media into player instances.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::audio::{AudioEngine, LoadOptions, PlaybackStatus};
/// use std::sync::Arc;
///
/// async fn start(engine: &dyn AudioEngine) -> bridge_traits::error::Result<()> {
///     let on_status = Arc::new(|status: PlaybackStatus| {
///         println!("at {} ms", status.position_millis);
///     });
///     let handle = engine
///         .load("https://cdn.example.com/song.mp3", LoadOptions::autoplay(), on_status)
///         .await?;
///     handle.pause().await?;
///     handle.unload().await
/// }
/// ```
#[async_trait]
pub trait AudioEngine: Send + Sync {
    /// Load `url` into a new player instance and register `on_status`.
    async fn load(
        &self,
        url: &str,
        options: LoadOptions,
        on_status: StatusCallback,
    ) -> Result<Arc<dyn EngineHandle>>;

    /// Apply process-wide audio session settings.
    async fn configure_session(&self, _config: AudioSessionConfig) -> Result<()> {
        Ok(())
    }
}
