//! # Playback Session Coordinator
//!
//! Owns the one playback session of the app and mediates every song change
//! against the asynchronous audio engine.
//!
//! ## Song switching
//!
//! Each switch claims a new *load epoch*. Load results and status snapshots
//! are tagged with the epoch that produced them and are applied only while
//! that epoch is still current, so the most recent request wins no matter in
//! which order the engine completes its loads. At most one engine handle is
//! attached at a time; every superseded handle is unloaded.
//!
//! ## Locking
//!
//! Session state sits behind a `parking_lot::Mutex` that is never held across
//! an `.await`. Snapshots and events are published while the lock is held so
//! subscribers observe mutations in order.

use std::sync::{Arc, Weak};

use bridge_traits::{
    AudioEngine, AudioSessionConfig, EngineHandle, LoadOptions, PlaybackStatus, StatusCallback,
};
use core_library::Track;
use core_runtime::config::PlayerConfig;
use core_runtime::events::{EventBus, PlaybackEvent};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{watch, OnceCell};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{PlaybackError, Result};
use crate::publisher::{PlaybackPublisher, PlaybackSnapshot};
use crate::session::{AttachedHandle, Phase, Session};
use crate::status::{secs_to_millis, StatusUpdate};

/// How a transport request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The requested track was loaded and attached.
    Loaded,
    /// The track was already current and visible; play/pause was toggled.
    Toggled,
    /// A newer request (or a close) overtook this one; nothing was applied.
    Superseded,
    /// "Previous" restarted the current track from the beginning.
    Restarted,
    /// Nothing to do: empty queue or no current track.
    Unchanged,
}

/// Builder for [`PlaybackCoordinator`].
pub struct PlaybackCoordinatorBuilder {
    engine: Arc<dyn AudioEngine>,
    config: PlayerConfig,
    audio_session: AudioSessionConfig,
    event_bus: Option<EventBus>,
}

impl PlaybackCoordinatorBuilder {
    pub fn config(mut self, config: PlayerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn audio_session(mut self, audio_session: AudioSessionConfig) -> Self {
        self.audio_session = audio_session;
        self
    }

    /// Broadcast playback transitions on `bus`.
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn build(self) -> Result<PlaybackCoordinator> {
        self.config.validate()?;

        Ok(PlaybackCoordinator {
            inner: Arc::new(Inner {
                engine: self.engine,
                config: self.config,
                audio_session: self.audio_session,
                session: Mutex::new(Session::new()),
                publisher: PlaybackPublisher::new(self.event_bus),
                session_configured: OnceCell::new(),
                runtime: Handle::try_current().ok(),
            }),
        })
    }
}

/// Coordinates the single playback session.
///
/// Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct PlaybackCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    engine: Arc<dyn AudioEngine>,
    config: PlayerConfig,
    audio_session: AudioSessionConfig,
    session: Mutex<Session>,
    publisher: PlaybackPublisher,
    session_configured: OnceCell<()>,
    /// Runtime for tasks spawned from engine threads
    runtime: Option<Handle>,
}

impl PlaybackCoordinator {
    pub fn builder(engine: Arc<dyn AudioEngine>) -> PlaybackCoordinatorBuilder {
        PlaybackCoordinatorBuilder {
            engine,
            config: PlayerConfig::default(),
            audio_session: AudioSessionConfig::default(),
            event_bus: None,
        }
    }

    /// Play `track`, optionally replacing the queue first.
    ///
    /// Re-selecting the current track while the player is visible toggles
    /// play/pause instead of reloading. Any other request runs a full song
    /// switch. A live load failure returns [`PlaybackError::LoadFailed`]
    /// after the session has been rolled back to a non-playing state; the
    /// track stays current so it can be retried.
    #[instrument(skip(self, track, queue), fields(track_id = %track.id))]
    pub async fn play_song(
        &self,
        track: Track,
        queue: Option<Vec<Track>>,
    ) -> Result<SwitchOutcome> {
        let toggle = self.inner.update(|session, events| {
            if let Some(queue) = queue {
                session.queue.replace(queue);
                events.push(PlaybackEvent::QueueChanged {
                    length: session.queue.len(),
                });
            }

            // After a failed load the phase is Idle with nothing attached, so
            // re-selecting the track retries instead of toggling nothing.
            session.visible
                && session.phase != Phase::Idle
                && session
                    .current_track
                    .as_ref()
                    .is_some_and(|current| current.id == track.id)
        });

        if toggle {
            debug!("Track already current, toggling playback");
            self.toggle_play().await;
            return Ok(SwitchOutcome::Toggled);
        }

        let (epoch, previous) = self.inner.update(|session, _| session.begin_switch());
        self.inner.run_switch(epoch, previous, track).await
    }

    /// Pause if playing, resume otherwise. No-op without an attached handle.
    pub async fn toggle_play(&self) {
        let Some((handle, was_playing)) = self.inner.attached_with_state() else {
            debug!("Toggle ignored, no engine handle attached");
            return;
        };

        let result = if was_playing {
            handle.pause().await
        } else {
            handle.play().await
        };

        if let Err(err) = result {
            warn!(error = %err, was_playing, "Failed to toggle playback");
            return;
        }

        self.inner.update(|session, events| {
            if !session.is_attached(handle.id()) {
                return;
            }
            session.playing = !was_playing;

            let Some(track) = &session.current_track else {
                return;
            };
            let track_id = track.id.clone();
            let position_ms = secs_to_millis(session.position_secs).max(0) as u64;
            events.push(if was_playing {
                PlaybackEvent::Paused {
                    track_id,
                    position_ms,
                }
            } else {
                PlaybackEvent::Resumed {
                    track_id,
                    position_ms,
                }
            });
        });
    }

    /// Move playback to `position_secs`. No-op without an attached handle.
    ///
    /// The value is passed to the engine unclamped.
    pub async fn seek(&self, position_secs: f64) {
        let Some(handle) = self.inner.attached_handle() else {
            debug!("Seek ignored, no engine handle attached");
            return;
        };

        if let Err(err) = handle.seek(secs_to_millis(position_secs)).await {
            warn!(error = %err, position_secs, "Failed to seek");
        }
    }

    /// Switch to the track after the current one, wrapping to the start.
    #[instrument(skip(self))]
    pub async fn next_song(&self) -> Result<SwitchOutcome> {
        let begun = self.inner.update(|session, _| {
            let next = session.next_track()?;
            Some((session.begin_switch(), next))
        });

        match begun {
            Some(((epoch, previous), next)) => self.inner.run_switch(epoch, previous, next).await,
            None => Ok(SwitchOutcome::Unchanged),
        }
    }

    /// Switch to the track before the current one, wrapping to the end.
    ///
    /// Once playback has passed the scrub-back threshold the current track is
    /// restarted instead.
    #[instrument(skip(self))]
    pub async fn previous_song(&self) -> Result<SwitchOutcome> {
        enum Step {
            Restart(Option<Arc<dyn EngineHandle>>),
            Switch(u64, Option<Arc<dyn EngineHandle>>, Track),
            Nothing,
        }

        let threshold = self.inner.config.scrub_back_threshold;
        let step = self.inner.update(|session, _| {
            if session.queue.is_empty() || session.current_track.is_none() {
                return Step::Nothing;
            }
            if session.position_secs >= threshold {
                return Step::Restart(session.attached_handle());
            }
            match session.previous_track() {
                Some(previous_track) => {
                    let (epoch, previous) = session.begin_switch();
                    Step::Switch(epoch, previous, previous_track)
                }
                None => Step::Nothing,
            }
        });

        match step {
            Step::Nothing => Ok(SwitchOutcome::Unchanged),
            Step::Restart(handle) => {
                debug!("Restarting current track");
                if let Some(handle) = handle {
                    if let Err(err) = handle.seek(0).await {
                        warn!(error = %err, "Failed to restart track");
                    }
                }
                Ok(SwitchOutcome::Restarted)
            }
            Step::Switch(epoch, previous, track) => {
                self.inner.run_switch(epoch, previous, track).await
            }
        }
    }

    /// Append `track` to the queue. Playback is unaffected.
    pub fn enqueue(&self, track: Track) {
        self.inner.update(|session, events| {
            session.queue.push(track);
            events.push(PlaybackEvent::QueueChanged {
                length: session.queue.len(),
            });
        });
    }

    /// Hide the player and stop audio.
    ///
    /// The current track and queue are kept. Stop and unload failures are
    /// logged and swallowed. Calling this again is a no-op.
    #[instrument(skip(self))]
    pub async fn close(&self) {
        let handle = self.inner.update(|session, events| {
            if session.visible {
                events.push(PlaybackEvent::VisibilityChanged { visible: false });
                if let Some(track) = &session.current_track {
                    events.push(PlaybackEvent::Stopped {
                        track_id: track.id.clone(),
                    });
                }
            }
            session.visible = false;
            session.playing = false;
            session.phase = Phase::Idle;
            session.detach()
        });

        if let Some(handle) = handle {
            if let Err(err) = handle.stop().await {
                debug!(error = %err, "Ignoring stop failure on close");
            }
            unload_quietly(handle.as_ref(), "close").await;
        }
    }

    /// Show or hide the player surface without touching audio.
    pub fn set_visible(&self, visible: bool) {
        self.inner.update(|session, events| {
            if session.visible != visible {
                session.visible = visible;
                events.push(PlaybackEvent::VisibilityChanged { visible });
            }
        });
    }

    /// Tear the session down: invalidate any in-flight load and release the
    /// attached handle.
    pub async fn shutdown(&self) {
        let handle = self.inner.update(|session, _| {
            session.load_epoch += 1;
            session.phase = Phase::Idle;
            session.playing = false;
            session.visible = false;
            session.detach()
        });

        if let Some(handle) = handle {
            unload_quietly(handle.as_ref(), "shutdown").await;
        }
        info!("Playback session shut down");
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.inner.publisher.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.inner.publisher.subscribe()
    }
}

impl Inner {
    /// Mutate the session and publish the result.
    ///
    /// `f` may queue events; they are emitted after the new snapshot.
    fn update<R>(&self, f: impl FnOnce(&mut Session, &mut Vec<PlaybackEvent>) -> R) -> R {
        let mut events = Vec::new();
        let mut session = self.session.lock();
        let result = f(&mut *session, &mut events);

        self.publisher.publish(session.snapshot());
        for event in events {
            self.publisher.emit(event);
        }
        result
    }

    fn attached_handle(&self) -> Option<Arc<dyn EngineHandle>> {
        self.session.lock().attached_handle()
    }

    fn attached_with_state(&self) -> Option<(Arc<dyn EngineHandle>, bool)> {
        let session = self.session.lock();
        let handle = session.attached_handle()?;
        Some((handle, session.playing))
    }

    /// Steps 2 to 8 of a song switch. `epoch` and `previous` come from
    /// [`Session::begin_switch`].
    async fn run_switch(
        self: &Arc<Self>,
        epoch: u64,
        previous: Option<Arc<dyn EngineHandle>>,
        track: Track,
    ) -> Result<SwitchOutcome> {
        if let Some(previous) = previous {
            unload_quietly(previous.as_ref(), "superseded").await;
        }

        let proceed = self.update(|session, events| {
            if !session.is_loading(epoch) {
                return false;
            }
            if !session.visible {
                events.push(PlaybackEvent::VisibilityChanged { visible: true });
            }
            session.current_track = Some(track.clone());
            session.visible = true;
            session.playing = false;
            session.position_secs = 0.0;
            session.duration_secs = 0.0;
            session.phase = Phase::Loading { epoch };
            true
        });
        if !proceed {
            debug!(epoch, "Switch superseded or closed while unloading");
            return Ok(SwitchOutcome::Superseded);
        }

        self.ensure_audio_session().await;

        debug!(epoch, track_id = %track.id, "Loading track");
        let loaded = self
            .engine
            .load(&track.url, LoadOptions::autoplay(), self.status_callback(epoch))
            .await;

        match loaded {
            Ok(handle) => {
                let attached = self.update(|session, events| {
                    if !session.is_loading(epoch) {
                        return false;
                    }
                    session.attached = Some(AttachedHandle {
                        epoch,
                        handle: Arc::clone(&handle),
                    });
                    session.phase = Phase::Ready;
                    session.playing = true;
                    events.push(PlaybackEvent::Started {
                        track_id: track.id.clone(),
                        title: track.title.clone(),
                    });
                    true
                });

                if attached {
                    info!(epoch, track_id = %track.id, "Track loaded");
                    Ok(SwitchOutcome::Loaded)
                } else {
                    debug!(epoch, track_id = %track.id, "Discarding superseded load");
                    unload_quietly(handle.as_ref(), "stale load").await;
                    Ok(SwitchOutcome::Superseded)
                }
            }
            Err(err) => {
                let live = self.update(|session, events| {
                    if !session.is_loading(epoch) {
                        return false;
                    }
                    session.playing = false;
                    session.phase = Phase::Idle;
                    events.push(PlaybackEvent::Error {
                        track_id: Some(track.id.clone()),
                        message: err.to_string(),
                        recoverable: true,
                    });
                    true
                });

                if live {
                    warn!(epoch, track_id = %track.id, error = %err, "Track failed to load");
                    Err(PlaybackError::LoadFailed {
                        track_id: track.id,
                        source: err,
                    })
                } else {
                    debug!(epoch, error = %err, "Discarding failure of superseded load");
                    Ok(SwitchOutcome::Superseded)
                }
            }
        }
    }

    /// Configure the host audio session once, before the first load.
    async fn ensure_audio_session(&self) {
        self.session_configured
            .get_or_init(|| async {
                if let Err(err) = self.engine.configure_session(self.audio_session).await {
                    warn!(error = %err, "Failed to configure audio session");
                }
            })
            .await;
    }

    fn status_callback(self: &Arc<Self>, epoch: u64) -> StatusCallback {
        let weak: Weak<Inner> = Arc::downgrade(self);
        Arc::new(move |status: PlaybackStatus| {
            if let Some(inner) = weak.upgrade() {
                inner.on_status(epoch, &status);
            }
        })
    }

    fn on_status(self: &Arc<Self>, epoch: u64, status: &PlaybackStatus) {
        let Some(update) = StatusUpdate::from_status(status) else {
            return;
        };

        let completed = self.update(|session, events| {
            if !session.accepts_status(epoch) {
                trace!(epoch, "Ignoring status from stale handle");
                return false;
            }

            let moved = session.position_secs != update.position_secs
                || session.duration_secs != update.duration_secs;
            session.position_secs = update.position_secs;
            session.duration_secs = update.duration_secs;
            session.playing = update.playing;

            let Some(track) = &session.current_track else {
                return false;
            };
            if moved {
                events.push(PlaybackEvent::PositionChanged {
                    track_id: track.id.clone(),
                    position_ms: status.position_millis,
                    duration_ms: status.duration_millis.unwrap_or(0),
                });
            }
            if update.completed {
                events.push(PlaybackEvent::Completed {
                    track_id: track.id.clone(),
                });
            }
            update.completed
        });

        if completed {
            self.spawn_advance(epoch);
        }
    }

    fn spawn_advance(self: &Arc<Self>, completed_epoch: u64) {
        let runtime = Handle::try_current().ok().or_else(|| self.runtime.clone());
        match runtime {
            Some(runtime) => {
                runtime.spawn(Arc::clone(self).advance_after_completion(completed_epoch));
            }
            None => warn!(epoch = completed_epoch, "No runtime available to auto-advance"),
        }
    }

    /// Move to the next track after a natural completion, reading the queue
    /// and current track as they are now.
    async fn advance_after_completion(self: Arc<Self>, completed_epoch: u64) {
        let begun = self.update(|session, _| {
            // A short clip can finish before its load resolves
            if !session.accepts_status(completed_epoch) {
                return None;
            }
            let next = session.next_track()?;
            Some((session.begin_switch(), next))
        });

        let Some(((epoch, previous), next)) = begun else {
            debug!(epoch = completed_epoch, "Auto-advance skipped");
            return;
        };

        if let Err(err) = self.run_switch(epoch, previous, next).await {
            warn!(epoch, error = %err, "Auto-advance failed");
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let Some(handle) = self.session.get_mut().detach() else {
            return;
        };

        match Handle::try_current().ok().or_else(|| self.runtime.clone()) {
            Some(runtime) => {
                runtime.spawn(async move {
                    unload_quietly(handle.as_ref(), "coordinator dropped").await;
                });
            }
            None => debug!(handle = ?handle.id(), "No runtime to unload handle on drop"),
        }
    }
}

async fn unload_quietly(handle: &dyn EngineHandle, reason: &'static str) {
    if let Err(err) = handle.unload().await {
        debug!(handle = ?handle.id(), reason, error = %err, "Ignoring unload failure");
    }
}
