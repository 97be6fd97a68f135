//! Timer-driven stand-in for a native audio engine.
//!
//! Desktop builds have no platform player to delegate to, so this engine
//! fakes one: every loaded instance runs a tokio task that advances the
//! playback position while "playing" and reports status snapshots through the
//! registered callback, including the end-of-track snapshot. No audio is
//! produced. Useful for demos, integration tests and UI development.

use async_trait::async_trait;
use bridge_traits::{
    audio::{
        AudioEngine, AudioSessionConfig, EngineHandle, HandleId, LoadOptions, PlaybackStatus,
        StatusCallback,
    },
    error::{BridgeError, Result},
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Timing knobs for [`SimulatedAudioEngine`].
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    /// Interval between status snapshots.
    pub tick: Duration,
    /// Duration reported for URLs without an explicit duration.
    pub default_duration: Duration,
    /// Artificial delay before `load` resolves.
    pub load_latency: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(500),
            default_duration: Duration::from_secs(180),
            load_latency: Duration::from_millis(50),
        }
    }
}

/// Audio engine that simulates playback with timers.
pub struct SimulatedAudioEngine {
    config: SimulationConfig,
    durations: Mutex<HashMap<String, Duration>>,
    failing_urls: Mutex<HashSet<String>>,
    session: Mutex<Option<AudioSessionConfig>>,
    loads: AtomicUsize,
}

impl SimulatedAudioEngine {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            durations: Mutex::new(HashMap::new()),
            failing_urls: Mutex::new(HashSet::new()),
            session: Mutex::new(None),
            loads: AtomicUsize::new(0),
        }
    }

    /// Report `duration` for instances loaded from `url`.
    pub fn set_track_duration(&self, url: impl Into<String>, duration: Duration) {
        self.durations.lock().insert(url.into(), duration);
    }

    /// Make every future load of `url` fail.
    pub fn fail_url(&self, url: impl Into<String>) {
        self.failing_urls.lock().insert(url.into());
    }

    /// Number of load attempts so far, failed ones included.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Session settings last applied through `configure_session`.
    pub fn session_config(&self) -> Option<AudioSessionConfig> {
        *self.session.lock()
    }
}

impl Default for SimulatedAudioEngine {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

#[async_trait]
impl AudioEngine for SimulatedAudioEngine {
    async fn load(
        &self,
        url: &str,
        options: LoadOptions,
        on_status: StatusCallback,
    ) -> Result<Arc<dyn EngineHandle>> {
        self.loads.fetch_add(1, Ordering::SeqCst);

        if !self.config.load_latency.is_zero() {
            tokio::time::sleep(self.config.load_latency).await;
        }

        if self.failing_urls.lock().contains(url) {
            return Err(BridgeError::Engine(format!("cannot load {}", url)));
        }

        let duration = self
            .durations
            .lock()
            .get(url)
            .copied()
            .unwrap_or(self.config.default_duration);

        let handle = SimulatedHandle::start(url, duration, options, self.config.tick, on_status);
        info!(handle = %handle.id, url = url, "Simulated instance loaded");
        Ok(handle)
    }

    async fn configure_session(&self, config: AudioSessionConfig) -> Result<()> {
        *self.session.lock() = Some(config);
        Ok(())
    }
}

#[derive(Debug)]
struct SimState {
    loaded: bool,
    playing: bool,
    looping: bool,
    position_millis: u64,
    duration_millis: u64,
}

impl SimState {
    fn status(&self, did_just_finish: bool) -> PlaybackStatus {
        if !self.loaded {
            return PlaybackStatus::unloaded();
        }
        PlaybackStatus {
            is_loaded: true,
            position_millis: self.position_millis,
            duration_millis: Some(self.duration_millis),
            is_playing: self.playing,
            did_just_finish,
            is_looping: self.looping,
        }
    }

    /// Advance by `step` while playing. Returns `true` on reaching the end.
    fn advance(&mut self, step: u64) -> bool {
        if !self.loaded || !self.playing {
            return false;
        }
        self.position_millis += step;
        if self.position_millis < self.duration_millis {
            return false;
        }
        if self.looping {
            self.position_millis = 0;
            false
        } else {
            self.position_millis = self.duration_millis;
            self.playing = false;
            true
        }
    }
}

struct SimulatedHandle {
    id: HandleId,
    state: Arc<Mutex<SimState>>,
    on_status: StatusCallback,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedHandle {
    fn start(
        url: &str,
        duration: Duration,
        options: LoadOptions,
        tick: Duration,
        on_status: StatusCallback,
    ) -> Arc<Self> {
        let state = Arc::new(Mutex::new(SimState {
            loaded: true,
            playing: options.autoplay,
            looping: options.looping,
            position_millis: 0,
            duration_millis: duration.as_millis() as u64,
        }));

        let handle = Arc::new(Self {
            id: HandleId::new(),
            state: Arc::clone(&state),
            on_status: Arc::clone(&on_status),
            ticker: Mutex::new(None),
        });

        let step = tick.as_millis() as u64;
        let id = handle.id;
        let url = url.to_string();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.tick().await;
            loop {
                interval.tick().await;
                let status = {
                    let mut state = state.lock();
                    if !state.loaded {
                        break;
                    }
                    let finished = state.advance(step);
                    state.status(finished)
                };
                if status.did_just_finish {
                    debug!(handle = %id, url = %url, "Simulated track finished");
                }
                on_status(status);
            }
        });
        *handle.ticker.lock() = Some(task);

        handle.emit(false);
        handle
    }

    fn emit(&self, did_just_finish: bool) {
        let status = self.state.lock().status(did_just_finish);
        (self.on_status)(status);
    }

    fn with_loaded<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut SimState),
    {
        {
            let mut state = self.state.lock();
            if !state.loaded {
                return Err(BridgeError::Engine(format!("instance {} is unloaded", self.id)));
            }
            f(&mut state);
        }
        self.emit(false);
        Ok(())
    }
}

#[async_trait]
impl EngineHandle for SimulatedHandle {
    fn id(&self) -> HandleId {
        self.id
    }

    async fn play(&self) -> Result<()> {
        self.with_loaded(|state| {
            if state.position_millis >= state.duration_millis {
                state.position_millis = 0;
            }
            state.playing = true;
        })
    }

    async fn pause(&self) -> Result<()> {
        self.with_loaded(|state| state.playing = false)
    }

    async fn seek(&self, position_millis: i64) -> Result<()> {
        self.with_loaded(|state| {
            let clamped = position_millis.clamp(0, state.duration_millis as i64);
            state.position_millis = clamped as u64;
        })
    }

    async fn stop(&self) -> Result<()> {
        self.with_loaded(|state| {
            state.playing = false;
            state.position_millis = 0;
        })
    }

    async fn unload(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            state.loaded = false;
            state.playing = false;
        }
        if let Some(task) = self.ticker.lock().take() {
            task.abort();
        }
        debug!(handle = %self.id, "Simulated instance unloaded");
        Ok(())
    }
}
