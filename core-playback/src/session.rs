//! Mutable session state owned by the coordinator.

use std::sync::Arc;

use bridge_traits::{EngineHandle, HandleId};
use core_library::Track;

use crate::publisher::{PlaybackSnapshot, PlayerState};
use crate::queue::Queue;

/// Where the session is in its load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Loading { epoch: u64 },
    /// An engine handle is attached; `Session::playing` tells playing from paused.
    Ready,
}

/// The single engine instance the session currently controls.
pub(crate) struct AttachedHandle {
    /// Epoch of the load that produced the handle
    pub epoch: u64,
    pub handle: Arc<dyn EngineHandle>,
}

pub(crate) struct Session {
    pub current_track: Option<Track>,
    pub queue: Queue,
    pub load_epoch: u64,
    pub phase: Phase,
    pub playing: bool,
    pub position_secs: f64,
    pub duration_secs: f64,
    pub visible: bool,
    pub attached: Option<AttachedHandle>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            current_track: None,
            queue: Queue::default(),
            load_epoch: 0,
            phase: Phase::Idle,
            playing: false,
            position_secs: 0.0,
            duration_secs: 0.0,
            visible: false,
            attached: None,
        }
    }

    pub fn state(&self) -> PlayerState {
        match self.phase {
            Phase::Idle => PlayerState::Idle,
            Phase::Loading { .. } => PlayerState::Loading,
            Phase::Ready if self.playing => PlayerState::Playing,
            Phase::Ready => PlayerState::Paused,
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            current_track: self.current_track.clone(),
            queue: self.queue.tracks().to_vec(),
            state: self.state(),
            playing: self.playing,
            position_secs: self.position_secs,
            duration_secs: self.duration_secs,
            visible: self.visible,
            load_epoch: self.load_epoch,
        }
    }

    pub fn attached_handle(&self) -> Option<Arc<dyn EngineHandle>> {
        self.attached.as_ref().map(|a| Arc::clone(&a.handle))
    }

    pub fn detach(&mut self) -> Option<Arc<dyn EngineHandle>> {
        self.attached.take().map(|a| a.handle)
    }

    pub fn is_attached(&self, id: HandleId) -> bool {
        self.attached.as_ref().is_some_and(|a| a.handle.id() == id)
    }

    pub fn is_attached_epoch(&self, epoch: u64) -> bool {
        self.attached.as_ref().is_some_and(|a| a.epoch == epoch)
    }

    /// Whether a status snapshot from the load tagged `epoch` may touch the
    /// session: the epoch must be current, and its load must still be in
    /// flight or have produced the attached handle.
    pub fn accepts_status(&self, epoch: u64) -> bool {
        self.is_loading(epoch) || (epoch == self.load_epoch && self.is_attached_epoch(epoch))
    }

    /// Step 1 of a song switch: claim a new epoch, mark it loading and detach
    /// the current handle. The caller unloads the returned handle.
    ///
    /// Anything that moves the phase off `Loading { epoch }` before the switch
    /// reaches its optimistic update (a `close`, say) aborts the switch.
    pub fn begin_switch(&mut self) -> (u64, Option<Arc<dyn EngineHandle>>) {
        self.load_epoch += 1;
        self.phase = Phase::Loading {
            epoch: self.load_epoch,
        };
        (self.load_epoch, self.detach())
    }

    /// Whether the switch tagged `epoch` is still the one in flight.
    pub fn is_loading(&self, epoch: u64) -> bool {
        self.load_epoch == epoch && self.phase == (Phase::Loading { epoch })
    }

    fn neighbour(&self, pick: impl FnOnce(&Queue, &str) -> Option<usize>) -> Option<Track> {
        let current = self.current_track.as_ref()?;
        let index = pick(&self.queue, &current.id)?;
        self.queue.get(index).cloned()
    }

    pub fn next_track(&self) -> Option<Track> {
        self.neighbour(Queue::next_index)
    }

    pub fn previous_track(&self) -> Option<Track> {
        self.neighbour(Queue::previous_index)
    }
}
