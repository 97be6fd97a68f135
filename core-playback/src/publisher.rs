//! # Playback State Publisher
//!
//! Observable read model of the playback session. The coordinator
//! republishes a [`PlaybackSnapshot`] after every session mutation; UI
//! layers either poll [`PlaybackPublisher::snapshot`] or await changes on a
//! [`watch::Receiver`]. Discrete transitions additionally go out on the
//! shared [`EventBus`].

use core_library::Track;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::trace;

/// Coarse player state shown by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    /// Nothing loaded (initial state, after close, or after a failed load)
    #[default]
    Idle,
    /// A load is in flight
    Loading,
    Playing,
    Paused,
}

/// Read-only view of the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub current_track: Option<Track>,
    pub queue: Vec<Track>,
    pub state: PlayerState,
    pub playing: bool,
    pub position_secs: f64,
    pub duration_secs: f64,
    pub visible: bool,
    pub load_epoch: u64,
}

impl PlaybackSnapshot {
    /// Playback progress in `[0, 1]`, 0 while the duration is unknown.
    pub fn progress(&self) -> f64 {
        if self.duration_secs <= 0.0 {
            return 0.0;
        }
        (self.position_secs / self.duration_secs).clamp(0.0, 1.0)
    }
}

/// Publishes session snapshots and playback events.
#[derive(Debug)]
pub struct PlaybackPublisher {
    sender: watch::Sender<PlaybackSnapshot>,
    event_bus: Option<EventBus>,
}

impl PlaybackPublisher {
    pub fn new(event_bus: Option<EventBus>) -> Self {
        let (sender, _) = watch::channel(PlaybackSnapshot::default());
        Self { sender, event_bus }
    }

    /// Store `snapshot` and wake subscribers if it differs from the last one.
    ///
    /// Returns whether anything changed.
    pub fn publish(&self, snapshot: PlaybackSnapshot) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        })
    }

    pub fn emit(&self, event: PlaybackEvent) {
        let Some(bus) = &self.event_bus else {
            return;
        };

        if bus.emit(CoreEvent::Playback(event)).is_err() {
            trace!("Playback event dropped, no subscribers");
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_notifies_only_on_change() {
        let publisher = PlaybackPublisher::new(None);
        let mut rx = publisher.subscribe();

        assert!(!publisher.publish(PlaybackSnapshot::default()));
        assert!(!rx.has_changed().unwrap());

        let snapshot = PlaybackSnapshot {
            visible: true,
            load_epoch: 1,
            ..Default::default()
        };
        assert!(publisher.publish(snapshot.clone()));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), snapshot);
        assert_eq!(publisher.snapshot(), snapshot);
    }

    #[test]
    fn test_publish_without_subscribers_still_updates() {
        let publisher = PlaybackPublisher::new(None);
        publisher.publish(PlaybackSnapshot {
            playing: true,
            ..Default::default()
        });
        assert!(publisher.snapshot().playing);
    }

    #[tokio::test]
    async fn test_emit_forwards_to_bus() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let publisher = PlaybackPublisher::new(Some(bus));

        publisher.emit(PlaybackEvent::QueueChanged { length: 3 });

        assert_eq!(
            rx.recv().await.unwrap(),
            CoreEvent::Playback(PlaybackEvent::QueueChanged { length: 3 })
        );
    }

    #[test]
    fn test_progress() {
        let mut snapshot = PlaybackSnapshot::default();
        assert_eq!(snapshot.progress(), 0.0);

        snapshot.position_secs = 30.0;
        snapshot.duration_secs = 120.0;
        assert_eq!(snapshot.progress(), 0.25);

        snapshot.position_secs = 500.0;
        assert_eq!(snapshot.progress(), 1.0);
    }

    #[test]
    fn test_state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&PlayerState::Paused).unwrap(),
            "\"paused\""
        );
    }
}
