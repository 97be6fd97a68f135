//! # Playback Module
//!
//! The playback session coordinator and its observable state.
//!
//! ## Overview
//!
//! This module handles:
//! - Song switching against an asynchronous [`AudioEngine`](bridge_traits::AudioEngine)
//!   with last-request-wins semantics
//! - Translating engine status snapshots into position, duration and play state
//! - Queue traversal (next, previous with scrub-back, auto-advance on completion)
//! - Publishing [`PlaybackSnapshot`]s to subscribers
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::PlaybackCoordinator;
//!
//! let coordinator = PlaybackCoordinator::builder(engine).event_bus(bus).build()?;
//! coordinator.play_song(track, Some(queue)).await?;
//!
//! let mut updates = coordinator.subscribe();
//! while updates.changed().await.is_ok() {
//!     let snapshot = updates.borrow().clone();
//!     render(snapshot.position_secs, snapshot.duration_secs);
//! }
//! ```

pub mod coordinator;
pub mod error;
pub mod publisher;
pub mod queue;
mod session;
pub mod status;

pub use coordinator::{PlaybackCoordinator, PlaybackCoordinatorBuilder, SwitchOutcome};
pub use error::{PlaybackError, Result};
pub use publisher::{PlaybackPublisher, PlaybackSnapshot, PlayerState};
pub use queue::Queue;
