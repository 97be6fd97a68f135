//! # Repository Pattern Implementation
//!
//! Repository traits define the data access interface; implementations sit
//! on top of host bridges so the same code runs against SQLite on desktop and
//! platform preferences on mobile.

pub mod track;

pub use track::{KvTrackRepository, TrackRepository};
