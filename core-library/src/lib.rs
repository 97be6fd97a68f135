//! # Track Library Module
//!
//! Owns the persisted track collection and the repository used to read and
//! change it.
//!
//! ## Overview
//!
//! This module manages:
//! - `Track` / `User` domain models and their storage JSON shape
//! - The `TrackRepository` trait (list, search, upload, delete, like)
//! - `KvTrackRepository`, which stores the whole collection as one JSON
//!   document in a host `KeyValueStore`
//!
//! Changes are announced on the core event bus as `LibraryEvent`s.

pub mod error;
pub mod models;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use models::{Track, UploadRequest, User, CURRENT_USER_ID};
pub use repositories::{KvTrackRepository, TrackRepository};
