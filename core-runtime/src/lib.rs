//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the Greenwave core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the library, playback and
//! service crates depend on. It establishes the logging conventions, the
//! bridge wiring performed at startup, and the event broadcasting used to
//! notify hosts about library and playback changes.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
