//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host platform implements.
//!
//! ## Overview
//!
//! This crate defines the contract between the Greenwave core and the
//! platform it runs on. Each trait is a capability the core needs but that
//! must be provided differently per platform (desktop, iOS, Android).
//!
//! ## Traits
//!
//! ### Audio
//! - [`AudioEngine`](audio::AudioEngine) - Loads media into native player instances
//! - [`EngineHandle`](audio::EngineHandle) - Controls one loaded instance
//!
//! ### Storage
//! - [`KeyValueStore`](storage::KeyValueStore) - Persisted string key-value pairs
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//! | iOS      | host app            | 📋 Planned |
//! | Android  | host app            | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform-specific errors into it with actionable messages.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind an `Arc`.

pub mod audio;
pub mod error;
pub mod logging;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use audio::{
    AudioEngine, AudioSessionConfig, EngineHandle, HandleId, LoadOptions, PlaybackStatus,
    StatusCallback,
};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use storage::KeyValueStore;
pub use time::{Clock, ManualClock, SystemClock};
