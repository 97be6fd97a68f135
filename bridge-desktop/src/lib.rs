//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `KeyValueStore` using an SQLite table ([`SqliteKeyValueStore`])
//! - `AudioEngine` simulated with tokio timers ([`SimulatedAudioEngine`])
//!
//! Mobile hosts ship their own adapters backed by the platform player and
//! preference storage.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{SimulatedAudioEngine, SqliteKeyValueStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(SqliteKeyValueStore::new("greenwave.db".into()).await.unwrap());
//!     let engine = Arc::new(SimulatedAudioEngine::default());
//!     // Use in core configuration
//! }
//! ```

mod kv_store;
mod simulated_engine;

pub use kv_store::SqliteKeyValueStore;
pub use simulated_engine::{SimulatedAudioEngine, SimulationConfig};
