//! # Playback Error Types
//!
//! Error types for playback session operations.

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
///
/// Most engine failures never reach callers: pause/resume/seek failures are
/// recovered inside the coordinator and only logged. What remains is the
/// outcome of a live song switch.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The engine could not load the current track.
    ///
    /// The session has already been rolled back (`playing = false`) when
    /// this is returned; the track stays current so the UI can offer retry.
    #[error("Failed to load track {track_id}: {source}")]
    LoadFailed {
        track_id: String,
        #[source]
        source: BridgeError,
    },

    /// The coordinator was built with an invalid configuration.
    #[error("Invalid player configuration: {0}")]
    Config(#[from] core_runtime::error::Error),
}

impl PlaybackError {
    /// Returns `true` if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            PlaybackError::LoadFailed { source, .. } => {
                !matches!(source, BridgeError::NotAvailable(_))
            }
            PlaybackError::Config(_) => false,
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
