//! Translation of engine status snapshots into session updates.

use bridge_traits::PlaybackStatus;

/// Session fields derived from one accepted engine status snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusUpdate {
    pub position_secs: f64,
    /// 0 while the engine has not reported a duration
    pub duration_secs: f64,
    pub playing: bool,
    /// End of track reached naturally (not a manual stop, not looping)
    pub completed: bool,
}

impl StatusUpdate {
    /// Translate a snapshot. Returns `None` for "not loaded" snapshots, which
    /// carry no usable position and must be ignored.
    pub fn from_status(status: &PlaybackStatus) -> Option<Self> {
        if !status.is_loaded {
            return None;
        }

        Some(Self {
            position_secs: millis_to_secs(status.position_millis),
            duration_secs: status.duration_millis.map(millis_to_secs).unwrap_or(0.0),
            playing: status.is_playing,
            completed: status.is_natural_completion(),
        })
    }
}

fn millis_to_secs(millis: u64) -> f64 {
    millis as f64 / 1000.0
}

/// Seconds to engine milliseconds, rounded. Out-of-range input is passed
/// through; the engine clamps.
pub fn secs_to_millis(secs: f64) -> i64 {
    (secs * 1000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unloaded_snapshot_is_ignored() {
        assert_eq!(StatusUpdate::from_status(&PlaybackStatus::unloaded()), None);
    }

    #[test]
    fn test_loaded_snapshot_translation() {
        let update = StatusUpdate::from_status(&PlaybackStatus::loaded(12_500, Some(180_000), true))
            .unwrap();

        assert_eq!(update.position_secs, 12.5);
        assert_eq!(update.duration_secs, 180.0);
        assert!(update.playing);
        assert!(!update.completed);
    }

    #[test]
    fn test_unknown_duration_is_zero() {
        let update =
            StatusUpdate::from_status(&PlaybackStatus::loaded(1_000, None, false)).unwrap();
        assert_eq!(update.duration_secs, 0.0);
    }

    #[test]
    fn test_completion_requires_not_looping() {
        let finished = StatusUpdate::from_status(&PlaybackStatus::finished(90_000)).unwrap();
        assert!(finished.completed);

        let looping = PlaybackStatus {
            is_looping: true,
            ..PlaybackStatus::finished(90_000)
        };
        assert!(!StatusUpdate::from_status(&looping).unwrap().completed);
    }

    #[test]
    fn test_secs_to_millis_is_unclamped() {
        assert_eq!(secs_to_millis(0.0), 0);
        assert_eq!(secs_to_millis(1.2345), 1235);
        assert_eq!(secs_to_millis(-2.0), -2000);
        assert_eq!(secs_to_millis(10_000.0), 10_000_000);
    }
}
