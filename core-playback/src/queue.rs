//! Play queue and its circular traversal rules.

use core_library::Track;

/// Ordered list of tracks the player walks through with next/previous.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Queue {
    tracks: Vec<Track>,
}

impl Queue {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn replace(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
    }

    pub fn push(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Index of the first track with `track_id`.
    pub fn position(&self, track_id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == track_id)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Index after `current_id`, wrapping to 0 past the end.
    ///
    /// A current track that is not in the queue maps to index 0.
    pub fn next_index(&self, current_id: &str) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }

        Some(match self.position(current_id) {
            Some(index) => (index + 1) % self.tracks.len(),
            None => 0,
        })
    }

    /// Index before `current_id`, wrapping to the last track before index 0.
    ///
    /// A current track that is not in the queue maps to the last index.
    pub fn previous_index(&self, current_id: &str) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }

        let last = self.tracks.len() - 1;
        Some(match self.position(current_id) {
            Some(0) | None => last,
            Some(index) => index - 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_library::User;

    fn track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            title: format!("Track {id}"),
            artist: "Neo User".to_string(),
            url: format!("file:///music/{id}.mp3"),
            cover_url: String::new(),
            uploaded_by: User::current(),
            duration: 0.0,
            created_at: 0,
            likes: 0,
            liked_by_user: false,
        }
    }

    fn queue(ids: &[&str]) -> Queue {
        Queue::new(ids.iter().map(|id| track(id)).collect())
    }

    #[test]
    fn test_empty_queue_has_no_neighbours() {
        let q = Queue::default();
        assert_eq!(q.next_index("a"), None);
        assert_eq!(q.previous_index("a"), None);
    }

    #[test]
    fn test_next_wraps_to_start() {
        let q = queue(&["a", "b", "c"]);
        assert_eq!(q.next_index("a"), Some(1));
        assert_eq!(q.next_index("c"), Some(0));
    }

    #[test]
    fn test_previous_wraps_to_end() {
        let q = queue(&["a", "b", "c"]);
        assert_eq!(q.previous_index("b"), Some(0));
        assert_eq!(q.previous_index("a"), Some(2));
    }

    #[test]
    fn test_missing_current_track() {
        let q = queue(&["a", "b", "c"]);
        assert_eq!(q.next_index("zzz"), Some(0));
        assert_eq!(q.previous_index("zzz"), Some(2));
    }

    #[test]
    fn test_single_track_queue_points_at_itself() {
        let q = queue(&["a"]);
        assert_eq!(q.next_index("a"), Some(0));
        assert_eq!(q.previous_index("a"), Some(0));
    }

    #[test]
    fn test_push_and_replace() {
        let mut q = queue(&["a"]);
        q.push(track("b"));
        assert_eq!(q.len(), 2);
        assert_eq!(q.position("b"), Some(1));

        q.replace(vec![track("c")]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.get(0).map(|t| t.id.as_str()), Some("c"));
    }
}
