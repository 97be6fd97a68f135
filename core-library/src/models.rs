//! Domain models for the track library
//!
//! Field names serialize in camelCase so the persisted collection keeps the
//! same JSON shape as the mobile app's storage.

use serde::{Deserialize, Serialize};

/// Identifier of the single signed-in user.
pub const CURRENT_USER_ID: &str = "u1";

/// A person who can upload tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Avatar image locator
    pub avatar: String,
}

impl User {
    /// The fixed local user every upload is attributed to.
    pub fn current() -> Self {
        Self {
            id: CURRENT_USER_ID.to_string(),
            name: "Neo User".to_string(),
            email: "neo@greenwave.fm".to_string(),
            avatar: "https://picsum.photos/200".to_string(),
        }
    }
}

/// Playable track with its library metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Unique, stable identifier
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Playable media locator
    pub url: String,
    /// Artwork locator
    pub cover_url: String,
    pub uploaded_by: User,
    /// Duration in seconds, 0 while unknown
    pub duration: f64,
    /// Creation time (Unix epoch milliseconds)
    pub created_at: i64,
    pub likes: u32,
    pub liked_by_user: bool,
}

impl Track {
    /// Validate track data
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Track id cannot be empty".to_string());
        }

        if self.title.trim().is_empty() {
            return Err("Track title cannot be empty".to_string());
        }

        if self.url.trim().is_empty() {
            return Err("Track url cannot be empty".to_string());
        }

        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(format!("Track duration {} is invalid", self.duration));
        }

        Ok(())
    }

    /// Case-insensitive substring match on title or artist.
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.artist.to_lowercase().contains(needle)
    }

    /// Flip the liked flag and adjust the like count. Returns the new flag.
    pub fn toggle_like(&mut self) -> bool {
        self.liked_by_user = !self.liked_by_user;
        self.likes = if self.liked_by_user {
            self.likes.saturating_add(1)
        } else {
            self.likes.saturating_sub(1)
        };
        self.liked_by_user
    }
}

/// A picked media file to add to the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Locator of the picked file; becomes the track's `url`
    pub uri: String,
    /// Original file name, used as the title fallback
    pub file_name: String,
    /// User supplied title; blank means "derive from file name"
    pub title: Option<String>,
}

impl UploadRequest {
    pub fn new(uri: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            file_name: file_name.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// The title to store: the given one, else the file name minus its extension.
    pub fn resolved_title(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => strip_extension(&self.file_name).to_string(),
        }
    }
}

fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(dot) if dot > 0 && !file_name[dot + 1..].contains('/') && dot + 1 < file_name.len() => {
            &file_name[..dot]
        }
        _ => file_name,
    }
}
