//! Key-Value Storage Abstraction
//!
//! Provides a platform-agnostic trait for small persisted string values:
//! - **iOS**: `NSUserDefaults` or a file in the app container
//! - **Android**: `SharedPreferences` / DataStore
//! - **Desktop**: SQLite table (see `bridge-desktop`)
//! - **Web**: `localStorage` / IndexedDB
//!
//! Values are opaque strings; callers serialize structured data (usually
//! JSON) themselves.

use async_trait::async_trait;

use crate::error::Result;

/// Persistent string key-value store.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::KeyValueStore;
///
/// async fn remember_theme(store: &dyn KeyValueStore) -> Result<()> {
///     store.set_item("theme", "dark").await?;
///     assert_eq!(store.get_item("theme").await?.as_deref(), Some("dark"));
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove_item(&self, key: &str) -> Result<()>;

    /// Check if a key exists.
    async fn contains_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_item(key).await?.is_some())
    }
}
