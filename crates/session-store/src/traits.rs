//! Storage trait definitions.

use crate::StorageResult;

/// Trait for session storage backends.
///
/// Writes are synchronous: a value set through one handle is visible
/// to every other reader in the process as soon as `set` returns.
pub trait SessionStore: Send + Sync {
    /// Store a value
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Retrieve a value
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Delete a value
    fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Check if a key exists
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
