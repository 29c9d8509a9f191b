//! Persistent session storage for the PeopleHub client core.
//!
//! This crate provides:
//! - A `SessionStore` trait for synchronous key/value session caches
//! - A JSON-file-backed implementation that survives process restarts
//! - A `SessionVault` typed facade over the raw store
//! - The narrow `CredentialStore` capability the HTTP gateway holds

mod file;
mod keys;
mod traits;
mod types;
mod vault;

pub use file::FileStore;
pub use keys::SessionKeys;
pub use traits::SessionStore;
pub use types::{CompanyContext, CompanyProfile, NavItem, UserProfile};
pub use vault::{CredentialStore, SessionVault};

use std::path::PathBuf;
use thiserror::Error;

/// Error type for session storage operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend failure (file unreadable, poisoned lock, ...)
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StoreError>;

/// Create a vault backed by the default file store at the given path.
pub fn create_vault(path: PathBuf) -> StorageResult<SessionVault> {
    let store = FileStore::open(path)?;
    Ok(SessionVault::new(Box::new(store)))
}
