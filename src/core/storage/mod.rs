//! Flat key-value storage used to persist client state.
//!
//! The reconciliation controller only ever sees named string entries; how
//! they reach disk is up to the [`KeyValueStore`] implementation.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::core::config::data::path_display;
use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

/// Structured [`AppState`](crate::core::state::AppState), JSON-encoded.
pub const APP_STATE_KEY: &str = "app-state";
/// Copy of an `app-state` payload that could not be decoded in full.
pub const APP_STATE_BACKUP_KEY: &str = "app-state-backup";
/// Legacy JSON array of sessions.
pub const LEGACY_SESSIONS_KEY: &str = "chats";
/// Legacy plain-text credential.
pub const LEGACY_CREDENTIAL_KEY: &str = "apiKey";
/// Legacy plain-text theme name.
pub const LEGACY_THEME_KEY: &str = "theme";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Removing a key that is not present is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Errors raised by storage backends.
#[derive(Debug)]
pub enum StoreError {
    /// The store file exists but could not be read.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The store file is not a valid key-value document.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Writing the store file failed.
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    Serialize(toml::ser::Error),
    /// The structured state could not be encoded.
    Encode(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Read { path, source } => {
                write!(f, "Failed to read store at {}: {}", path_display(path), source)
            }
            StoreError::Parse { path, source } => {
                write!(f, "Failed to parse store at {}: {}", path_display(path), source)
            }
            StoreError::Write { path, source } => {
                write!(f, "Failed to write store at {}: {}", path_display(path), source)
            }
            StoreError::Serialize(source) => write!(f, "Failed to serialize store: {source}"),
            StoreError::Encode(source) => write!(f, "Failed to encode app state: {source}"),
        }
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StoreError::Read { source, .. } | StoreError::Write { source, .. } => Some(source),
            StoreError::Parse { source, .. } => Some(source),
            StoreError::Serialize(source) => Some(source),
            StoreError::Encode(source) => Some(source),
        }
    }
}
