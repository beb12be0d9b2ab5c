use super::{KeyValueStore, StoreError};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Key-value entries kept in a single TOML document.
///
/// The whole document is held in memory and rewritten atomically (temp file
/// plus rename) on every change, so a crash mid-write leaves the previous
/// version intact.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|source| StoreError::Read {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&contents).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), keys = entries.len(), "opened store");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        let parent = self.path.parent().filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(write_err)?;
        }

        let contents = toml::to_string_pretty(&self.entries).map_err(StoreError::Serialize)?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(write_err)?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(write_err)?;
        temp_file.as_file_mut().sync_all().map_err(write_err)?;
        temp_file
            .persist(&self.path)
            .map_err(|err| write_err(err.error))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_opens_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::open(temp_dir.path().join("store.toml")).expect("open");
        assert_eq!(store.get("chats").unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn entries_survive_reopen() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("nested").join("store.toml");

        let mut store = FileStore::open(&path).expect("open");
        store.set("theme", "light").expect("set theme");
        store
            .set("chats", "[{\"title\":\"a \\\"quoted\\\" title\"}]\nsecond line")
            .expect("set chats");
        store.remove("theme").expect("remove theme");

        let reopened = FileStore::open(&path).expect("reopen");
        assert_eq!(reopened.get("theme").unwrap(), None);
        assert_eq!(
            reopened.get("chats").unwrap().as_deref(),
            Some("[{\"title\":\"a \\\"quoted\\\" title\"}]\nsecond line")
        );
    }

    #[test]
    fn removing_absent_key_does_not_create_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("store.toml");
        let mut store = FileStore::open(&path).expect("open");
        store.remove("apiKey").expect("remove");
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_reports_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("store.toml");
        fs::write(&path, "this is = = not toml").expect("write");

        let err = FileStore::open(&path).expect_err("corrupt store");
        assert!(matches!(err, StoreError::Parse { .. }));
        assert!(err.to_string().contains("store.toml"));
    }
}
