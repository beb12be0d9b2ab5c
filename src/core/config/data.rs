use super::io::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the state store inside the platform data directory.
pub const STORE_FILE_NAME: &str = "store.toml";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Where the state store lives; defaults to `store.toml` in the data dir
    pub store_path: Option<PathBuf>,
    /// Tracing filter used when `RUST_LOG` is unset (e.g. "info", "chatdeck=debug")
    pub log_filter: Option<String>,
}

impl Config {
    /// Set (`Some`) or clear (`None`) the value behind a `config set` key.
    pub fn set_value(&mut self, key: &str, value: Option<&str>) -> Result<(), ConfigError> {
        let value = value.map(str::trim).filter(|value| !value.is_empty());
        match key {
            "store-path" => self.store_path = value.map(PathBuf::from),
            "log-filter" => self.log_filter = value.map(str::to_string),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.local/share/chatdeck/store.toml` → `~/.local/share/chatdeck/store.toml`
/// - macOS: `/Users/user/Library/Application Support/...` → `~/Library/Application Support/...`
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
