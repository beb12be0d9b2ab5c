//! Error types for settings operations.

use crate::core::generation::GenerationConfigError;
use crate::core::storage::StoreError;
use std::fmt;

/// Errors that can occur when changing stored defaults.
#[derive(Debug)]
pub enum SettingError {
    /// The provided setting key is not recognized.
    UnknownKey(String),
    /// The provided model is not in the catalog.
    UnknownModel { input: String },
    /// The provided theme name is not recognized.
    UnknownTheme { input: String },
    /// The provided value could not be parsed as a number.
    InvalidNumber { key: &'static str, input: String },
    /// The resulting generation settings are out of range.
    InvalidSetting(GenerationConfigError),
    /// Required arguments are missing.
    MissingArgs {
        hint: &'static str,
        example: &'static str,
    },
    /// An error occurred while persisting the state.
    Store(StoreError),
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => write!(f, "Unknown setting: {key}"),
            SettingError::UnknownModel { input } => write!(
                f,
                "Unknown model: {input}. Run 'chatdeck models' to list supported models."
            ),
            SettingError::UnknownTheme { input } => {
                write!(f, "Unknown theme: {input}. Use 'light' or 'dark'.")
            }
            SettingError::InvalidNumber { key, input } => {
                write!(f, "Invalid number for {key}: {input}")
            }
            SettingError::InvalidSetting(err) => write!(f, "{err}"),
            SettingError::MissingArgs { hint, example } => {
                write!(f, "{hint}\nExample: {example}")
            }
            SettingError::Store(err) => write!(f, "Failed to save settings: {err}"),
        }
    }
}

impl std::error::Error for SettingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingError::InvalidSetting(err) => Some(err),
            SettingError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for SettingError {
    fn from(err: StoreError) -> Self {
        SettingError::Store(err)
    }
}

impl From<GenerationConfigError> for SettingError {
    fn from(err: GenerationConfigError) -> Self {
        SettingError::InvalidSetting(err)
    }
}
