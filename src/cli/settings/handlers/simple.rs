//! Handlers for single-value settings.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{require_value, success_set, success_unset};
use crate::cli::settings::SettingHandler;
use crate::core::state::{AppState, Theme, DEFAULT_SYSTEM_MESSAGE};

pub struct ThemeHandler;

impl SettingHandler for ThemeHandler {
    fn key(&self) -> &'static str {
        "theme"
    }

    fn set(&self, args: &[String], state: &mut AppState) -> Result<String, SettingError> {
        let value = require_value(
            args,
            "⚠️  Please specify a theme (light or dark)",
            "chatdeck set theme light",
        )?;
        let theme: Theme = value
            .trim()
            .parse()
            .map_err(|_| SettingError::UnknownTheme { input: value.clone() })?;
        state.theme = theme;
        Ok(success_set(self.key(), theme.as_str()))
    }

    fn unset(&self, state: &mut AppState) -> Result<String, SettingError> {
        state.theme = Theme::default();
        Ok(success_unset(self.key(), state.theme.as_str()))
    }

    fn format(&self, state: &AppState) -> String {
        format!("  theme: {}", state.theme)
    }
}

pub struct CredentialHandler;

impl SettingHandler for CredentialHandler {
    fn key(&self) -> &'static str {
        "credential"
    }

    fn set(&self, args: &[String], state: &mut AppState) -> Result<String, SettingError> {
        let value = require_value(
            args,
            "⚠️  Please specify the provider credential",
            "chatdeck set credential sk-...",
        )?;
        state.credential = Some(value.trim().to_string());
        Ok(format!("Set {}", self.key()))
    }

    fn unset(&self, state: &mut AppState) -> Result<String, SettingError> {
        state.credential = None;
        Ok(success_unset(self.key(), "(unset)"))
    }

    fn format(&self, state: &AppState) -> String {
        match &state.credential {
            Some(_) => "  credential: (set)".to_string(),
            None => "  credential: (unset)".to_string(),
        }
    }
}

pub struct SystemMessageHandler;

impl SettingHandler for SystemMessageHandler {
    fn key(&self) -> &'static str {
        "system-message"
    }

    /// An empty value is allowed and means new sessions start without a
    /// system message.
    fn set(&self, args: &[String], state: &mut AppState) -> Result<String, SettingError> {
        let value = args.join(" ");
        state.default_system_message = value.clone();
        if value.is_empty() {
            Ok(format!("Set {} to: (none)", self.key()))
        } else {
            Ok(success_set(self.key(), &value))
        }
    }

    fn unset(&self, state: &mut AppState) -> Result<String, SettingError> {
        state.default_system_message = DEFAULT_SYSTEM_MESSAGE.to_string();
        Ok(success_unset(self.key(), "built-in default"))
    }

    fn format(&self, state: &AppState) -> String {
        let first_line = state.default_system_message.lines().next().unwrap_or("");
        if first_line.is_empty() {
            "  system-message: (none)".to_string()
        } else if state.default_system_message == DEFAULT_SYSTEM_MESSAGE {
            format!("  system-message: {first_line} (default)")
        } else {
            format!("  system-message: {first_line}")
        }
    }
}
