//! Settings management for the CLI set/unset commands.
//!
//! Every key maps to a [`SettingHandler`] that edits the stored defaults:
//!
//! - Simple settings (`theme`, `credential`, `system-message`)
//! - Generation defaults (`default-model`, `max-tokens`, `temperature`,
//!   `top-p`, `presence-penalty`, `frequency-penalty`)
//!
//! Handlers work on a copy of the state. The copy is only written back when
//! the handler succeeds, so a rejected value leaves the store untouched.

pub mod error;
pub mod handlers;
pub mod helpers;
pub mod registry;

pub use error::SettingError;
pub use registry::SettingRegistry;

use crate::core::state::AppState;
use crate::core::storage::KeyValueStore;
use crate::core::store::Store;

/// Trait for handling a stored default.
pub trait SettingHandler: Send + Sync {
    /// Returns the key this handler manages.
    fn key(&self) -> &'static str;

    /// Set the value from the arguments given after the key.
    ///
    /// Returns a success message to display, or an error.
    fn set(&self, args: &[String], state: &mut AppState) -> Result<String, SettingError>;

    /// Reset the value to its built-in default.
    fn unset(&self, state: &mut AppState) -> Result<String, SettingError>;

    /// Format the current value for display in `chatdeck set` output.
    fn format(&self, state: &AppState) -> String;
}

/// Apply `chatdeck set <key> <args...>` to the store.
pub fn apply_setting<B: KeyValueStore>(
    store: &mut Store<B>,
    key: &str,
    args: &[String],
) -> Result<String, SettingError> {
    let registry = SettingRegistry::new();
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;

    let mut working = store.state().clone();
    let message = handler.set(args, &mut working)?;
    store.mutate(|state| *state = working)?;
    Ok(message)
}

/// Apply `chatdeck unset <key>` to the store.
pub fn clear_setting<B: KeyValueStore>(
    store: &mut Store<B>,
    key: &str,
) -> Result<String, SettingError> {
    let registry = SettingRegistry::new();
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;

    let mut working = store.state().clone();
    let message = handler.unset(&mut working)?;
    store.mutate(|state| *state = working)?;
    Ok(message)
}

/// Print every setting with its current value.
pub fn print_settings(state: &AppState) {
    let registry = SettingRegistry::new();
    println!("Available settings:");
    for key in registry.keys_display_order() {
        if let Some(handler) = registry.get(key) {
            println!("{}", handler.format(state));
        }
    }
}
