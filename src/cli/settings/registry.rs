//! Registry of setting handlers.

use std::collections::HashMap;

use super::handlers::{
    frequency_penalty_handler, presence_penalty_handler, temperature_handler, top_p_handler,
    CredentialHandler, DefaultModelHandler, MaxTokensHandler, SystemMessageHandler, ThemeHandler,
};
use super::SettingHandler;

/// Registry of all available setting handlers.
pub struct SettingRegistry {
    handlers: HashMap<&'static str, Box<dyn SettingHandler>>,
    /// Keys in display order for `chatdeck set` output.
    display_order: Vec<&'static str>,
}

impl SettingRegistry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
            display_order: Vec::new(),
        };

        // Register handlers in display order
        registry.register(Box::new(ThemeHandler));
        registry.register(Box::new(CredentialHandler));
        registry.register(Box::new(SystemMessageHandler));
        registry.register(Box::new(DefaultModelHandler));
        registry.register(Box::new(MaxTokensHandler));
        registry.register(Box::new(temperature_handler()));
        registry.register(Box::new(top_p_handler()));
        registry.register(Box::new(presence_penalty_handler()));
        registry.register(Box::new(frequency_penalty_handler()));

        registry
    }

    fn register(&mut self, handler: Box<dyn SettingHandler>) {
        let key = handler.key();
        self.display_order.push(key);
        self.handlers.insert(key, handler);
    }

    /// Get a handler by key.
    pub fn get(&self, key: &str) -> Option<&dyn SettingHandler> {
        self.handlers.get(key).map(|h| h.as_ref())
    }

    /// Get all keys in display order.
    pub fn keys_display_order(&self) -> &[&'static str] {
        &self.display_order
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
