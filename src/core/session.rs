//! Chat sessions and the factory that creates them.

use crate::core::generation::GenerationConfig;
use crate::core::message::Message;
use crate::core::state::AppState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to sessions created without one.
pub const DEFAULT_TITLE: &str = "New Chat";

/// One conversation thread and the settings used to continue it.
///
/// The serialized shape matches the payloads written by earlier releases, so
/// the same type decodes both the legacy `chats` entry and the structured
/// state. Fields older payloads may lack fall back to fresh values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    #[serde(default = "new_session_id")]
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    /// Whether the user chose the title; `false` lets the conversation layer
    /// derive one from the first exchange.
    #[serde(default)]
    pub title_set: bool,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub config: GenerationConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

/// 128-bit random session identifier.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

/// Build a new session from the defaults currently held in `state`.
///
/// The system prompt and generation settings are read at call time, so later
/// changes to the defaults only affect sessions created afterwards.
pub fn create_session(
    state: &AppState,
    title: Option<String>,
    folder: Option<String>,
) -> ChatSession {
    let messages = if state.default_system_message.is_empty() {
        Vec::new()
    } else {
        vec![Message::system(state.default_system_message.clone())]
    };

    ChatSession {
        id: new_session_id(),
        title: title
            .filter(|title| !title.is_empty())
            .unwrap_or_else(default_title),
        title_set: false,
        messages,
        config: state.default_generation_config.clone(),
        folder,
    }
}
