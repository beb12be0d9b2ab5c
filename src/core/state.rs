//! Structured application state, as persisted under the `app-state` key.

use crate::core::generation::GenerationConfig;
use crate::core::message::Message;
use crate::core::session::ChatSession;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful assistant. You can help me by answering my questions. You can also ask me questions. Respond using markdown and LaTeX with the following math delimiters, for example:

Latex (inline): $ \\lambda_{n} $

Latex (block):
$$
A = \\pi r^2
$$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub const ALL: [Theme; 2] = [Theme::Light, Theme::Dark];

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown theme: {s}"))
    }
}

/// Everything the client persists between runs.
///
/// Once startup reconciliation has run, `sessions` is non-empty and
/// `current_index` points into it. The index is signed so that corrupt
/// values written by other clients still decode and can be repaired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub sessions: Vec<ChatSession>,
    pub current_index: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
    pub theme: Theme,
    pub default_system_message: String,
    pub default_generation_config: GenerationConfig,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
            current_index: 0,
            credential: None,
            theme: Theme::default(),
            default_system_message: DEFAULT_SYSTEM_MESSAGE.to_string(),
            default_generation_config: GenerationConfig::default(),
        }
    }
}

impl AppState {
    pub fn index_in_range(&self) -> bool {
        usize::try_from(self.current_index)
            .map(|index| index < self.sessions.len())
            .unwrap_or(false)
    }

    pub fn current_session(&self) -> Option<&ChatSession> {
        usize::try_from(self.current_index)
            .ok()
            .and_then(|index| self.sessions.get(index))
    }

    /// Decode a stored payload that failed to decode as a whole, one field
    /// at a time.
    ///
    /// Unreadable fields take their defaults, unreadable messages are dropped
    /// from their session, and a session that still does not decode is
    /// skipped on its own. Returns `None` when the payload is not a JSON
    /// object at all.
    pub fn salvage(raw: &str) -> Option<AppState> {
        let Ok(Value::Object(mut fields)) = serde_json::from_str::<Value>(raw) else {
            return None;
        };
        let mut state = AppState::default();

        match fields.remove("sessions") {
            Some(Value::Array(items)) => {
                let total = items.len();
                state.sessions = items.into_iter().filter_map(salvage_session).collect();
                if state.sessions.len() < total {
                    warn!(
                        dropped = total - state.sessions.len(),
                        "skipping unreadable stored sessions"
                    );
                }
            }
            Some(Value::Null) | None => {}
            Some(_) => warn!("stored sessions are not a list, ignoring them"),
        }
        take_field(&mut fields, "currentIndex", &mut state.current_index);
        take_field(&mut fields, "credential", &mut state.credential);
        take_field(&mut fields, "theme", &mut state.theme);
        take_field(
            &mut fields,
            "defaultSystemMessage",
            &mut state.default_system_message,
        );
        take_field(
            &mut fields,
            "defaultGenerationConfig",
            &mut state.default_generation_config,
        );

        Some(state)
    }
}

fn take_field<T: DeserializeOwned>(fields: &mut Map<String, Value>, key: &str, slot: &mut T) {
    let Some(value) = fields.remove(key) else {
        return;
    };
    match serde_json::from_value(value) {
        Ok(decoded) => *slot = decoded,
        Err(err) => warn!(field = key, error = %err, "stored field is unreadable, using default"),
    }
}

fn salvage_session(value: Value) -> Option<ChatSession> {
    if let Ok(session) = ChatSession::deserialize(&value) {
        return Some(session);
    }
    let Value::Object(mut fields) = value else {
        return None;
    };

    if let Some(Value::Array(messages)) = fields.remove("messages") {
        let total = messages.len();
        let kept: Vec<Value> = messages
            .into_iter()
            .filter(|message| Message::deserialize(message).is_ok())
            .collect();
        if kept.len() < total {
            warn!(dropped = total - kept.len(), "dropping unreadable stored messages");
        }
        fields.insert("messages".to_string(), Value::Array(kept));
    }
    if let Ok(session) = ChatSession::deserialize(&Value::Object(fields.clone())) {
        return Some(session);
    }

    warn!("stored session settings are unreadable, using defaults");
    fields.remove("config");
    ChatSession::deserialize(&Value::Object(fields)).ok()
}
