//! Per-request generation settings
//!
//! A [`GenerationConfig`] is a plain value. Sessions hold their own copy, so
//! editing one session's settings never reaches the stored defaults or any
//! other session.

use crate::core::catalog::ModelId;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error as StdError;
use std::fmt;
use tracing::warn;

/// Completion budget applied to new sessions unless the user changes it.
pub const DEFAULT_USER_MAX_TOKENS: u32 = 4000;

pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);
pub const TOP_P_RANGE: (f64, f64) = (0.0, 1.0);
pub const PENALTY_RANGE: (f64, f64) = (-2.0, 2.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    #[serde(deserialize_with = "model_or_default")]
    pub model: ModelId,
    pub max_tokens: u32,
    pub temperature: f64,
    pub presence_penalty: f64,
    pub top_p: f64,
    pub frequency_penalty: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: ModelId::default(),
            max_tokens: DEFAULT_USER_MAX_TOKENS,
            temperature: 1.0,
            presence_penalty: 0.0,
            top_p: 1.0,
            frequency_penalty: 0.0,
        }
    }
}

/// Saved payloads may name models that were later dropped from the catalog.
/// Those fall back to the default model instead of failing the whole payload.
fn model_or_default<'de, D>(deserializer: D) -> Result<ModelId, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(ModelId::try_from(raw.as_str()).unwrap_or_else(|_| {
        let fallback = ModelId::default();
        warn!(model = %raw, %fallback, "unknown model in saved settings, using default");
        fallback
    }))
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationConfigError {
    ZeroMaxTokens,
    ExceedsModelLimit {
        model: ModelId,
        max_tokens: u32,
        limit: u32,
    },
    OutOfRange {
        setting: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl fmt::Display for GenerationConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationConfigError::ZeroMaxTokens => write!(f, "max-tokens must be at least 1"),
            GenerationConfigError::ExceedsModelLimit {
                model,
                max_tokens,
                limit,
            } => write!(
                f,
                "max-tokens {max_tokens} exceeds the {limit} token limit of {model}"
            ),
            GenerationConfigError::OutOfRange {
                setting,
                value,
                min,
                max,
            } => write!(f, "{setting} must be between {min} and {max} (got {value})"),
        }
    }
}

impl StdError for GenerationConfigError {}

fn check_range(
    setting: &'static str,
    value: f64,
    (min, max): (f64, f64),
) -> Result<(), GenerationConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(GenerationConfigError::OutOfRange {
            setting,
            value,
            min,
            max,
        })
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), GenerationConfigError> {
        if self.max_tokens == 0 {
            return Err(GenerationConfigError::ZeroMaxTokens);
        }
        let limit = self.model.limits().max_tokens;
        if self.max_tokens > limit {
            return Err(GenerationConfigError::ExceedsModelLimit {
                model: self.model,
                max_tokens: self.max_tokens,
                limit,
            });
        }
        check_range("temperature", self.temperature, TEMPERATURE_RANGE)?;
        check_range("top-p", self.top_p, TOP_P_RANGE)?;
        check_range("presence-penalty", self.presence_penalty, PENALTY_RANGE)?;
        check_range("frequency-penalty", self.frequency_penalty, PENALTY_RANGE)?;
        Ok(())
    }

    /// Completion budget capped to what the selected model accepts.
    pub fn effective_max_tokens(&self) -> u32 {
        self.max_tokens.min(self.model.limits().max_tokens)
    }
}
