//! Handlers for the default generation settings.
//!
//! Every handler validates the whole [`GenerationConfig`] after its change,
//! so combinations such as a budget above the model limit are rejected.
//!
//! [`GenerationConfig`]: crate::core::generation::GenerationConfig

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{parse_number, require_value, success_set, success_unset};
use crate::cli::settings::SettingHandler;
use crate::core::catalog::ModelId;
use crate::core::generation::GenerationConfig;
use crate::core::state::AppState;

pub struct DefaultModelHandler;

impl SettingHandler for DefaultModelHandler {
    fn key(&self) -> &'static str {
        "default-model"
    }

    /// Switching to a model with a smaller limit clamps `max-tokens` to it.
    fn set(&self, args: &[String], state: &mut AppState) -> Result<String, SettingError> {
        let value = require_value(
            args,
            "⚠️  Please specify a model (see 'chatdeck models')",
            "chatdeck set default-model gpt-4",
        )?;
        let model = ModelId::try_from(value.trim())
            .map_err(|_| SettingError::UnknownModel { input: value.clone() })?;

        let config = &mut state.default_generation_config;
        config.model = model;
        let clamped = config.effective_max_tokens();
        let message = if clamped != config.max_tokens {
            config.max_tokens = clamped;
            format!(
                "{} (max-tokens clamped to {clamped})",
                success_set(self.key(), model.as_str())
            )
        } else {
            success_set(self.key(), model.as_str())
        };
        config.validate()?;
        Ok(message)
    }

    fn unset(&self, state: &mut AppState) -> Result<String, SettingError> {
        let config = &mut state.default_generation_config;
        config.model = ModelId::default();
        config.max_tokens = config.effective_max_tokens();
        config.validate()?;
        Ok(success_unset(self.key(), config.model.as_str()))
    }

    fn format(&self, state: &AppState) -> String {
        format!("  default-model: {}", state.default_generation_config.model)
    }
}

pub struct MaxTokensHandler;

impl SettingHandler for MaxTokensHandler {
    fn key(&self) -> &'static str {
        "max-tokens"
    }

    fn set(&self, args: &[String], state: &mut AppState) -> Result<String, SettingError> {
        let value = require_value(
            args,
            "⚠️  Please specify a completion token budget",
            "chatdeck set max-tokens 2000",
        )?;
        let max_tokens: u32 = parse_number(self.key(), &value)?;
        state.default_generation_config.max_tokens = max_tokens;
        state.default_generation_config.validate()?;
        Ok(success_set(self.key(), &max_tokens.to_string()))
    }

    fn unset(&self, state: &mut AppState) -> Result<String, SettingError> {
        let config = &mut state.default_generation_config;
        config.max_tokens = GenerationConfig::default().max_tokens;
        config.max_tokens = config.effective_max_tokens();
        config.validate()?;
        Ok(success_unset(self.key(), &config.max_tokens.to_string()))
    }

    fn format(&self, state: &AppState) -> String {
        let config = &state.default_generation_config;
        format!(
            "  max-tokens: {} (model limit {})",
            config.max_tokens,
            config.model.limits().max_tokens
        )
    }
}

/// Handler for a floating point sampling setting.
pub struct SamplingHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    get: fn(&GenerationConfig) -> f64,
    set_field: fn(&mut GenerationConfig, f64),
}

impl SettingHandler for SamplingHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], state: &mut AppState) -> Result<String, SettingError> {
        let value = require_value(args, self.hint, self.example)?;
        let number: f64 = parse_number(self.key, &value)?;
        (self.set_field)(&mut state.default_generation_config, number);
        state.default_generation_config.validate()?;
        Ok(success_set(self.key, &number.to_string()))
    }

    fn unset(&self, state: &mut AppState) -> Result<String, SettingError> {
        let default = (self.get)(&GenerationConfig::default());
        (self.set_field)(&mut state.default_generation_config, default);
        Ok(success_unset(self.key, &default.to_string()))
    }

    fn format(&self, state: &AppState) -> String {
        format!(
            "  {}: {}",
            self.key,
            (self.get)(&state.default_generation_config)
        )
    }
}

pub fn temperature_handler() -> SamplingHandler {
    SamplingHandler {
        key: "temperature",
        hint: "⚠️  Please specify a temperature between 0 and 2",
        example: "chatdeck set temperature 0.7",
        get: |c| c.temperature,
        set_field: |c, v| c.temperature = v,
    }
}

pub fn top_p_handler() -> SamplingHandler {
    SamplingHandler {
        key: "top-p",
        hint: "⚠️  Please specify top-p between 0 and 1",
        example: "chatdeck set top-p 0.9",
        get: |c| c.top_p,
        set_field: |c, v| c.top_p = v,
    }
}

pub fn presence_penalty_handler() -> SamplingHandler {
    SamplingHandler {
        key: "presence-penalty",
        hint: "⚠️  Please specify a presence penalty between -2 and 2",
        example: "chatdeck set presence-penalty 0.5",
        get: |c| c.presence_penalty,
        set_field: |c, v| c.presence_penalty = v,
    }
}

pub fn frequency_penalty_handler() -> SamplingHandler {
    SamplingHandler {
        key: "frequency-penalty",
        hint: "⚠️  Please specify a frequency penalty between -2 and 2",
        example: "chatdeck set frequency-penalty 0.5",
        get: |c| c.frequency_penalty,
        set_field: |c, v| c.frequency_penalty = v,
    }
}
