//! Helper functions for settings operations.

use std::str::FromStr;

use super::error::SettingError;

/// Join the arguments after the key, failing with a usage hint when empty.
pub fn require_value(
    args: &[String],
    hint: &'static str,
    example: &'static str,
) -> Result<String, SettingError> {
    let value = args.join(" ");
    if value.trim().is_empty() {
        return Err(SettingError::MissingArgs { hint, example });
    }
    Ok(value)
}

pub fn parse_number<T: FromStr>(key: &'static str, input: &str) -> Result<T, SettingError> {
    input
        .trim()
        .parse()
        .map_err(|_| SettingError::InvalidNumber {
            key,
            input: input.to_string(),
        })
}

pub fn success_set(key: &str, value: &str) -> String {
    format!("Set {key} to: {value}")
}

pub fn success_unset(key: &str, default: &str) -> String {
    format!("Unset {key} (now: {default})")
}
