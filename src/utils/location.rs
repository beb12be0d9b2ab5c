//! Launch location handling
//!
//! The client can be started from a link such as
//! `chatdeck://chat?apiKey=sk-...`. This module splits such a location into
//! its base, query parameters and fragment so individual parameters can be
//! read and stripped again.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    base: String,
    query: Vec<(String, String)>,
    fragment: Option<String>,
}

impl Location {
    /// Parse a location string. Parsing never fails; anything before the
    /// first `?` is kept verbatim as the base.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatdeck::utils::location::Location;
    ///
    /// let location = Location::parse("chatdeck://chat?apiKey=abc%20123&lang=en");
    /// assert_eq!(location.base(), "chatdeck://chat");
    /// assert_eq!(location.query_param("apiKey"), Some("abc 123"));
    /// assert_eq!(location.query_param("missing"), None);
    /// ```
    pub fn parse(input: &str) -> Self {
        let (rest, fragment) = match input.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (input, None),
        };
        let (base, query) = rest.split_once('?').unwrap_or((rest, ""));
        let query = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (percent_decode(key), percent_decode(value))
            })
            .collect();

        Self {
            base: base.to_string(),
            query,
            fragment,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// First value of the query parameter `name`.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// A copy of this location with every `name` parameter removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatdeck::utils::location::Location;
    ///
    /// let location = Location::parse("chatdeck://chat?apiKey=abc&lang=en");
    /// assert_eq!(
    ///     location.without_query_param("apiKey").to_string(),
    ///     "chatdeck://chat?lang=en"
    /// );
    /// ```
    pub fn without_query_param(&self, name: &str) -> Location {
        Location {
            base: self.base.clone(),
            query: self
                .query
                .iter()
                .filter(|(key, _)| key != name)
                .cloned()
                .collect(),
            fragment: self.fragment.clone(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)?;
        for (index, (key, value)) in self.query.iter().enumerate() {
            let separator = if index == 0 { '?' } else { '&' };
            write!(
                f,
                "{separator}{}={}",
                percent_encode(key),
                percent_encode(value)
            )?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Decode `%XX` escapes and `+` as used in query strings. Malformed escapes
/// are kept literally.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'+' => decoded.push(b' '),
            b'%' => {
                match (
                    bytes.get(index + 1).copied().and_then(hex_value),
                    bytes.get(index + 2).copied().and_then(hex_value),
                ) {
                    (Some(high), Some(low)) => {
                        decoded.push((high << 4) | low);
                        index += 2;
                    }
                    _ => decoded.push(b'%'),
                }
            }
            byte => decoded.push(byte),
        }
        index += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

fn percent_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
