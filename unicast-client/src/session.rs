//! Device identity snapshot shared by every component
//!
//! A `ClientSession` is a plain value: components receive it by reference and
//! the preference controller hands back a new one after a language change.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language used when nothing has been persisted yet
pub const DEFAULT_LANGUAGE: &str = "en";

/// Opaque device token, the remote service's primary key for this install
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceToken(String);

impl DeviceToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short language code ("en", "es", "zh"...), always trimmed and lower-case
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Normalizes user input, `None` for blank codes
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_LANGUAGE
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self(DEFAULT_LANGUAGE.to_string())
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current token and language of the running client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSession {
    pub token: DeviceToken,
    pub language: LanguageCode,
}

impl ClientSession {
    pub fn new(token: DeviceToken, language: LanguageCode) -> Self {
        Self { token, language }
    }

    /// Same token, different language
    pub fn with_language(&self, language: LanguageCode) -> Self {
        Self {
            token: self.token.clone(),
            language,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_code_normalization() {
        assert_eq!(LanguageCode::parse("  ES ").unwrap().as_str(), "es");
        assert!(LanguageCode::parse("").is_none());
        assert!(LanguageCode::parse("   ").is_none());
        assert!(LanguageCode::parse("e s").is_none());
    }

    #[test]
    fn test_default_language() {
        let lang = LanguageCode::default();
        assert_eq!(lang.as_str(), "en");
        assert!(lang.is_default());
        assert!(!LanguageCode::parse("fr").unwrap().is_default());
    }

    #[test]
    fn test_with_language_keeps_token() {
        let session = ClientSession::new(DeviceToken::new("web-1-abc"), LanguageCode::default());
        let changed = session.with_language(LanguageCode::parse("hi").unwrap());
        assert_eq!(changed.token, session.token);
        assert_eq!(changed.language.as_str(), "hi");
    }
}
