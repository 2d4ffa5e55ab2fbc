//! The distinguished upstream OAuth error.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error reported by a provider's token or identity endpoint.
///
/// Carries the upstream machine-readable `code` (for example
/// `invalid_grant`) and the human-readable description. Transport and parse
/// failures are never represented by this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    message: String,
    code: Option<String>,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// Build from an `{error, error_description}` token-endpoint payload.
    ///
    /// The description falls back to the code when the provider omits it.
    pub fn from_oauth_payload(error: &str, description: Option<&str>) -> Self {
        let message = description
            .filter(|d| !d.is_empty())
            .unwrap_or(error)
            .to_string();
        Self::with_code(message, error)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ProviderError {}
