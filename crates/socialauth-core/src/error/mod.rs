//! Error types for socialauth.

pub mod provider;

pub use provider::ProviderError;

use thiserror::Error;

/// Primary error type for all socialauth operations.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Unknown provider: '{0}' is not registered")]
    UnknownProvider(String),

    #[error("Sign-in function is not configured")]
    SignInNotConfigured,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("missing configuration key '{key}' for provider {provider}")]
    MissingConfiguration { key: String, provider: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("access token required for provider {provider}; exchange the code first")]
    MissingAccessToken { provider: String },

    #[error("authorization code already exchanged for provider {provider}")]
    AlreadyExchanged { provider: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Sign-in failed: {0}")]
    SignIn(String),
}

/// Broad error category for routing host-side handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Registry or options are wrong; fix the setup, never retry.
    Configuration,
    /// The upstream endpoint answered with an OAuth error payload.
    Upstream,
    /// A call was made out of order (no token yet, or exchanged twice).
    Authentication,
    Network,
    Serialization,
    Api,
    SignIn,
}

impl AuthError {
    /// Shortcut for an upstream error without a machine-readable code.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(ProviderError::new(message))
    }

    /// The distinguished upstream error, if this is one.
    pub fn as_provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::Provider(err) => Some(err),
            _ => None,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownProvider(_)
            | Self::SignInNotConfigured
            | Self::Configuration(_)
            | Self::MissingConfiguration { .. } => ErrorCategory::Configuration,
            Self::Provider(_) => ErrorCategory::Upstream,
            Self::MissingAccessToken { .. } | Self::AlreadyExchanged { .. } => {
                ErrorCategory::Authentication
            }
            Self::Network(_) => ErrorCategory::Network,
            Self::Serialization(_) | Self::InvalidResponse(_) => ErrorCategory::Serialization,
            Self::Api { .. } => ErrorCategory::Api,
            Self::SignIn(_) => ErrorCategory::SignIn,
        }
    }

    /// Whether a host-side retry could plausibly succeed.
    ///
    /// Advisory only: nothing in this crate retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_is_configuration_error() {
        let err = AuthError::UnknownProvider("github".to_string());
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("github"));
    }

    #[test]
    fn sign_in_not_configured_is_configuration_error() {
        assert_eq!(
            AuthError::SignInNotConfigured.category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn provider_error_converts_and_keeps_code() {
        let err: AuthError = ProviderError::with_code("bad code", "invalid_grant").into();
        assert_eq!(err.category(), ErrorCategory::Upstream);
        let inner = err.as_provider_error().expect("provider error");
        assert_eq!(inner.code(), Some("invalid_grant"));
        assert_eq!(inner.message(), "bad code");
        assert!(!err.is_retryable());
    }

    #[test]
    fn provider_error_display_is_transparent() {
        let err: AuthError = ProviderError::with_code("bad code", "invalid_grant").into();
        assert_eq!(err.to_string(), "bad code (invalid_grant)");
    }

    #[test]
    fn server_side_api_errors_are_retryable() {
        let err = AuthError::Api {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(err.is_retryable());

        let err = AuthError::Api {
            status: 400,
            message: "bad request".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn missing_access_token_names_provider() {
        let err = AuthError::MissingAccessToken {
            provider: "vk".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Authentication);
        assert!(err.to_string().contains("vk"));
    }

    #[test]
    fn missing_configuration_display_includes_key_and_provider() {
        let err = AuthError::MissingConfiguration {
            key: "client_id".to_string(),
            provider: "twitch".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("client_id"), "expected key in message: {msg}");
        assert!(msg.contains("twitch"), "expected provider in message: {msg}");
    }
}
