//! OAuth2 provider contract, per-attempt instances, and the registry.
//!
//! A provider integration is split in two:
//!
//! - an [`OAuthProvider`] driver: stateless, shared, registered once. It knows
//!   how to render the authorize URL, exchange a code and fetch a profile.
//! - a [`ProviderInstance`]: created fresh by [`AuthRegistry::get_provider`]
//!   for every authorization attempt. It carries the token, identity and
//!   "is new" state through the flow and hands itself to the host's
//!   [`SignInHandler`].

pub mod http;
pub mod instance;
pub mod registry;
pub mod sign_in;
pub mod state;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ProviderOptions;
use crate::error::AuthError;

pub use instance::ProviderInstance;
pub use registry::AuthRegistry;
pub use sign_in::{SignInHandler, SignInSlot};
pub use state::{FlowStage, ProviderState};

/// Core trait implemented by every OAuth2 provider integration.
///
/// Implementations hold no per-user state; everything learned during a flow
/// is stored in the [`ProviderInstance`] that drives them.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Registry key (e.g. "google", "vk"). Constant for a given driver.
    fn provider_name(&self) -> &str;

    /// Render the authorization endpoint URL for the redirect leg.
    ///
    /// Must be a pure function of `options`: client id, redirect URI,
    /// `response_type=code` and the effective scope.
    fn authorize_url(&self, options: &ProviderOptions) -> Result<String, AuthError>;

    /// Exchange an authorization code for an access token.
    ///
    /// An `{error, error_description}` payload from the token endpoint must be
    /// reported as [`AuthError::Provider`].
    async fn exchange_code(
        &self,
        options: &ProviderOptions,
        code: &str,
    ) -> Result<TokenGrant, AuthError>;

    /// Perform one upstream identity lookup.
    ///
    /// Drivers that call an authorized endpoint must start with
    /// [`ProviderState::require_access_token`]. The default has no identity
    /// source and yields `None`.
    async fn fetch_profile(
        &self,
        _options: &ProviderOptions,
        _state: &ProviderState,
    ) -> Result<Option<Profile>, AuthError> {
        Ok(None)
    }
}

/// Successful result of a code exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenGrant {
    pub access_token: String,
    pub token_type: Option<String>,
    /// Lifetime in seconds as reported upstream.
    pub expires_in: Option<u64>,
    /// Set by providers that return the user id with the token (VK).
    pub user_id: Option<String>,
    /// Untouched response body.
    pub raw: serde_json::Value,
}

impl TokenGrant {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: None,
            expires_in: None,
            user_id: None,
            raw: serde_json::Value::Null,
        }
    }
}

/// Identity payload fetched from a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub user_id: Option<String>,
    pub name: UserName,
    pub raw: serde_json::Value,
}

/// Normalized display-name fields. Absent fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserName {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserName {
    pub fn new(first_name: Option<String>, last_name: Option<String>) -> Self {
        Self {
            first_name: first_name.filter(|s| !s.is_empty()),
            last_name: last_name.filter(|s| !s.is_empty()),
        }
    }
}

/// Render an upstream identifier (string or number) as a string.
pub fn id_from_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
