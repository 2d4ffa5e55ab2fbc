//! Per-provider registration options.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Options stored with a provider registration.
///
/// The registry never validates these; each driver reads the fields it
/// needs and reports [`crate::error::AuthError::MissingConfiguration`] itself.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOptions {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(default, skip_serializing_if = "Endpoints::is_empty")]
    pub endpoints: Endpoints,
}

impl fmt::Debug for ProviderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderOptions")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &if self.client_secret.is_empty() { "" } else { ".." },
            )
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl ProviderOptions {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scope: None,
            endpoints: Endpoints::default(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<Scope>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Scope string to send: the configured scope, else the provider default.
    pub fn effective_scope(&self, default: &[&str], delimiter: &str) -> String {
        match &self.scope {
            Some(scope) => scope.render(delimiter),
            None => default.join(delimiter),
        }
    }
}

/// OAuth scope as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scope {
    /// Already rendered, sent verbatim.
    One(String),
    /// Joined with the provider's delimiter.
    Many(Vec<String>),
}

impl Scope {
    pub fn render(&self, delimiter: &str) -> String {
        match self {
            Self::One(s) => s.clone(),
            Self::Many(items) => items.join(delimiter),
        }
    }
}

impl From<&str> for Scope {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for Scope {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for Scope {
    fn from(value: Vec<String>) -> Self {
        Self::Many(value)
    }
}

impl From<&[&str]> for Scope {
    fn from(value: &[&str]) -> Self {
        Self::Many(value.iter().map(|s| s.to_string()).collect())
    }
}

/// Base-URL overrides for a provider's upstream hosts.
///
/// Unset fields fall back to the provider's public endpoints. Used to point
/// a driver at a mock server or a gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorize: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
}

impl Endpoints {
    pub fn is_empty(&self) -> bool {
        self.authorize.is_none() && self.token.is_none() && self.api.is_none()
    }

    /// Point every endpoint at the same base URL.
    pub fn all(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            authorize: Some(base.clone()),
            token: Some(base.clone()),
            api: Some(base),
        }
    }

    pub fn authorize_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.authorize.as_deref().unwrap_or(default)
    }

    pub fn token_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.token.as_deref().unwrap_or(default)
    }

    pub fn api_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.api.as_deref().unwrap_or(default)
    }
}
