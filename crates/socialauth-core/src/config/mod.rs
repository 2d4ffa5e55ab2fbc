//! Configuration system (TOML file or environment variables).

pub mod options;

pub use options::{Endpoints, ProviderOptions, Scope};

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Options for every provider the host wants to register, keyed by
/// provider name.
///
/// ```toml
/// [providers.google]
/// client_id = "..."
/// client_secret = "..."
/// redirect_uri = "http://localhost:3000/auth/google/callback"
///
/// [providers.vk]
/// client_id = "..."
/// client_secret = "..."
/// redirect_uri = "http://localhost:3000/auth/vk/callback"
/// scope = ["friends", "email"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderOptions>,
}

impl AuthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(input: &str) -> Result<Self, AuthError> {
        toml::from_str(input)
            .map_err(|e| AuthError::Configuration(format!("invalid config: {e}")))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AuthError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Load options for the named providers from the environment.
    ///
    /// Reads `.env` if present, then `<NAME>_CLIENT_ID`, `<NAME>_CLIENT_SECRET`,
    /// `<NAME>_REDIRECT_URI` and optional `<NAME>_SCOPE`. A provider is only
    /// included when its client id is set.
    pub fn from_env(provider_names: &[&str]) -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(provider_names, |key| std::env::var(key).ok())
    }

    fn from_lookup(provider_names: &[&str], lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new();
        for name in provider_names {
            let prefix = env_prefix(name);
            let Some(client_id) = lookup(&format!("{prefix}_CLIENT_ID")) else {
                continue;
            };
            let mut options = ProviderOptions::new(
                client_id,
                lookup(&format!("{prefix}_CLIENT_SECRET")).unwrap_or_default(),
                lookup(&format!("{prefix}_REDIRECT_URI")).unwrap_or_default(),
            );
            if let Some(scope) = lookup(&format!("{prefix}_SCOPE")) {
                options = options.with_scope(scope);
            }
            config.providers.insert(name.to_string(), options);
        }
        config
    }

    pub fn insert(&mut self, provider: impl Into<String>, options: ProviderOptions) {
        self.providers.insert(provider.into(), options);
    }

    pub fn get(&self, provider: &str) -> Option<&ProviderOptions> {
        self.providers.get(provider)
    }

    /// Options for a provider, or a configuration error naming it.
    pub fn require(&self, provider: &str) -> Result<&ProviderOptions, AuthError> {
        self.get(provider).ok_or_else(|| AuthError::MissingConfiguration {
            key: format!("providers.{provider}"),
            provider: provider.to_string(),
        })
    }
}

fn env_prefix(provider: &str) -> String {
    provider
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
