//! socialauth Providers -- Built-in OAuth2 drivers.
//!
//! This crate contains the concrete drivers (Google, VK, Twitch), each behind
//! a cargo feature of the same name.
//!
//! The provider contract and the registry live in `socialauth-core`.

pub mod provider;

use std::sync::Arc;

use socialauth_core::config::AuthConfig;
use socialauth_core::provider::{AuthRegistry, OAuthProvider};
use tracing::debug;

/// All drivers enabled at compile time, in name order.
pub fn builtin_providers() -> Vec<Arc<dyn OAuthProvider>> {
    #[allow(unused_mut)]
    let mut providers: Vec<Arc<dyn OAuthProvider>> = Vec::new();

    #[cfg(feature = "google")]
    providers.push(Arc::new(provider::GoogleProvider::new()));

    #[cfg(feature = "twitch")]
    providers.push(Arc::new(provider::TwitchProvider::new()));

    #[cfg(feature = "vk")]
    providers.push(Arc::new(provider::VkProvider::new()));

    providers
}

/// Names of the drivers enabled at compile time.
pub fn builtin_provider_names() -> Vec<&'static str> {
    #[allow(unused_mut)]
    let mut names = Vec::new();

    #[cfg(feature = "google")]
    names.push(provider::google::PROVIDER_NAME);

    #[cfg(feature = "twitch")]
    names.push(provider::twitch::PROVIDER_NAME);

    #[cfg(feature = "vk")]
    names.push(provider::vk::PROVIDER_NAME);

    names
}

/// Register every enabled driver that has options in `config`.
///
/// Drivers without configuration are skipped. Returns the names registered.
pub fn register_default_providers(registry: &mut AuthRegistry, config: &AuthConfig) -> Vec<String> {
    let mut registered = Vec::new();
    for provider in builtin_providers() {
        let name = provider.provider_name().to_string();
        match config.get(&name) {
            Some(options) => {
                registry.register_provider(provider, options.clone());
                registered.push(name);
            }
            None => debug!(provider = %name, "no configuration, skipping"),
        }
    }
    registered
}
