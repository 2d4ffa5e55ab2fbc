//! socialauth -- pluggable OAuth2 sign-in.
//!
//! A registry of named providers (Google, VK, Twitch, or your own), each
//! wrapping the provider-specific steps of the authorization-code flow, plus
//! a single sign-in hook where the host application finds or creates its
//! user.
//!
//! # Quick Start
//!
//! ```no_run
//! use socialauth::prelude::*;
//!
//! # async fn example() -> socialauth::error::Result<()> {
//! let config = AuthConfig::from_file("socialauth.toml")?;
//! let registry = socialauth::default_registry(&config);
//!
//! // redirect leg
//! let url = registry.get_auth_url("google")?;
//! println!("{url}");
//!
//! // callback leg
//! let mut google = registry.get_provider("google")?;
//! google.exchange_code_to_access_token("code-from-callback").await?;
//! let user_id = google.user_id().await?;
//! # let _ = user_id;
//! # Ok(())
//! # }
//! ```

pub use socialauth_core::{config, error, provider};
pub use socialauth_providers as providers;

pub mod prelude;

#[cfg(feature = "cli")]
pub mod cli;

use socialauth_core::config::AuthConfig;
use socialauth_core::provider::AuthRegistry;

/// Registry with every enabled built-in driver that `config` has options for.
///
/// Install a sign-in handler with [`AuthRegistry::set_sign_in_func`] before
/// calling `sign_in` on an instance.
pub fn default_registry(config: &AuthConfig) -> AuthRegistry {
    let mut registry = AuthRegistry::new();
    socialauth_providers::register_default_providers(&mut registry, config);
    registry
}
