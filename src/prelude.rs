//! Convenience re-exports for common use.

pub use socialauth_core::prelude::*;

#[cfg(feature = "google")]
pub use socialauth_providers::provider::GoogleProvider;
#[cfg(feature = "twitch")]
pub use socialauth_providers::provider::TwitchProvider;
#[cfg(feature = "vk")]
pub use socialauth_providers::provider::VkProvider;
