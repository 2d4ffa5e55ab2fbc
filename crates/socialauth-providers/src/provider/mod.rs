//! Built-in provider drivers.

#[cfg(feature = "google")]
pub mod google;

#[cfg(feature = "twitch")]
pub mod twitch;

#[cfg(feature = "vk")]
pub mod vk;

#[cfg(feature = "google")]
pub use google::GoogleProvider;
#[cfg(feature = "twitch")]
pub use twitch::TwitchProvider;
#[cfg(feature = "vk")]
pub use vk::VkProvider;
