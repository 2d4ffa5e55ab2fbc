//! socialauth-core -- Provider-agnostic OAuth2 sign-in kernel
//!
//! This crate contains everything provider-agnostic: the provider contract,
//! per-attempt provider instances, the registry, the sign-in policy seam,
//! errors, configuration and shared HTTP helpers.
//!
//! Concrete providers (Google, VK, Twitch) live in `socialauth-providers`.
//! The `socialauth` meta-crate re-exports both with default wiring.

pub mod config;
pub mod error;
pub mod prelude;
pub mod provider;
