//! Convenience re-exports for common use.

pub use crate::config::{AuthConfig, Endpoints, ProviderOptions, Scope};
pub use crate::error::{AuthError, ProviderError, Result};
pub use crate::provider::{
    AuthRegistry, FlowStage, OAuthProvider, Profile, ProviderInstance, ProviderState,
    SignInHandler, TokenGrant, UserName,
};
