//! Host-supplied sign-in policy.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use super::ProviderInstance;
use crate::error::AuthError;

/// Application-level sign-in policy, invoked by [`ProviderInstance::sign_in`].
///
/// Receives the provider instance explicitly so it can resolve the identity
/// (`user_id`, `user_name`, `provider_name`) and record whether the user is
/// new via `set_is_new`. Whatever it returns is handed back to the caller of
/// `sign_in` unchanged.
#[async_trait]
pub trait SignInHandler: Send + Sync {
    async fn sign_in(
        &self,
        provider: &mut ProviderInstance,
        state: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, AuthError>;
}

/// Shared cell holding the registry's sign-in handler.
///
/// Every instance created by a registry holds a clone, so replacing the
/// handler is visible to instances that already exist.
#[derive(Clone, Default)]
pub struct SignInSlot {
    handler: Arc<RwLock<Option<Arc<dyn SignInHandler>>>>,
}

impl SignInSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, handler: Arc<dyn SignInHandler>) {
        *self
            .handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    pub fn get(&self) -> Option<Arc<dyn SignInHandler>> {
        self.handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }
}
