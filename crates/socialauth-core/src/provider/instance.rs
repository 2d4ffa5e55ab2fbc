//! Per-attempt provider instance.

use std::sync::Arc;

use tracing::debug;

use super::sign_in::SignInSlot;
use super::state::{FlowStage, ProviderState};
use super::{OAuthProvider, Profile, TokenGrant, UserName};
use crate::config::ProviderOptions;
use crate::error::AuthError;

/// One authorization attempt against a registered provider.
///
/// Created by [`super::AuthRegistry::get_provider`], owned by the request
/// that handles the callback, dropped with it. Moves through
/// [`FlowStage`]s as the code is exchanged, the user is identified and the
/// host's sign-in handler completes. A failed step leaves the state as it
/// was.
pub struct ProviderInstance {
    provider: Arc<dyn OAuthProvider>,
    options: Arc<ProviderOptions>,
    state: ProviderState,
    exchanged: Option<ExchangedCode>,
    sign_in: SignInSlot,
}

struct ExchangedCode {
    code: String,
    grant: TokenGrant,
}

impl ProviderInstance {
    pub fn new(
        provider: Arc<dyn OAuthProvider>,
        options: Arc<ProviderOptions>,
        sign_in: SignInSlot,
    ) -> Self {
        Self {
            provider,
            options,
            state: ProviderState::default(),
            exchanged: None,
            sign_in,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub fn options(&self) -> &ProviderOptions {
        &self.options
    }

    pub fn state(&self) -> &ProviderState {
        &self.state
    }

    pub fn stage(&self) -> FlowStage {
        self.state.stage()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.state.access_token()
    }

    pub fn token_type(&self) -> Option<&str> {
        self.state.token_type()
    }

    pub fn expires_in(&self) -> Option<u64> {
        self.state.expires_in()
    }

    /// Exchange the authorization code from the redirect callback for an
    /// access token and store it on this instance.
    ///
    /// Repeating the call with the same code returns the stored grant without
    /// contacting the provider. A different code on an instance that already
    /// holds a token fails with [`AuthError::AlreadyExchanged`]; start a new
    /// attempt with [`super::AuthRegistry::get_provider`] instead.
    pub async fn exchange_code_to_access_token(
        &mut self,
        code: &str,
    ) -> Result<TokenGrant, AuthError> {
        if let Some(exchanged) = &self.exchanged {
            if exchanged.code == code {
                return Ok(exchanged.grant.clone());
            }
            return Err(AuthError::AlreadyExchanged {
                provider: self.provider_name().to_string(),
            });
        }

        let grant = self.provider.exchange_code(&self.options, code).await?;
        debug!(
            provider = self.provider_name(),
            expires_in = ?grant.expires_in,
            "authorization code exchanged"
        );
        self.state.apply_grant(&grant);
        self.exchanged = Some(ExchangedCode {
            code: code.to_string(),
            grant: grant.clone(),
        });
        Ok(grant)
    }

    /// Stable upstream identifier of the authenticated user.
    ///
    /// Returns the cached id without a network call once known. Otherwise
    /// triggers the single profile fetch. `None` means the provider has no
    /// identity source; drivers that need a token fail with
    /// [`AuthError::MissingAccessToken`] instead.
    pub async fn user_id(&mut self) -> Result<Option<String>, AuthError> {
        if self.state.user_id().is_none() {
            self.load_profile().await?;
        }
        if self.state.user_id().is_some() {
            self.state.advance(FlowStage::Identified);
        }
        Ok(self.state.user_id().map(str::to_string))
    }

    /// Display name from the profile, fetching it if neither this nor
    /// [`Self::user_id`] has done so yet.
    pub async fn user_name(&mut self) -> Result<UserName, AuthError> {
        Ok(self
            .load_profile()
            .await?
            .map(|profile| profile.name.clone())
            .unwrap_or_default())
    }

    /// Memoized profile; fetched at most once per successful lookup.
    pub async fn profile(&mut self) -> Result<Option<&Profile>, AuthError> {
        self.load_profile().await
    }

    async fn load_profile(&mut self) -> Result<Option<&Profile>, AuthError> {
        if self.state.profile().is_none() {
            let fetched = self
                .provider
                .fetch_profile(&self.options, &self.state)
                .await?;
            if let Some(profile) = fetched {
                debug!(
                    provider = self.provider_name(),
                    user_id = ?profile.user_id,
                    "profile fetched"
                );
                self.state.apply_profile(profile);
            }
        }
        Ok(self.state.profile())
    }

    /// Whether the sign-in handler created a new application user.
    ///
    /// `None` until the handler decides.
    pub fn is_new(&self) -> Option<bool> {
        self.state.is_new()
    }

    pub fn set_is_new(&mut self, value: bool) {
        self.state.set_is_new(value);
    }

    /// Run the registry's sign-in handler with this instance and `state`.
    ///
    /// Fails with [`AuthError::SignInNotConfigured`] when the registry has no
    /// handler. The handler's return value is passed through unchanged.
    ///
    /// The stage only moves to [`FlowStage::SignedIn`] from
    /// [`FlowStage::Identified`]. A handler that never resolves the user
    /// leaves the stage where it was.
    pub async fn sign_in(
        &mut self,
        state: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, AuthError> {
        let handler = self.sign_in.get().ok_or(AuthError::SignInNotConfigured)?;
        let result = handler.sign_in(self, state).await?;
        if self.state.stage() >= FlowStage::Identified {
            self.state.advance(FlowStage::SignedIn);
        }
        debug!(
            provider = self.provider_name(),
            is_new = ?self.state.is_new(),
            "sign-in completed"
        );
        Ok(result)
    }
}

impl std::fmt::Debug for ProviderInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderInstance")
            .field("provider", &self.provider_name())
            .field("options", &self.options)
            .field("state", &self.state)
            .field("exchanged", &self.exchanged.is_some())
            .field("sign_in", &self.sign_in.is_set())
            .finish()
    }
}
