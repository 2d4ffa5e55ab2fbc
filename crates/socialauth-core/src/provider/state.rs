//! Mutable per-attempt flow state.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use strum::Display;

use super::{Profile, TokenGrant};
use crate::error::AuthError;

/// Position of a provider instance in the authorization-code flow.
///
/// Stages only move forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FlowStage {
    #[default]
    Created,
    TokenAcquired,
    Identified,
    SignedIn,
}

/// Token, identity and sign-in state of one [`super::ProviderInstance`].
///
/// Drivers read it during [`super::OAuthProvider::fetch_profile`]; only the
/// owning instance writes it, and only after a step succeeded.
#[derive(Clone, Default)]
pub struct ProviderState {
    access_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<u64>,
    obtained_at: Option<DateTime<Utc>>,
    user_id: Option<String>,
    is_new: Option<bool>,
    profile: Option<Profile>,
    stage: FlowStage,
}

impl fmt::Debug for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderState")
            .field("access_token", &self.access_token.as_ref().map(|_| ".."))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("user_id", &self.user_id)
            .field("is_new", &self.is_new)
            .field("profile", &self.profile.as_ref().map(|_| ".."))
            .field("stage", &self.stage)
            .finish()
    }
}

impl ProviderState {
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    /// Absolute expiry derived from `expires_in`. A zero lifetime means the
    /// token does not expire.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.expires_in.filter(|s| *s > 0)?;
        let secs = i64::try_from(secs).ok()?;
        Some(self.obtained_at? + Duration::seconds(secs))
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn is_new(&self) -> Option<bool> {
        self.is_new
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn stage(&self) -> FlowStage {
        self.stage
    }

    /// The access token, or [`AuthError::MissingAccessToken`].
    pub fn require_access_token(&self, provider: &str) -> Result<&str, AuthError> {
        self.access_token()
            .ok_or_else(|| AuthError::MissingAccessToken {
                provider: provider.to_string(),
            })
    }

    /// `Authorization` header value using the granted token type
    /// (`Bearer` when the provider did not report one).
    pub fn authorization_header(&self, provider: &str) -> Result<String, AuthError> {
        let token = self.require_access_token(provider)?;
        let token_type = match self.token_type() {
            Some(t) if t.eq_ignore_ascii_case("bearer") => "Bearer",
            Some(t) => t,
            None => "Bearer",
        };
        Ok(format!("{token_type} {token}"))
    }

    pub(crate) fn apply_grant(&mut self, grant: &TokenGrant) {
        self.access_token = Some(grant.access_token.clone());
        self.token_type = grant.token_type.clone();
        self.expires_in = grant.expires_in;
        self.obtained_at = Some(Utc::now());
        if self.user_id.is_none() {
            self.user_id = grant.user_id.clone();
        }
        self.advance(FlowStage::TokenAcquired);
    }

    pub(crate) fn apply_profile(&mut self, profile: Profile) {
        if self.user_id.is_none() {
            self.user_id = profile.user_id.clone();
        }
        self.profile = Some(profile);
        if self.user_id.is_some() {
            self.advance(FlowStage::Identified);
        }
    }

    pub(crate) fn set_is_new(&mut self, value: bool) {
        self.is_new = Some(value);
    }

    pub(crate) fn advance(&mut self, stage: FlowStage) {
        self.stage = self.stage.max(stage);
    }

    /// State with a token already in place, for driving
    /// [`super::OAuthProvider::fetch_profile`] outside a registry.
    pub fn with_access_token(access_token: impl Into<String>, token_type: Option<String>) -> Self {
        let mut state = Self::default();
        state.apply_grant(&TokenGrant {
            token_type,
            ..TokenGrant::new(access_token)
        });
        state
    }
}
