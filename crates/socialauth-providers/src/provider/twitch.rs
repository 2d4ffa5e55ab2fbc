//! Twitch OAuth2 driver (Helix users endpoint for identity).

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use socialauth_core::config::ProviderOptions;
use socialauth_core::error::{AuthError, ProviderError};
use socialauth_core::provider::http::{
    self, build_url, decode_token_response, read_json, JsonResponse,
};
use socialauth_core::provider::{
    id_from_value, OAuthProvider, Profile, ProviderState, TokenGrant, UserName,
};

pub const PROVIDER_NAME: &str = "twitch";
pub const DEFAULT_SCOPE: &[&str] = &["user:read:email"];

const ID_BASE: &str = "https://id.twitch.tv";
const API_BASE: &str = "https://api.twitch.tv";

pub struct TwitchProvider {
    client: reqwest::Client,
}

impl TwitchProvider {
    pub fn new() -> Self {
        Self {
            client: http::shared_client().clone(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for TwitchProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OAuthProvider for TwitchProvider {
    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    fn authorize_url(&self, options: &ProviderOptions) -> Result<String, AuthError> {
        let scope = options.effective_scope(DEFAULT_SCOPE, " ");
        let url = build_url(
            options.endpoints.authorize_or(ID_BASE),
            "/oauth2/authorize",
            &[
                ("client_id", options.client_id.as_str()),
                ("redirect_uri", options.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
            ],
        )?;
        Ok(url.into())
    }

    async fn exchange_code(
        &self,
        options: &ProviderOptions,
        code: &str,
    ) -> Result<TokenGrant, AuthError> {
        let url = build_url(
            options.endpoints.token_or(ID_BASE),
            "/oauth2/token",
            &[
                ("client_id", options.client_id.as_str()),
                ("client_secret", options.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", options.redirect_uri.as_str()),
            ],
        )?;
        debug!(provider = PROVIDER_NAME, "exchanging authorization code");

        let response = read_json(self.client.post(url).send().await?).await?;
        if let Some(err) = status_error(&response) {
            warn!(
                provider = PROVIDER_NAME,
                status = response.status,
                "token endpoint returned an error"
            );
            return Err(err.into());
        }
        decode_token_response(PROVIDER_NAME, response)
    }

    async fn fetch_profile(
        &self,
        options: &ProviderOptions,
        state: &ProviderState,
    ) -> Result<Option<Profile>, AuthError> {
        let authorization = state.authorization_header(PROVIDER_NAME)?;
        let url = build_url(options.endpoints.api_or(API_BASE), "/helix/users", &[])?;

        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .header("Client-Id", options.client_id.as_str())
            .send()
            .await?;
        let response = read_json(response).await?;

        if let Some(err) = status_error(&response) {
            return Err(err.into());
        }
        let body = response.ensure_success()?.body;
        profile_from_helix(body).map(Some)
    }
}

/// Twitch errors without an OAuth `error_description`:
/// `{"status": 400, "message": "Invalid authorization code"}` or
/// `{"error": "Unauthorized", "status": 401, "message": "Invalid OAuth token"}`.
///
/// Payloads carrying `error_description` are left to the generic decoder.
fn status_error(response: &JsonResponse) -> Option<ProviderError> {
    if response.is_success() || response.body.get("error_description").is_some() {
        return None;
    }
    let message = response.body.get("message").and_then(Value::as_str)?;
    let code = response
        .body
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| response.status.to_string());
    Some(ProviderError::with_code(message, code))
}

fn profile_from_helix(body: Value) -> Result<Profile, AuthError> {
    let user = body
        .get("data")
        .and_then(Value::as_array)
        .and_then(|users| users.first())
        .ok_or_else(|| AuthError::InvalidResponse("twitch helix/users returned no users".to_string()))?;

    let user_id = user.get("id").and_then(id_from_value);
    let display_name = user
        .get("display_name")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Profile {
        user_id,
        name: UserName::new(display_name, None),
        raw: body,
    })
}
