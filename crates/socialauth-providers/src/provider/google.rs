//! Google OAuth2 driver (People API for identity).

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use socialauth_core::config::ProviderOptions;
use socialauth_core::error::{AuthError, ProviderError};
use socialauth_core::provider::http::{self, build_url, decode_token_response, read_json};
use socialauth_core::provider::{
    id_from_value, OAuthProvider, Profile, ProviderState, TokenGrant, UserName,
};

pub const PROVIDER_NAME: &str = "google";
pub const DEFAULT_SCOPE: &[&str] = &["https://www.googleapis.com/auth/userinfo.profile"];

const AUTHORIZE_BASE: &str = "https://accounts.google.com";
const TOKEN_BASE: &str = "https://www.googleapis.com";
const API_BASE: &str = "https://people.googleapis.com";

pub struct GoogleProvider {
    client: reqwest::Client,
}

impl GoogleProvider {
    pub fn new() -> Self {
        Self {
            client: http::shared_client().clone(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for GoogleProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OAuthProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    fn authorize_url(&self, options: &ProviderOptions) -> Result<String, AuthError> {
        let scope = options.effective_scope(DEFAULT_SCOPE, " ");
        let url = build_url(
            options.endpoints.authorize_or(AUTHORIZE_BASE),
            "/o/oauth2/v2/auth",
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
        let url = build_url(options.endpoints.token_or(TOKEN_BASE), "/oauth2/v4/token", &[])?;
        debug!(provider = PROVIDER_NAME, "exchanging authorization code");

        let response = self
            .client
            .post(url)
            .form(&[
                ("client_id", options.client_id.as_str()),
                ("client_secret", options.client_secret.as_str()),
                ("redirect_uri", options.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
            ])
            .send()
            .await?;

        decode_token_response(PROVIDER_NAME, read_json(response).await?)
    }

    async fn fetch_profile(
        &self,
        options: &ProviderOptions,
        state: &ProviderState,
    ) -> Result<Option<Profile>, AuthError> {
        let authorization = state.authorization_header(PROVIDER_NAME)?;
        let url = build_url(
            options.endpoints.api_or(API_BASE),
            "/v1/people/me",
            &[("personFields", "names")],
        )?;

        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await?;
        let response = read_json(response).await?;

        if let Some(err) = api_error(&response.body) {
            return Err(err.into());
        }
        let body = response.ensure_success()?.body;
        Ok(Some(profile_from_people(body)))
    }
}

/// Google API errors: `{"error": {"code": 401, "message": "...", "status": "UNAUTHENTICATED"}}`.
fn api_error(body: &Value) -> Option<ProviderError> {
    let error = body.get("error")?;
    if let Some(code) = error.as_str() {
        return Some(ProviderError::from_oauth_payload(
            code,
            body.get("error_description").and_then(Value::as_str),
        ));
    }
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Google API error");
    Some(match error.get("status").and_then(Value::as_str) {
        Some(status) => ProviderError::with_code(message, status),
        None => ProviderError::new(message),
    })
}

fn profile_from_people(body: Value) -> Profile {
    let name = body
        .get("names")
        .and_then(Value::as_array)
        .and_then(|names| names.first());
    let text = |key: &str| {
        name.and_then(|n| n.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let user_id = name
        .and_then(|n| n.pointer("/metadata/source/id"))
        .and_then(id_from_value);
    let user_name = UserName::new(text("givenName"), text("familyName"));

    Profile {
        user_id,
        name: user_name,
        raw: body,
    }
}
