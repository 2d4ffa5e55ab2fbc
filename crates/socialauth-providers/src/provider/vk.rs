//! VK OAuth2 driver.
//!
//! VK reports the user id in the token response, so `user_id` resolves from
//! the grant and only the name needs a `users.get` call.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use socialauth_core::config::ProviderOptions;
use socialauth_core::error::{AuthError, ProviderError};
use socialauth_core::provider::http::{self, build_url, decode_token_response, read_json};
use socialauth_core::provider::{
    id_from_value, OAuthProvider, Profile, ProviderState, TokenGrant, UserName,
};

pub const PROVIDER_NAME: &str = "vk";
pub const DEFAULT_SCOPE: &[&str] = &[];
pub const API_VERSION: &str = "5.103";

const OAUTH_BASE: &str = "https://oauth.vk.com";
const API_BASE: &str = "https://api.vk.com";

pub struct VkProvider {
    client: reqwest::Client,
}

impl VkProvider {
    pub fn new() -> Self {
        Self {
            client: http::shared_client().clone(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for VkProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OAuthProvider for VkProvider {
    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    fn authorize_url(&self, options: &ProviderOptions) -> Result<String, AuthError> {
        let scope = options.effective_scope(DEFAULT_SCOPE, ",");
        let url = build_url(
            options.endpoints.authorize_or(OAUTH_BASE),
            "/authorize",
            &[
                ("client_id", options.client_id.as_str()),
                ("redirect_uri", options.redirect_uri.as_str()),
                ("display", "page"),
                ("scope", scope.as_str()),
                ("response_type", "code"),
                ("v", API_VERSION),
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
            options.endpoints.token_or(OAUTH_BASE),
            "/access_token",
            &[
                ("client_id", options.client_id.as_str()),
                ("client_secret", options.client_secret.as_str()),
                ("redirect_uri", options.redirect_uri.as_str()),
                ("code", code),
            ],
        )?;
        debug!(provider = PROVIDER_NAME, "exchanging authorization code");

        let response = self.client.get(url).send().await?;
        decode_token_response(PROVIDER_NAME, read_json(response).await?)
    }

    async fn fetch_profile(
        &self,
        options: &ProviderOptions,
        state: &ProviderState,
    ) -> Result<Option<Profile>, AuthError> {
        let access_token = state.require_access_token(PROVIDER_NAME)?;
        let url = build_url(
            options.endpoints.api_or(API_BASE),
            "/method/users.get",
            &[
                ("user_ids", state.user_id().unwrap_or_default()),
                ("fields", ""),
                ("v", API_VERSION),
                ("access_token", access_token),
            ],
        )?;

        let response = read_json(self.client.get(url).send().await?).await?;
        if let Some(err) = api_error(&response.body) {
            return Err(err.into());
        }
        let body = response.ensure_success()?.body;
        profile_from_users_get(body).map(Some)
    }
}

/// VK method errors: `{"error": {"error_code": 5, "error_msg": "..."}}`.
fn api_error(body: &Value) -> Option<ProviderError> {
    let error = body.get("error")?;
    if let Some(code) = error.as_str() {
        return Some(ProviderError::from_oauth_payload(
            code,
            body.get("error_description").and_then(Value::as_str),
        ));
    }
    let message = error
        .get("error_msg")
        .and_then(Value::as_str)
        .unwrap_or("VK API error");
    Some(match error.get("error_code").and_then(id_from_value) {
        Some(code) => ProviderError::with_code(message, code),
        None => ProviderError::new(message),
    })
}

fn profile_from_users_get(body: Value) -> Result<Profile, AuthError> {
    let user = body
        .get("response")
        .and_then(Value::as_array)
        .and_then(|users| users.first())
        .ok_or_else(|| AuthError::InvalidResponse("vk users.get returned no users".to_string()))?;
    let text = |key: &str| user.get(key).and_then(Value::as_str).map(str::to_string);

    let user_id = user.get("id").and_then(id_from_value);
    let name = UserName::new(text("first_name"), text("last_name"));

    Ok(Profile {
        user_id,
        name,
        raw: body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> ProviderOptions {
        ProviderOptions::new("51234", "secret", "http://localhost/auth/vk/callback")
    }

    #[test]
    fn authorize_url_defaults_to_empty_scope() {
        let url = VkProvider::new().authorize_url(&options()).unwrap();
        assert_eq!(
            url,
            "https://oauth.vk.com/authorize?client_id=51234\
             &redirect_uri=http%3A%2F%2Flocalhost%2Fauth%2Fvk%2Fcallback\
             &display=page&scope=&response_type=code&v=5.103"
        );
    }

    #[test]
    fn authorize_url_joins_scopes_with_commas() {
        let options = options().with_scope(vec!["friends".to_string(), "email".to_string()]);
        let url = VkProvider::new().authorize_url(&options).unwrap();
        assert!(url.contains("&scope=friends%2Cemail&"), "{url}");
    }

    #[test]
    fn users_get_payload_maps_to_profile() {
        let profile = profile_from_users_get(json!({
            "response": [{ "id": 210700286, "first_name": "Lindsey", "last_name": "Stirling" }]
        }))
        .unwrap();
        assert_eq!(profile.user_id.as_deref(), Some("210700286"));
        assert_eq!(profile.name.first_name.as_deref(), Some("Lindsey"));
        assert_eq!(profile.name.last_name.as_deref(), Some("Stirling"));
    }

    #[test]
    fn empty_users_get_is_invalid_response() {
        let err = profile_from_users_get(json!({ "response": [] })).unwrap_err();
        assert!(matches!(err, AuthError::InvalidResponse(_)));
    }

    #[test]
    fn method_error_keeps_numeric_code() {
        let err = api_error(&json!({
            "error": { "error_code": 5, "error_msg": "User authorization failed: invalid access_token (4)." }
        }))
        .unwrap();
        assert_eq!(err.code(), Some("5"));
        assert!(err.message().starts_with("User authorization failed"));
    }
}
