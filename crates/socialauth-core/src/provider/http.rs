//! Shared HTTP client and upstream response decoding.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::Url;
use serde_json::Value;
use tracing::warn;

use super::{id_from_value, TokenGrant};
use crate::error::{AuthError, ProviderError};

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// Join `base` and `path` and append query parameters (percent-encoded).
pub fn build_url(base: &str, path: &str, params: &[(&str, &str)]) -> Result<Url, AuthError> {
    let raw = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse_with_params(&raw, params)
        .map_err(|e| AuthError::Configuration(format!("invalid endpoint URL '{raw}': {e}")))
}

/// Status plus JSON body of an upstream response.
#[derive(Debug, Clone)]
pub struct JsonResponse {
    pub status: u16,
    pub body: Value,
}

impl JsonResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail with [`AuthError::Api`] for a non-2xx status.
    pub fn ensure_success(self) -> Result<Self, AuthError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(AuthError::Api {
                status: self.status,
                message: self.body.to_string(),
            })
        }
    }
}

/// Read a response body as JSON regardless of status.
///
/// Upstream OAuth errors often arrive with 4xx codes and a JSON body, so the
/// body is decoded first and the status is left to the caller. A non-JSON
/// body on an error status becomes [`AuthError::Api`].
pub async fn read_json(response: reqwest::Response) -> Result<JsonResponse, AuthError> {
    let status = response.status().as_u16();
    let text = response.text().await?;
    match serde_json::from_str(&text) {
        Ok(body) => Ok(JsonResponse { status, body }),
        Err(_) if !(200..300).contains(&status) => Err(AuthError::Api {
            status,
            message: text,
        }),
        Err(e) => Err(AuthError::Serialization(e)),
    }
}

/// Detect an RFC 6749 `{error, error_description}` payload.
pub fn oauth_error(body: &Value) -> Option<ProviderError> {
    let code = body.get("error")?.as_str()?;
    let description = body.get("error_description").and_then(Value::as_str);
    Some(ProviderError::from_oauth_payload(code, description))
}

/// Decode a token-endpoint response into a [`TokenGrant`].
pub fn decode_token_response(provider: &str, response: JsonResponse) -> Result<TokenGrant, AuthError> {
    if let Some(err) = oauth_error(&response.body) {
        warn!(
            provider,
            status = response.status,
            code = ?err.code(),
            "token endpoint returned an error"
        );
        return Err(err.into());
    }
    let response = response.ensure_success()?;
    let body = response.body;

    let access_token = body
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AuthError::InvalidResponse(format!("{provider} token response has no access_token"))
        })?
        .to_string();

    Ok(TokenGrant {
        access_token,
        token_type: body
            .get("token_type")
            .and_then(Value::as_str)
            .map(str::to_string),
        expires_in: body.get("expires_in").and_then(Value::as_u64),
        user_id: body.get("user_id").and_then(id_from_value),
        raw: body,
    })
}
