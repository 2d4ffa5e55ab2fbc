//! CLI-specific error formatting for user-facing messages.

use socialauth_core::error::AuthError;

/// Map an [`AuthError`] to a user-facing help string with actionable guidance.
pub fn format_error_help(err: &AuthError) -> String {
    match err {
        AuthError::UnknownProvider(name) => {
            let upper = name.to_uppercase();
            format!(
                "Provider '{name}' is not configured. Set {upper}_CLIENT_ID, \
                 {upper}_CLIENT_SECRET and {upper}_REDIRECT_URI or add [providers.{name}] to --config"
            )
        }
        AuthError::MissingConfiguration { key, provider } => {
            format!("Missing configuration '{key}' for {provider}. Check your .env or --config file")
        }
        AuthError::Configuration(msg) => {
            format!("Configuration error: {msg}. Check your .env or --config file")
        }
        AuthError::Provider(upstream) => match upstream.code() {
            Some("invalid_grant") => format!(
                "The provider rejected the code ({upstream}). Codes are single-use and short-lived: \
                 run `socialauth url <provider>` and sign in again"
            ),
            _ => format!("The provider returned an error: {upstream}"),
        },
        AuthError::Network(e) => format!("Network error: {e}. Check connectivity and retry"),
        other => format!("{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use socialauth_core::error::ProviderError;

    #[test]
    fn unknown_provider_names_env_keys() {
        let help = format_error_help(&AuthError::UnknownProvider("twitch".into()));
        assert!(help.contains("TWITCH_CLIENT_ID"));
        assert!(help.contains("[providers.twitch]"));
    }

    #[test]
    fn invalid_grant_suggests_new_sign_in() {
        let err = AuthError::from(ProviderError::with_code("Code is expired.", "invalid_grant"));
        let help = format_error_help(&err);
        assert!(help.contains("Code is expired."));
        assert!(help.contains("socialauth url"));
    }

    #[test]
    fn missing_configuration_includes_key_and_provider() {
        let err = AuthError::MissingConfiguration {
            key: "providers.vk".to_string(),
            provider: "vk".to_string(),
        };
        let help = format_error_help(&err);
        assert!(help.contains("providers.vk"));
        assert!(help.contains("for vk"));
    }

    #[test]
    fn other_error_falls_through_to_display() {
        let help = format_error_help(&AuthError::SignIn("store offline".into()));
        assert!(help.contains("store offline"));
    }
}
