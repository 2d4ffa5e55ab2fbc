//! CLI argument definitions and command handlers for socialauth.
//!
//! The binary drives one authorization attempt per invocation: print the
//! authorize URL, then feed the `code` from the redirect back through
//! `callback`.

pub mod errors;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::debug;

use socialauth_core::config::AuthConfig;
use socialauth_core::error::AuthError;
use socialauth_core::provider::{AuthRegistry, ProviderInstance, SignInHandler};

/// socialauth OAuth2 sign-in CLI
#[derive(Parser, Debug)]
#[command(name = "socialauth", version, about = "Drive an OAuth2 sign-in from the terminal")]
pub struct Cli {
    /// TOML config file; provider options come from the environment when omitted
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List configured providers
    Providers,
    /// Print the authorize URL for a provider
    Url(UrlArgs),
    /// Exchange a callback code and sign in
    ///
    /// Users are kept in memory for this run only, so every callback creates a
    /// new user and reports `is_new: true`. The output shows what the
    /// provider returned, not an account-linking result.
    Callback(CallbackArgs),
}

/// Arguments for `socialauth url`.
#[derive(Parser, Debug)]
pub struct UrlArgs {
    /// Provider name (google, vk, twitch)
    pub provider: String,
}

/// Arguments for `socialauth callback`.
#[derive(Parser, Debug)]
pub struct CallbackArgs {
    /// Provider name (google, vk, twitch)
    pub provider: String,

    /// Authorization code from the redirect
    #[arg(long)]
    pub code: String,

    /// Opaque state handed to the sign-in handler (JSON, or a plain string)
    #[arg(long)]
    pub state: Option<String>,
}

/// Load config from `path`, or from the environment for the built-in drivers.
pub fn load_config(path: Option<&Path>) -> Result<AuthConfig, AuthError> {
    match path {
        Some(path) => AuthConfig::from_file(path),
        None => Ok(AuthConfig::from_env(
            &socialauth_providers::builtin_provider_names(),
        )),
    }
}

/// Run a parsed command against a registry built from its config.
pub async fn run(cli: Cli) -> Result<(), AuthError> {
    let config = load_config(cli.config.as_deref())?;
    let mut registry = crate::default_registry(&config);
    registry.set_sign_in_func(Arc::new(MemorySignIn::default()));
    debug!(providers = ?registry.provider_names(), "registry ready");

    match cli.command {
        Commands::Providers => {
            let names = handle_providers(&registry);
            if names.is_empty() {
                eprintln!("No providers configured. Set <NAME>_CLIENT_ID or pass --config.");
            }
            for name in names {
                println!("{name}");
            }
        }
        Commands::Url(args) => println!("{}", handle_url(&registry, &args.provider)?),
        Commands::Callback(args) => {
            let result = handle_callback(&registry, &args).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }
    Ok(())
}

pub fn handle_providers(registry: &AuthRegistry) -> Vec<&str> {
    registry.provider_names()
}

pub fn handle_url(registry: &AuthRegistry, provider: &str) -> Result<String, AuthError> {
    registry.get_auth_url(provider)
}

/// Exchange the code, run the sign-in handler and report the outcome as
/// `{provider, user_id, is_new, user}`.
pub async fn handle_callback(
    registry: &AuthRegistry,
    args: &CallbackArgs,
) -> Result<Value, AuthError> {
    let mut provider = registry.get_provider(&args.provider)?;
    provider.exchange_code_to_access_token(&args.code).await?;

    let state = args.state.as_deref().map(parse_state);
    let user = provider.sign_in(state).await?;

    Ok(json!({
        "provider": provider.provider_name(),
        "user_id": provider.state().user_id(),
        "is_new": provider.is_new(),
        "user": user,
    }))
}

fn parse_state(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Find-or-create sign-in against an in-memory user list.
///
/// The list lives as long as the value; the binary builds a new one per run.
#[derive(Default)]
pub struct MemorySignIn {
    users: Mutex<Vec<Value>>,
}

impl MemorySignIn {
    pub fn len(&self) -> usize {
        self.users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SignInHandler for MemorySignIn {
    async fn sign_in(
        &self,
        provider: &mut ProviderInstance,
        state: Option<Value>,
    ) -> Result<Value, AuthError> {
        let provider_name = provider.provider_name().to_string();
        let user_id = provider.user_id().await?.ok_or_else(|| {
            AuthError::SignIn(format!("{provider_name} did not report a user id"))
        })?;
        let name = provider.user_name().await?;

        // lookup and insert under one guard
        let mut users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        let existing = users
            .iter()
            .find(|u| u["provider"] == provider_name.as_str() && u["user_id"] == user_id.as_str())
            .cloned();
        if let Some(user) = existing {
            provider.set_is_new(false);
            return Ok(user);
        }

        let user = json!({
            "id": users.len() + 1,
            "provider": provider_name,
            "user_id": user_id,
            "name": name,
            "state": state,
        });
        users.push(user.clone());
        provider.set_is_new(true);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use socialauth_core::config::ProviderOptions;
    use socialauth_core::provider::{OAuthProvider, Profile, ProviderState, TokenGrant, UserName};

    struct FixedProvider;

    #[async_trait]
    impl OAuthProvider for FixedProvider {
        fn provider_name(&self) -> &str {
            "fixed"
        }

        fn authorize_url(&self, options: &ProviderOptions) -> Result<String, AuthError> {
            Ok(format!("http://localhost/authorize?client_id={}", options.client_id))
        }

        async fn exchange_code(
            &self,
            _options: &ProviderOptions,
            code: &str,
        ) -> Result<TokenGrant, AuthError> {
            Ok(TokenGrant::new(format!("token-for-{code}")))
        }

        async fn fetch_profile(
            &self,
            _options: &ProviderOptions,
            state: &ProviderState,
        ) -> Result<Option<Profile>, AuthError> {
            state.require_access_token("fixed")?;
            tokio::task::yield_now().await;
            Ok(Some(Profile {
                user_id: Some("42".to_string()),
                name: UserName::new(Some("Grace".to_string()), Some("Hopper".to_string())),
                raw: Value::Null,
            }))
        }
    }

    fn registry(store: Arc<MemorySignIn>) -> AuthRegistry {
        let mut registry = AuthRegistry::new();
        registry.register_provider(
            Arc::new(FixedProvider),
            ProviderOptions::new("cli", "secret", "http://localhost/cb"),
        );
        registry.set_sign_in_func(store);
        registry
    }

    fn callback(code: &str, state: Option<&str>) -> CallbackArgs {
        CallbackArgs {
            provider: "fixed".to_string(),
            code: code.to_string(),
            state: state.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn callback_creates_then_reuses_user() {
        let store = Arc::new(MemorySignIn::default());
        let registry = registry(store.clone());

        let first = handle_callback(&registry, &callback("a", Some(r#"{"next":"/home"}"#)))
            .await
            .unwrap();
        assert_eq!(
            first,
            json!({
                "provider": "fixed",
                "user_id": "42",
                "is_new": true,
                "user": {
                    "id": 1,
                    "provider": "fixed",
                    "user_id": "42",
                    "name": { "first_name": "Grace", "last_name": "Hopper" },
                    "state": { "next": "/home" },
                },
            })
        );

        let second = handle_callback(&registry, &callback("b", None)).await.unwrap();
        assert_eq!(second["is_new"], json!(false));
        assert_eq!(second["user"]["id"], json!(1));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_sign_ins_for_one_identity_create_one_user() {
        let store = Arc::new(MemorySignIn::default());
        let registry = registry(store.clone());
        let mut a = registry.get_provider("fixed").unwrap();
        let mut b = registry.get_provider("fixed").unwrap();
        a.exchange_code_to_access_token("a").await.unwrap();
        b.exchange_code_to_access_token("b").await.unwrap();

        let (user_a, user_b) = tokio::join!(a.sign_in(None), b.sign_in(None));

        assert_eq!(user_a.unwrap()["id"], user_b.unwrap()["id"]);
        assert_eq!(store.len(), 1);
        let mut flags = [a.is_new(), b.is_new()];
        flags.sort();
        assert_eq!(flags, [Some(false), Some(true)]);
    }

    #[tokio::test]
    async fn callback_for_unknown_provider_fails() {
        let registry = registry(Arc::new(MemorySignIn::default()));
        let mut args = callback("a", None);
        args.provider = "nope".to_string();

        let err = handle_callback(&registry, &args).await.unwrap_err();
        assert!(matches!(err, AuthError::UnknownProvider(_)));
    }

    #[test]
    fn plain_state_is_kept_as_string() {
        assert_eq!(parse_state("csrf-token"), json!("csrf-token"));
        assert_eq!(parse_state("[1,2]"), json!([1, 2]));
    }

    #[test]
    fn url_and_providers_read_from_registry() {
        let registry = registry(Arc::new(MemorySignIn::default()));
        assert_eq!(handle_providers(&registry), vec!["fixed"]);
        assert_eq!(
            handle_url(&registry, "fixed").unwrap(),
            "http://localhost/authorize?client_id=cli"
        );
    }

    #[test]
    fn load_config_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("socialauth.toml");
        std::fs::write(
            &path,
            "[providers.twitch]\nclient_id = \"t\"\nclient_secret = \"s\"\nredirect_uri = \"http://localhost/cb\"\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.get("twitch").map(|o| o.client_id.as_str()), Some("t"));
    }

    #[test]
    fn callback_help_explains_is_new_is_per_run() {
        use clap::CommandFactory;

        let command = Cli::command();
        let callback = command
            .find_subcommand("callback")
            .expect("callback subcommand");
        let help = callback
            .get_long_about()
            .map(ToString::to_string)
            .unwrap_or_default();

        assert!(help.contains("in memory for this run only"), "{help}");
        assert!(help.contains("is_new: true"), "{help}");
    }

    #[test]
    fn cli_parses_callback_with_global_config() {
        let cli = Cli::parse_from([
            "socialauth",
            "callback",
            "vk",
            "--code",
            "abc",
            "--config",
            "auth.toml",
        ]);
        assert_eq!(cli.config.as_deref(), Some(Path::new("auth.toml")));
        match cli.command {
            Commands::Callback(args) => {
                assert_eq!(args.provider, "vk");
                assert_eq!(args.code, "abc");
                assert_eq!(args.state, None);
            }
            other => panic!("expected callback, got {other:?}"),
        }
    }
}
