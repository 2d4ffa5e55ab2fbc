//! Provider registry: name -> driver + options, plus the sign-in policy.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::sign_in::{SignInHandler, SignInSlot};
use super::{OAuthProvider, ProviderInstance};
use crate::config::ProviderOptions;
use crate::error::AuthError;

struct Registration {
    provider: Arc<dyn OAuthProvider>,
    options: Arc<ProviderOptions>,
}

/// Registry binding provider names to drivers and their options.
///
/// Configure it once at startup (`&mut self` methods), then share it
/// read-only, e.g. behind an `Arc`, while serving requests. Mutating it
/// concurrently with in-flight flows is the host's responsibility to avoid.
#[derive(Default)]
pub struct AuthRegistry {
    registrations: HashMap<String, Registration>,
    sign_in: SignInSlot,
}

impl AuthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver under its [`OAuthProvider::provider_name`].
    ///
    /// A later registration under the same name replaces the earlier one.
    /// Options are not validated here.
    pub fn register_provider(&mut self, provider: Arc<dyn OAuthProvider>, options: ProviderOptions) {
        let name = provider.provider_name().to_string();
        let replaced = self
            .registrations
            .insert(
                name.clone(),
                Registration {
                    provider,
                    options: Arc::new(options),
                },
            )
            .is_some();
        debug!(provider = %name, replaced, "provider registered");
    }

    /// Remove a registration. Returns whether one existed.
    pub fn unregister_provider(&mut self, provider_name: &str) -> bool {
        self.registrations.remove(provider_name).is_some()
    }

    /// Install the sign-in policy, replacing any previous one.
    ///
    /// Instances already handed out observe the new handler.
    pub fn set_sign_in_func(&mut self, handler: Arc<dyn SignInHandler>) {
        self.sign_in.set(handler);
    }

    pub fn sign_in_func(&self) -> Option<Arc<dyn SignInHandler>> {
        self.sign_in.get()
    }

    /// Create a fresh instance for one authorization attempt.
    pub fn get_provider(&self, provider_name: &str) -> Result<ProviderInstance, AuthError> {
        let registration = self.lookup(provider_name)?;
        debug!(provider = provider_name, "provider instance created");
        Ok(ProviderInstance::new(
            registration.provider.clone(),
            registration.options.clone(),
            self.sign_in.clone(),
        ))
    }

    /// Authorize URL for the redirect leg; creates no instance.
    pub fn get_auth_url(&self, provider_name: &str) -> Result<String, AuthError> {
        let registration = self.lookup(provider_name)?;
        registration.provider.authorize_url(&registration.options)
    }

    /// Options stored for a registered provider.
    pub fn options(&self, provider_name: &str) -> Option<&ProviderOptions> {
        self.registrations
            .get(provider_name)
            .map(|r| r.options.as_ref())
    }

    /// Check whether a provider is registered under the given name.
    pub fn has_provider(&self, provider_name: &str) -> bool {
        self.registrations.contains_key(provider_name)
    }

    /// List registered provider names, sorted.
    pub fn provider_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.registrations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn lookup(&self, provider_name: &str) -> Result<&Registration, AuthError> {
        self.registrations
            .get(provider_name)
            .ok_or_else(|| AuthError::UnknownProvider(provider_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::TokenGrant;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        name: &'static str,
        url_calls: AtomicUsize,
    }

    impl StubProvider {
        fn named(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                url_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl OAuthProvider for StubProvider {
        fn provider_name(&self) -> &str {
            self.name
        }

        fn authorize_url(&self, options: &ProviderOptions) -> Result<String, AuthError> {
            self.url_calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!(
                "http://localhost/authorize?client_id={}&redirect_uri={}&response_type=code&scope={}",
                options.client_id,
                options.redirect_uri,
                options.effective_scope(&["profile"], " ")
            ))
        }

        async fn exchange_code(
            &self,
            _options: &ProviderOptions,
            _code: &str,
        ) -> Result<TokenGrant, AuthError> {
            Ok(TokenGrant::new("tok"))
        }
    }

    fn options() -> ProviderOptions {
        ProviderOptions::new("c", "s", "http://localhost/cb")
    }

    #[test]
    fn register_and_get_provider() {
        let mut registry = AuthRegistry::new();
        registry.register_provider(StubProvider::named("stub"), options());

        assert!(registry.has_provider("stub"));
        assert!(!registry.has_provider("unknown"));

        let instance = registry.get_provider("stub").unwrap();
        assert_eq!(instance.provider_name(), "stub");
        assert_eq!(instance.options().client_id, "c");
    }

    #[test]
    fn unknown_provider_fails_for_instance_and_url() {
        let registry = AuthRegistry::new();
        match registry.get_provider("nope") {
            Err(AuthError::UnknownProvider(name)) => assert_eq!(name, "nope"),
            Err(e) => panic!("expected UnknownProvider, got error: {e}"),
            Ok(_) => panic!("expected UnknownProvider, got Ok"),
        }
        assert!(matches!(
            registry.get_auth_url("nope"),
            Err(AuthError::UnknownProvider(_))
        ));
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = AuthRegistry::new();
        registry.register_provider(StubProvider::named("stub"), options());
        registry.register_provider(
            StubProvider::named("stub"),
            ProviderOptions::new("second", "s", "http://localhost/cb"),
        );

        assert_eq!(registry.provider_names(), vec!["stub"]);
        assert_eq!(registry.options("stub").unwrap().client_id, "second");
        assert!(registry.get_auth_url("stub").unwrap().contains("client_id=second"));
    }

    #[test]
    fn auth_url_is_stable_and_needs_no_instance() {
        let stub = StubProvider::named("stub");
        let mut registry = AuthRegistry::new();
        registry.register_provider(stub.clone(), options());

        let first = registry.get_auth_url("stub").unwrap();
        let second = registry.get_auth_url("stub").unwrap();

        assert_eq!(first, second);
        assert!(first.contains("response_type=code"));
        assert!(first.contains("scope=profile"));
        assert_eq!(stub.url_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn every_get_provider_returns_a_fresh_instance() {
        let mut registry = AuthRegistry::new();
        registry.register_provider(StubProvider::named("stub"), options());

        let mut first = registry.get_provider("stub").unwrap();
        first.exchange_code_to_access_token("code").await.unwrap();
        first.set_is_new(true);

        let second = registry.get_provider("stub").unwrap();
        assert_eq!(second.access_token(), None);
        assert_eq!(second.is_new(), None);
        assert_eq!(first.access_token(), Some("tok"));
    }

    #[test]
    fn unregister_removes_provider() {
        let mut registry = AuthRegistry::new();
        registry.register_provider(StubProvider::named("stub"), options());
        assert!(registry.unregister_provider("stub"));
        assert!(!registry.unregister_provider("stub"));
        assert!(registry.provider_names().is_empty());
    }

    #[test]
    fn provider_names_are_sorted() {
        let mut registry = AuthRegistry::new();
        registry.register_provider(StubProvider::named("vk"), options());
        registry.register_provider(StubProvider::named("google"), options());
        registry.register_provider(StubProvider::named("twitch"), options());
        assert_eq!(registry.provider_names(), vec!["google", "twitch", "vk"]);
    }

    struct NullHandler;

    #[async_trait]
    impl SignInHandler for NullHandler {
        async fn sign_in(
            &self,
            _provider: &mut ProviderInstance,
            _state: Option<serde_json::Value>,
        ) -> Result<serde_json::Value, AuthError> {
            Ok(serde_json::Value::Null)
        }
    }

    #[tokio::test]
    async fn handler_set_after_get_provider_is_observed() {
        let mut registry = AuthRegistry::new();
        registry.register_provider(StubProvider::named("stub"), options());
        assert!(registry.sign_in_func().is_none());

        let mut instance = registry.get_provider("stub").unwrap();
        registry.set_sign_in_func(Arc::new(NullHandler));

        assert!(registry.sign_in_func().is_some());
        assert_eq!(instance.sign_in(None).await.unwrap(), serde_json::Value::Null);
    }
}
