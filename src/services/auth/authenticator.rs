/*
 * Responsibility
 * - strategy registry (name → strategy) の所有と dispatch
 * - session key 設定のデフォルトと per-call merge
 * - is_authenticated / logout のセッション操作
 */
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::http::HeaderMap;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::services::auth::error::AuthError;
use crate::services::auth::flow::AuthFlow;
use crate::services::auth::redirect::RedirectSignal;
use crate::services::auth::session::{CookieOptions, SessionAccessor};
use crate::services::auth::strategy::{AuthenticateOptions, RequestContext, Strategy};

/// Call-site overrides for one `authenticate` call. Anything left unset falls
/// back to the authenticator's defaults.
#[derive(Debug, Clone, Default)]
pub struct AuthenticateOverrides {
    pub success_redirect: Option<String>,
    pub failure_redirect: Option<String>,
    pub throw_on_error: Option<bool>,
}

/// Options for `is_authenticated`: either redirect may be set, and both at
/// once is allowed (the identity decides which branch applies).
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub success_redirect: Option<String>,
    pub failure_redirect: Option<String>,
    /// Read a different session slot than the configured default.
    pub session_key: Option<String>,
    /// Extra headers carried on a produced redirect.
    pub headers: Option<HeaderMap>,
}

/// Registry of authentication strategies plus the session-key configuration
/// they all share.
///
/// Registration is expected at setup time; dispatch is the hot path. The
/// registry sits behind a read-mostly lock and the guard is dropped before
/// any strategy I/O is awaited.
pub struct Authenticator<U> {
    strategies: RwLock<HashMap<String, Arc<dyn Strategy<U>>>>,
    pub session_key: String,
    pub session_error_key: String,
    pub session_strategy_key: String,
    throw_on_error: bool,
    cookie: CookieOptions,
}

impl<U> Default for Authenticator<U>
where
    U: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<U> Authenticator<U>
where
    U: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            strategies: RwLock::new(HashMap::new()),
            session_key: "user".to_string(),
            session_error_key: "auth:error".to_string(),
            session_strategy_key: "strategy".to_string(),
            throw_on_error: false,
            cookie: CookieOptions::default(),
        }
    }

    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = key.into();
        self
    }

    pub fn with_session_error_key(mut self, key: impl Into<String>) -> Self {
        self.session_error_key = key.into();
        self
    }

    pub fn with_session_strategy_key(mut self, key: impl Into<String>) -> Self {
        self.session_strategy_key = key.into();
        self
    }

    pub fn with_throw_on_error(mut self, throw_on_error: bool) -> Self {
        self.throw_on_error = throw_on_error;
        self
    }

    pub fn with_cookie_options(mut self, cookie: CookieOptions) -> Self {
        self.cookie = cookie;
        self
    }

    /// Register a strategy. With no explicit name the strategy's own name is
    /// used; registering under an existing name replaces the previous entry.
    /// Chainable.
    pub fn use_strategy(&self, strategy: Arc<dyn Strategy<U>>, name: Option<&str>) -> &Self {
        let key = name.unwrap_or_else(|| strategy.name()).to_string();
        self.registry_write().insert(key, strategy);
        self
    }

    /// Remove a registration. A missing name is a no-op. Chainable.
    pub fn unuse(&self, name: &str) -> &Self {
        self.registry_write().remove(name);
        self
    }

    /// Dispatch to the named strategy with the merged options. An unknown
    /// name is a configuration bug and fails loudly instead of degrading.
    pub async fn authenticate(
        &self,
        strategy: &str,
        cx: &RequestContext,
        session: &dyn SessionAccessor,
        overrides: AuthenticateOverrides,
    ) -> Result<AuthFlow<U>, AuthError> {
        let entry = {
            let registry = self
                .strategies
                .read()
                .expect("strategy registry lock poisoned");
            registry.get(strategy).cloned()
        };
        let Some(entry) = entry else {
            return Err(AuthError::StrategyNotFound {
                name: strategy.to_string(),
            });
        };

        let options = AuthenticateOptions {
            name: strategy.to_string(),
            success_redirect: overrides.success_redirect,
            failure_redirect: overrides.failure_redirect,
            throw_on_error: overrides.throw_on_error.unwrap_or(self.throw_on_error),
            session_key: self.session_key.clone(),
            session_error_key: self.session_error_key.clone(),
            session_strategy_key: self.session_strategy_key.clone(),
            cookie: self.cookie.clone(),
        };
        entry.authenticate(cx, session, &options).await
    }

    /// Check the session for an identity without running any strategy. A pure
    /// read: the session is never mutated here.
    ///
    /// With an identity present `success_redirect` wins; without one
    /// `failure_redirect` applies. Both may be set at once.
    pub fn is_authenticated(
        &self,
        session: &dyn SessionAccessor,
        options: CheckOptions,
    ) -> Result<AuthFlow<U>, AuthError> {
        let key = options.session_key.as_deref().unwrap_or(&self.session_key);
        let user: Option<U> = match session.get(key) {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        };

        if let Some(user) = user {
            if let Some(location) = options.success_redirect {
                return Ok(AuthFlow::Redirect(RedirectSignal::with_headers(
                    location,
                    options.headers,
                )));
            }
            return Ok(AuthFlow::User(user));
        }

        if let Some(location) = options.failure_redirect {
            return Ok(AuthFlow::Redirect(RedirectSignal::with_headers(
                location,
                options.headers,
            )));
        }
        Ok(AuthFlow::None)
    }

    /// Destroy the session identity and fix the response to a redirect.
    /// Terminal by construction: the redirect is the only thing returned,
    /// regardless of whether anyone was logged in.
    pub fn logout(&self, session: &dyn SessionAccessor, redirect_to: &str) -> RedirectSignal {
        session.delete(&self.session_key);
        RedirectSignal::to(redirect_to)
    }

    fn registry_write(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<dyn Strategy<U>>>> {
        self.strategies
            .write()
            .expect("strategy registry lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::session::MemorySession;
    use crate::services::auth::strategy::test_support::{MockStrategy, TestUser, admin, request};

    fn session_with(user: &TestUser) -> MemorySession {
        MemorySession::with_value("user", serde_json::to_string(user).unwrap())
    }

    #[tokio::test]
    async fn authenticate_dispatches_to_the_registered_strategy() {
        let authenticator = Authenticator::<TestUser>::new();
        authenticator.use_strategy(Arc::new(MockStrategy { user: Some(admin()) }), None);

        let session = MemorySession::new();
        let flow = authenticator
            .authenticate("mock", &request(), &session, AuthenticateOverrides::default())
            .await
            .unwrap();

        assert_eq!(flow.user(), Some(admin()));
    }

    #[tokio::test]
    async fn authenticate_supports_custom_registration_names() {
        let authenticator = Authenticator::<TestUser>::new();
        authenticator.use_strategy(
            Arc::new(MockStrategy { user: Some(admin()) }),
            Some("another"),
        );

        let session = MemorySession::new();
        assert!(
            authenticator
                .authenticate("another", &request(), &session, Default::default())
                .await
                .is_ok()
        );
        // The default name was never registered.
        let err = authenticator
            .authenticate("mock", &request(), &session, Default::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::StrategyNotFound { .. }));
    }

    #[tokio::test]
    async fn unknown_strategy_fails_without_running_anything() {
        let authenticator = Authenticator::<TestUser>::new();
        let session = MemorySession::new();

        let err = authenticator
            .authenticate("unknown", &request(), &session, Default::default())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "strategy unknown not found");
        assert_eq!(session.get("user"), None);
    }

    #[tokio::test]
    async fn use_then_unuse_round_trips_to_prior_dispatch_behavior() {
        let authenticator = Authenticator::<TestUser>::new();
        authenticator
            .use_strategy(Arc::new(MockStrategy { user: Some(admin()) }), None)
            .unuse("mock");

        let session = MemorySession::new();
        let err = authenticator
            .authenticate("mock", &request(), &session, Default::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::StrategyNotFound { .. }));

        // Removing an absent name is a no-op, not an error.
        authenticator.unuse("mock");
    }

    #[tokio::test]
    async fn reregistering_a_name_replaces_the_strategy() {
        let authenticator = Authenticator::<TestUser>::new();
        authenticator.use_strategy(Arc::new(MockStrategy { user: Some(admin()) }), None);
        authenticator.use_strategy(Arc::new(MockStrategy { user: None }), None);

        let session = MemorySession::new();
        let flow = authenticator
            .authenticate("mock", &request(), &session, Default::default())
            .await
            .unwrap();
        assert!(matches!(flow, AuthFlow::None));
    }

    #[test]
    fn is_authenticated_returns_the_stored_user() {
        let authenticator = Authenticator::<TestUser>::new();
        let session = session_with(&admin());

        let flow = authenticator
            .is_authenticated(&session, CheckOptions::default())
            .unwrap();
        assert_eq!(flow.user(), Some(admin()));

        // Pure read: the session is untouched and a second call agrees.
        let again = authenticator
            .is_authenticated(&session, CheckOptions::default())
            .unwrap();
        assert_eq!(again.user(), Some(admin()));
    }

    #[test]
    fn is_authenticated_returns_none_for_an_empty_session() {
        let authenticator = Authenticator::<TestUser>::new();
        let session = MemorySession::new();

        let flow = authenticator
            .is_authenticated(&session, CheckOptions::default())
            .unwrap();
        assert!(matches!(flow, AuthFlow::None));
    }

    #[test]
    fn is_authenticated_redirects_when_configured() {
        let authenticator = Authenticator::<TestUser>::new();

        // No identity + failure_redirect.
        let flow = authenticator
            .is_authenticated(
                &MemorySession::new(),
                CheckOptions {
                    failure_redirect: Some("/login".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        match flow {
            AuthFlow::Redirect(signal) => assert_eq!(signal.location, "/login"),
            other => panic!("expected redirect, got {other:?}"),
        }

        // Identity + success_redirect.
        let flow = authenticator
            .is_authenticated(
                &session_with(&admin()),
                CheckOptions {
                    success_redirect: Some("/dashboard".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        match flow {
            AuthFlow::Redirect(signal) => assert_eq!(signal.location, "/dashboard"),
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    #[test]
    fn success_redirect_wins_when_both_redirects_are_set() {
        let authenticator = Authenticator::<TestUser>::new();
        let flow = authenticator
            .is_authenticated(
                &session_with(&admin()),
                CheckOptions {
                    success_redirect: Some("/dashboard".to_string()),
                    failure_redirect: Some("/login".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        match flow {
            AuthFlow::Redirect(signal) => assert_eq!(signal.location, "/dashboard"),
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    #[test]
    fn is_authenticated_honors_a_session_key_override() {
        let authenticator = Authenticator::<TestUser>::new();
        let session = MemorySession::with_value(
            "alt",
            serde_json::to_string(&admin()).unwrap(),
        );

        let flow = authenticator
            .is_authenticated(
                &session,
                CheckOptions {
                    session_key: Some("alt".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(flow.user(), Some(admin()));
    }

    #[test]
    fn logout_clears_the_session_and_always_redirects() {
        let authenticator = Authenticator::<TestUser>::new();
        let session = session_with(&admin());

        let signal = authenticator.logout(&session, "/login");
        assert_eq!(signal.location, "/login");
        assert_eq!(session.get("user"), None);

        // Also terminal with no prior authentication state.
        let signal = authenticator.logout(&MemorySession::new(), "/login");
        assert_eq!(signal.location, "/login");
    }
}
