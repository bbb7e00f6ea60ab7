/*
 * Responsibility
 * - Strategy: 認証メカニズムを一枚の契約に揃える
 * - success / failure: 唯一の終端プロトコル (session 書き込み / redirect / typed error)
 */
use async_trait::async_trait;
use axum::http::{HeaderMap, Uri};
use serde::Serialize;

use crate::services::auth::error::{AuthError, AuthorizationError};
use crate::services::auth::flow::AuthFlow;
use crate::services::auth::redirect::RedirectSignal;
use crate::services::auth::session::{CookieOptions, SessionAccessor};

/// What a strategy may inspect about the inbound request: the URI (query
/// parameters of a provider callback) and the headers. Built by the route
/// layer, owned, so strategies never touch the body.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl RequestContext {
    pub fn new(uri: Uri, headers: HeaderMap) -> Self {
        Self { uri, headers }
    }

    /// First query parameter with the given name, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// Fully merged per-call configuration handed to a strategy. Built by the
/// authenticator: call-site overrides win over authenticator defaults, and
/// `name` is always the name the strategy was dispatched under.
#[derive(Debug, Clone)]
pub struct AuthenticateOptions {
    pub name: String,
    pub success_redirect: Option<String>,
    pub failure_redirect: Option<String>,
    pub throw_on_error: bool,
    pub session_key: String,
    pub session_error_key: String,
    pub session_strategy_key: String,
    pub cookie: CookieOptions,
}

/// One authentication mechanism behind a uniform contract.
///
/// `authenticate` must terminate through `success` or `failure`; they are the
/// only paths that keep the session and the produced `AuthFlow` consistent.
/// A verify callback yielding no identity routes through `failure`, never
/// straight out as a user.
#[async_trait]
pub trait Strategy<U>: Send + Sync
where
    U: Serialize + Send + Sync + 'static,
{
    fn name(&self) -> &str;

    async fn authenticate(
        &self,
        cx: &RequestContext,
        session: &dyn SessionAccessor,
        options: &AuthenticateOptions,
    ) -> Result<AuthFlow<U>, AuthError>;

    /// Persist the identity (and the dispatching strategy name) into the
    /// session, then either redirect or resolve with the identity.
    fn success(
        &self,
        user: U,
        session: &dyn SessionAccessor,
        options: &AuthenticateOptions,
    ) -> Result<AuthFlow<U>, AuthError> {
        let raw = serde_json::to_string(&user)?;
        session.set(&options.session_key, raw, &options.cookie);
        session.set(
            &options.session_strategy_key,
            options.name.clone(),
            &options.cookie,
        );
        if let Some(location) = &options.success_redirect {
            return Ok(AuthFlow::Redirect(RedirectSignal::to(location)));
        }
        Ok(AuthFlow::User(user))
    }

    /// Route a rejected credential the way the call site asked for: typed
    /// error, redirect (message stashed under the session error key), or a
    /// plain `AuthFlow::None`.
    fn failure(
        &self,
        message: &str,
        session: &dyn SessionAccessor,
        options: &AuthenticateOptions,
        cause: Option<anyhow::Error>,
    ) -> Result<AuthFlow<U>, AuthError> {
        if options.throw_on_error {
            let error = match cause {
                Some(cause) => AuthorizationError::with_cause(message, cause),
                None => AuthorizationError::new(message),
            };
            return Err(error.into());
        }
        if let Some(location) = &options.failure_redirect {
            session.set(
                &options.session_error_key,
                message.to_string(),
                &options.cookie,
            );
            return Ok(AuthFlow::Redirect(RedirectSignal::to(location)));
        }
        Ok(AuthFlow::None)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use anyhow::anyhow;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct TestUser {
        pub id: u64,
        pub role: String,
    }

    pub fn admin() -> TestUser {
        TestUser {
            id: 1,
            role: "admin".to_string(),
        }
    }

    /// Strategy that resolves a fixed identity, or rejects when none is set.
    pub struct MockStrategy {
        pub user: Option<TestUser>,
    }

    #[async_trait]
    impl Strategy<TestUser> for MockStrategy {
        fn name(&self) -> &str {
            "mock"
        }

        async fn authenticate(
            &self,
            _cx: &RequestContext,
            session: &dyn SessionAccessor,
            options: &AuthenticateOptions,
        ) -> Result<AuthFlow<TestUser>, AuthError> {
            match self.user.clone() {
                Some(user) => self.success(user, session, options),
                None => self.failure(
                    "Invalid credentials",
                    session,
                    options,
                    Some(anyhow!("Invalid credentials")),
                ),
            }
        }
    }

    pub fn request() -> RequestContext {
        RequestContext::new(Uri::from_static("/auth/mock"), HeaderMap::new())
    }

    pub fn options() -> AuthenticateOptions {
        AuthenticateOptions {
            name: "mock".to_string(),
            success_redirect: None,
            failure_redirect: None,
            throw_on_error: false,
            session_key: "user".to_string(),
            session_error_key: "auth:error".to_string(),
            session_strategy_key: "strategy".to_string(),
            cookie: CookieOptions::default(),
        }
    }
}
