/*
 * Responsibility
 * - OAuth2 authorization-code flow の具象 strategy
 * - authorize redirect → callback (code/state) → token exchange → profile fetch → verify
 * - 終端は必ず success / failure プロトコル経由
 */
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::header;
use serde::Deserialize;
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::services::auth::error::AuthError;
use crate::services::auth::flow::AuthFlow;
use crate::services::auth::redirect::RedirectSignal;
use crate::services::auth::session::SessionAccessor;
use crate::services::auth::strategy::{AuthenticateOptions, RequestContext, Strategy};

/// Session slot for the in-flight authorization state nonce.
const STATE_KEY: &str = "oauth2:state";

#[derive(Debug, Clone)]
pub struct SsoOptions {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    pub authorize_url: String,
    pub token_url: String,
    pub profile_url: String,
    pub scope: Option<String>,
}

/// Everything the injected verify callback may consult: the provider tokens
/// and the raw profile document.
#[derive(Debug)]
pub struct SsoVerifyInput {
    pub access_token: String,
    pub profile: serde_json::Value,
}

pub type VerifyFuture<U> =
    Pin<Box<dyn Future<Output = anyhow::Result<Option<U>>> + Send + 'static>>;
type Verify<U> = Box<dyn Fn(SsoVerifyInput) -> VerifyFuture<U> + Send + Sync>;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Strategy for a generic OAuth2 authorization-code provider.
///
/// The first hit (no `code` query parameter) stashes a state nonce in the
/// session and redirects to the provider; the callback hit validates the
/// nonce, exchanges the code, fetches the profile, and hands it to `verify`.
pub struct SsoStrategy<U> {
    options: SsoOptions,
    authorize_url: Url,
    http: reqwest::Client,
    verify: Verify<U>,
}

impl<U> SsoStrategy<U> {
    pub fn new(
        options: SsoOptions,
        verify: impl Fn(SsoVerifyInput) -> VerifyFuture<U> + Send + Sync + 'static,
    ) -> Result<Self, url::ParseError> {
        let authorize_url = Url::parse(&options.authorize_url)?;
        // Fail on a malformed token URL at construction, not mid-login.
        Url::parse(&options.token_url)?;
        Ok(Self {
            options,
            authorize_url,
            http: reqwest::Client::new(),
            verify: Box::new(verify),
        })
    }

    fn authorization_redirect(
        &self,
        session: &dyn SessionAccessor,
        options: &AuthenticateOptions,
    ) -> RedirectSignal {
        let state = URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes());
        session.set(STATE_KEY, state.clone(), &options.cookie);

        let mut url = self.authorize_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.options.client_id)
                .append_pair("redirect_uri", &self.options.callback_url)
                .append_pair("response_type", "code")
                .append_pair("state", &state);
            if let Some(scope) = &self.options.scope {
                query.append_pair("scope", scope);
            }
        }
        RedirectSignal::to(url.as_str())
    }

    async fn exchange_code(&self, code: &str) -> anyhow::Result<TokenResponse> {
        let response = self
            .http
            .post(&self.options.token_url)
            .header(header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.options.callback_url.as_str()),
                ("client_id", self.options.client_id.as_str()),
                ("client_secret", self.options.client_secret.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn fetch_profile(&self, access_token: &str) -> anyhow::Result<serde_json::Value> {
        let response = self
            .http
            .get(&self.options.profile_url)
            .bearer_auth(access_token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl<U> Strategy<U> for SsoStrategy<U>
where
    U: Serialize + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        "sso"
    }

    async fn authenticate(
        &self,
        cx: &RequestContext,
        session: &dyn SessionAccessor,
        options: &AuthenticateOptions,
    ) -> Result<AuthFlow<U>, AuthError> {
        if let Some(error) = cx.query_param("error") {
            return self.failure(
                &format!("Provider rejected the request: {error}"),
                session,
                options,
                None,
            );
        }

        let Some(code) = cx.query_param("code") else {
            return Ok(AuthFlow::Redirect(
                self.authorization_redirect(session, options),
            ));
        };

        let expected = session.get(STATE_KEY);
        if expected.is_none() || expected != cx.query_param("state") {
            return self.failure("Invalid state parameter", session, options, None);
        }
        session.delete(STATE_KEY);

        let token = match self.exchange_code(&code).await {
            Ok(token) => token,
            Err(err) => return self.failure("Token exchange failed", session, options, Some(err)),
        };
        let profile = match self.fetch_profile(&token.access_token).await {
            Ok(profile) => profile,
            Err(err) => return self.failure("Profile fetch failed", session, options, Some(err)),
        };

        let verified = (self.verify)(SsoVerifyInput {
            access_token: token.access_token,
            profile,
        })
        .await;
        match verified {
            Ok(Some(user)) => self.success(user, session, options),
            Ok(None) => self.failure("Invalid credentials", session, options, None),
            Err(err) => self.failure("Verification failed", session, options, Some(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::session::MemorySession;
    use crate::services::auth::strategy::test_support::{TestUser, options};
    use axum::http::{HeaderMap, Uri};
    use std::collections::HashMap;

    fn strategy() -> SsoStrategy<TestUser> {
        SsoStrategy::new(
            SsoOptions {
                client_id: "client-id".to_string(),
                client_secret: "client-secret".to_string(),
                callback_url: "http://localhost:3000/auth/sso/callback".to_string(),
                authorize_url: "https://provider.example/oauth/authorize".to_string(),
                token_url: "https://provider.example/oauth/token".to_string(),
                profile_url: "https://provider.example/api/user".to_string(),
                scope: Some("read:user".to_string()),
            },
            |input| {
                Box::pin(async move { Ok(serde_json::from_value(input.profile).ok()) })
            },
        )
        .unwrap()
    }

    fn context(uri: &str) -> RequestContext {
        RequestContext::new(uri.parse::<Uri>().unwrap(), HeaderMap::new())
    }

    #[tokio::test]
    async fn first_hit_redirects_to_the_provider_with_a_session_backed_state() {
        let strategy = strategy();
        let session = MemorySession::new();

        let flow = strategy
            .authenticate(&context("/auth/sso/callback"), &session, &options())
            .await
            .unwrap();

        let AuthFlow::Redirect(signal) = flow else {
            panic!("expected redirect to the provider");
        };
        let url = Url::parse(&signal.location).unwrap();
        assert_eq!(url.path(), "/oauth/authorize");

        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(query["client_id"], "client-id");
        assert_eq!(query["response_type"], "code");
        assert_eq!(
            query["redirect_uri"],
            "http://localhost:3000/auth/sso/callback"
        );
        assert_eq!(query["scope"], "read:user");
        assert_eq!(session.get("oauth2:state").as_deref(), Some(query["state"].as_str()));
    }

    #[tokio::test]
    async fn state_mismatch_routes_through_failure() {
        let strategy = strategy();
        let session = MemorySession::new();
        session.set(
            "oauth2:state",
            "expected".to_string(),
            &options().cookie,
        );

        let flow = strategy
            .authenticate(
                &context("/auth/sso/callback?code=abc&state=forged"),
                &session,
                &options(),
            )
            .await
            .unwrap();

        assert!(matches!(flow, AuthFlow::None));
    }

    #[tokio::test]
    async fn missing_state_routes_through_failure() {
        let strategy = strategy();
        let session = MemorySession::new();

        let mut opts = options();
        opts.failure_redirect = Some("/".to_string());
        let flow = strategy
            .authenticate(
                &context("/auth/sso/callback?code=abc&state=whatever"),
                &session,
                &opts,
            )
            .await
            .unwrap();

        match flow {
            AuthFlow::Redirect(signal) => assert_eq!(signal.location, "/"),
            other => panic!("expected failure redirect, got {other:?}"),
        }
        assert_eq!(
            session.get("auth:error"),
            Some("Invalid state parameter".to_string())
        );
    }

    #[tokio::test]
    async fn provider_error_parameter_is_a_failure() {
        let strategy = strategy();
        let session = MemorySession::new();
        let mut opts = options();
        opts.throw_on_error = true;

        let err = strategy
            .authenticate(
                &context("/auth/sso/callback?error=access_denied"),
                &session,
                &opts,
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Provider rejected the request: access_denied"
        );
    }

    #[test]
    fn malformed_provider_urls_fail_construction() {
        let result = SsoStrategy::<TestUser>::new(
            SsoOptions {
                client_id: String::new(),
                client_secret: String::new(),
                callback_url: String::new(),
                authorize_url: "not a url".to_string(),
                token_url: "https://provider.example/oauth/token".to_string(),
                profile_url: String::new(),
                scope: None,
            },
            |_| Box::pin(async { Ok(None) }),
        );
        assert!(result.is_err());
    }
}
