/*
 * Responsibility
 * - 認証済み identity の上に ordered policy rules を重ねる
 * - 最初に落ちた rule で short-circuit (以降の rule は実行しない)
 */
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::services::auth::authenticator::{Authenticator, CheckOptions};
use crate::services::auth::error::{AuthError, AuthorizationError};
use crate::services::auth::flow::AuthFlow;
use crate::services::auth::redirect::RedirectSignal;
use crate::services::auth::session::SessionAccessor;

/// What rules may consult besides the identity: route parameters and
/// arbitrary request-scoped context supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct RuleContext {
    pub params: HashMap<String, String>,
    pub context: serde_json::Value,
}

/// One ordered policy predicate. Names are attached explicitly; an anonymous
/// rule reports a generic forbidden message.
#[async_trait]
pub trait PolicyRule<U>: Send + Sync
where
    U: Send + Sync,
{
    fn name(&self) -> Option<&str> {
        None
    }

    /// `Ok(false)` denies; an `Err` is a hard rule failure and propagates
    /// as-is, never silently treated as a denial.
    async fn check(&self, user: &U, cx: &RuleContext) -> anyhow::Result<bool>;
}

/// How a denial should surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Raise {
    /// HTTP outcome: 401 when unauthenticated, 403 when a rule denies.
    #[default]
    Response,
    /// Redirect to `failure_redirect`; configuring this without a target is
    /// an error.
    Redirect,
    /// Typed `AuthorizationError`.
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct AuthorizeOptions {
    pub raise: Raise,
    pub failure_redirect: Option<String>,
}

/// Successful outcome of `authorize`.
#[derive(Debug)]
pub enum Authorized<U> {
    User(U),
    Redirect(RedirectSignal),
}

#[derive(Debug, Error)]
pub enum AuthorizeError {
    /// No identity in the session. Rendered as 401 `{"message":"Not authenticated."}`.
    #[error("Not authenticated.")]
    Unauthenticated,

    /// A rule denied. Rendered as 403 with the carried message.
    #[error("{0}")]
    Forbidden(String),

    /// Raised in `Raise::Error` mode, or when a redirect was requested with
    /// no target (a configuration error).
    #[error(transparent)]
    Authorization(AuthorizationError),

    /// A rule itself failed (I/O etc.). Propagated, not treated as a denial.
    #[error("policy rule failed")]
    Rule(#[source] anyhow::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Layers ordered policy checks on top of an authenticator's session-backed
/// identity.
pub struct Authorizer<U> {
    authenticator: Arc<Authenticator<U>>,
    rules: Vec<Arc<dyn PolicyRule<U>>>,
}

impl<U> Authorizer<U>
where
    U: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(authenticator: Arc<Authenticator<U>>, rules: Vec<Arc<dyn PolicyRule<U>>>) -> Self {
        Self {
            authenticator,
            rules,
        }
    }

    /// Re-check the session identity, then evaluate every rule in declaration
    /// order, stopping at the first denial. An empty rule list passes
    /// trivially and resolves with the identity.
    pub async fn authorize(
        &self,
        session: &dyn SessionAccessor,
        cx: &RuleContext,
        options: &AuthorizeOptions,
    ) -> Result<Authorized<U>, AuthorizeError> {
        let user = match self
            .authenticator
            .is_authenticated(session, CheckOptions::default())?
        {
            AuthFlow::User(user) => user,
            _ => {
                return match options.raise {
                    Raise::Redirect => Self::redirect_or_config_error(options),
                    // Any non-redirect mode surfaces the 401 outcome.
                    _ => Err(AuthorizeError::Unauthenticated),
                };
            }
        };

        for rule in &self.rules {
            let passed = rule
                .check(&user, cx)
                .await
                .map_err(AuthorizeError::Rule)?;
            if passed {
                continue;
            }
            return match options.raise {
                Raise::Redirect => Self::redirect_or_config_error(options),
                Raise::Error => Err(AuthorizeError::Authorization(AuthorizationError::new(
                    match rule.name() {
                        Some(name) => format!("Forbidden by policy {name}"),
                        None => "Forbidden.".to_string(),
                    },
                ))),
                Raise::Response => Err(AuthorizeError::Forbidden(match rule.name() {
                    Some(name) => format!("Forbidden by policy {name}"),
                    None => "Forbidden".to_string(),
                })),
            };
        }

        Ok(Authorized::User(user))
    }

    fn redirect_or_config_error(
        options: &AuthorizeOptions,
    ) -> Result<Authorized<U>, AuthorizeError> {
        match &options.failure_redirect {
            Some(location) => Ok(Authorized::Redirect(RedirectSignal::to(location))),
            None => Err(AuthorizeError::Authorization(AuthorizationError::new(
                "Invalid status code",
            ))),
        }
    }
}
