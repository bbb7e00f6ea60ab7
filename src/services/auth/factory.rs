/// Factory: build the authenticator and authorizer from application `Config`.
///
/// The one place that wires the concrete strategy and the policy rules
/// together; everything downstream receives the built values through
/// `AppState` instead of a process-global singleton.
use std::sync::Arc;

use async_trait::async_trait;

use crate::api::dto::user::UserProfile;
use crate::config::{Config, ConfigError};
use crate::services::auth::authenticator::Authenticator;
use crate::services::auth::authorizer::{Authorizer, PolicyRule, RuleContext};
use crate::services::auth::session::CookieOptions;
use crate::services::auth::sso::{SsoOptions, SsoStrategy};

pub fn build_authenticator(
    config: &Config,
    cookie: CookieOptions,
) -> Result<Arc<Authenticator<UserProfile>>, ConfigError> {
    let strategy = SsoStrategy::new(
        SsoOptions {
            client_id: config.sso_client_id.clone(),
            client_secret: config.sso_client_secret.clone(),
            callback_url: config.sso_callback_url.clone(),
            authorize_url: config.sso_authorize_url.clone(),
            token_url: config.sso_token_url.clone(),
            profile_url: config.sso_profile_url.clone(),
            scope: config.sso_scope.clone(),
        },
        // The provider profile is the identity; anything that does not
        // deserialize as a UserProfile is an invalid credential.
        |input| Box::pin(async move { Ok(serde_json::from_value(input.profile).ok()) }),
    )
    .map_err(|_| ConfigError::Invalid("SSO_AUTHORIZE_URL / SSO_TOKEN_URL"))?;

    let authenticator = Arc::new(Authenticator::new().with_cookie_options(cookie));
    authenticator.use_strategy(Arc::new(strategy), None);
    Ok(authenticator)
}

/// Gate for `/admin`.
pub struct IsAdmin;

#[async_trait]
impl PolicyRule<UserProfile> for IsAdmin {
    fn name(&self) -> Option<&str> {
        Some("is_admin")
    }

    async fn check(&self, user: &UserProfile, _cx: &RuleContext) -> anyhow::Result<bool> {
        Ok(user.role == "admin")
    }
}

pub fn build_authorizer(
    authenticator: Arc<Authenticator<UserProfile>>,
) -> Arc<Authorizer<UserProfile>> {
    Arc::new(Authorizer::new(authenticator, vec![Arc::new(IsAdmin)]))
}
