/*
 * Responsibility
 * - /auth/{provider} と /auth/{provider}/callback の login flow handler
 * - /auth/logout
 * - AuthFlow (user / redirect / none) を HTTP response へ写すだけ。判断は core 側
 */
use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{OriginalUri, Path, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use url::Url;

use crate::api::dto::user::UserProfile;
use crate::error::AppError;
use crate::services::auth::{
    AuthFlow, AuthenticateOverrides, CheckOptions, RequestContext,
};
use crate::services::session::CookieSession;
use crate::state::AppState;

/// GET /auth/{provider} — start the login flow.
///
/// Already-authenticated visitors skip the provider round-trip; everyone else
/// is dispatched to the named strategy with the referring page as the
/// post-login target.
pub async fn login(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Extension(session): Extension<Arc<CookieSession>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let AuthFlow::Redirect(signal) = state.authenticator.is_authenticated(
        session.as_ref(),
        CheckOptions {
            success_redirect: Some("/demo".to_string()),
            ..Default::default()
        },
    )? {
        return Ok(signal.into_response());
    }

    let return_path = referer_path(&headers);
    let cx = RequestContext::new(uri, headers);
    let flow = state
        .authenticator
        .authenticate(
            &provider,
            &cx,
            session.as_ref(),
            AuthenticateOverrides {
                success_redirect: Some(return_path.clone()),
                failure_redirect: Some(return_path),
                throw_on_error: None,
            },
        )
        .await?;
    Ok(flow_response(flow))
}

/// GET /auth/{provider}/callback — finish the login flow.
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Extension(session): Extension<Arc<CookieSession>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let cx = RequestContext::new(uri, headers);
    let flow = state
        .authenticator
        .authenticate(
            &provider,
            &cx,
            session.as_ref(),
            AuthenticateOverrides {
                success_redirect: Some("/demo".to_string()),
                failure_redirect: Some("/".to_string()),
                throw_on_error: None,
            },
        )
        .await?;
    Ok(flow_response(flow))
}

/// GET /auth/logout — destroy the session. Always a redirect home.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<CookieSession>>,
) -> Response {
    state
        .authenticator
        .logout(session.as_ref(), "/")
        .into_response()
}

/// Pathname of the referring page, falling back to the site root.
fn referer_path(headers: &HeaderMap) -> String {
    headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Url::parse(value).ok())
        .map(|url| url.path().to_string())
        .unwrap_or_else(|| "/".to_string())
}

fn flow_response(flow: AuthFlow<UserProfile>) -> Response {
    match flow {
        AuthFlow::User(user) => Json(user).into_response(),
        AuthFlow::Redirect(signal) => signal.into_response(),
        AuthFlow::None => AppError::Unauthorized.into_response(),
    }
}
