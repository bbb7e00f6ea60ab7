/*
 * Responsibility
 * - /demo: ログイン状態を見せるページ (未ログインでも 200)
 * - /admin: Authorizer (is_admin rule) で守られたページ
 */
use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::extractors::CurrentUser;
use crate::error::AppError;
use crate::services::auth::{AuthorizeOptions, Authorized, RuleContext};
use crate::services::session::CookieSession;
use crate::state::AppState;

/// GET /demo — the current user, or a marker object when nobody is logged in.
pub async fn demo(user: Option<CurrentUser>) -> impl IntoResponse {
    match user {
        Some(CurrentUser(user)) => Json(json!({ "user": user })),
        None => Json(json!({ "user": { "invalid": true } })),
    }
}

/// GET /admin — full authorize pass: session identity re-checked, then the
/// ordered policy rules. Denials surface as the 401/403 outcomes.
pub async fn admin(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<CookieSession>>,
) -> Result<Response, AppError> {
    let result = state
        .authorizer
        .authorize(
            session.as_ref(),
            &RuleContext::default(),
            &AuthorizeOptions::default(),
        )
        .await?;

    Ok(match result {
        Authorized::User(user) => Json(json!({ "user": user })).into_response(),
        Authorized::Redirect(signal) => signal.into_response(),
    })
}
