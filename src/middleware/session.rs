//! Per-request session wiring: cookie jar in, `CurrentUser` into extensions,
//! pending `Set-Cookie` headers out.
//!
//! This is the request hook of the whole gateway — every handler downstream
//! reads the session through the `Arc<CookieSession>` placed here, and an
//! already-established login shows up as a `CurrentUser` extension.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::CurrentUser;
use crate::services::auth::{AuthFlow, CheckOptions};
use crate::services::session::CookieSession;
use crate::state::AppState;

/// Attach the session middleware to a router.
///
/// 例：
/// ```ignore
/// let app = api::routes();
/// let app = middleware::session::apply(app, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, session_middleware))
}

async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let session = Arc::new(CookieSession::from_headers(
        req.headers(),
        state.cookie.clone(),
    ));

    // A corrupt session payload is treated as anonymous, not as a request
    // failure; the strategy flow can establish a fresh one.
    match state
        .authenticator
        .is_authenticated(session.as_ref(), CheckOptions::default())
    {
        Ok(AuthFlow::User(user)) => {
            req.extensions_mut().insert(CurrentUser(user));
        }
        Ok(_) => {}
        Err(err) => {
            tracing::warn!(error = %err, "session payload rejected, continuing anonymous");
        }
    }

    req.extensions_mut().insert(session.clone());

    let mut response = next.run(req).await;
    session.apply_to(response.headers_mut());
    response
}
