/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - authenticator / authorizer / cookie デフォルト
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::api::dto::user::UserProfile;
use crate::services::auth::{Authenticator, Authorizer, CookieOptions};

#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator<UserProfile>>,
    pub authorizer: Arc<Authorizer<UserProfile>>,
    pub cookie: CookieOptions,
}

impl AppState {
    pub fn new(
        authenticator: Arc<Authenticator<UserProfile>>,
        authorizer: Arc<Authorizer<UserProfile>>,
        cookie: CookieOptions,
    ) -> Self {
        Self {
            authenticator,
            authorizer,
            cookie,
        }
    }
}
