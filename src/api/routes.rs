/*
 * Responsibility
 * - URL 構造を定義
 * - session middleware を掛ける範囲は app.rs 側で決める
 */
use axum::{Router, routing::get};

use crate::state::AppState;

use crate::api::handlers::{
    auth::{callback, login, logout},
    health::health,
    pages::{admin, demo},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/auth/logout", get(logout))
        .route("/auth/{provider}", get(login))
        .route("/auth/{provider}/callback", get(callback))
        .route("/demo", get(demo))
        .route("/admin", get(admin))
}
