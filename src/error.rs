/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - auth core のエラーを HTTP outcome へ変換
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::{AuthError, AuthorizeError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    /// No identity where one is required.
    #[error("unauthorized")]
    Unauthorized,

    /// A strategy rejected the credential; carries its failure message.
    #[error("{0}")]
    AuthenticationFailed(String),

    /// A policy rule denied the request; carries the forbidden message.
    #[error("{0}")]
    Forbidden(String),

    #[error("internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Not authenticated.".to_string())
            }
            AppError::AuthenticationFailed(message) => (StatusCode::UNAUTHORIZED, message),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error.".to_string(),
            ),
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            // A missing registration is a deployment bug; the diagnostic goes
            // to the log, the client only sees a 500.
            AuthError::StrategyNotFound { name } => {
                tracing::error!(strategy = %name, "authentication strategy not registered");
                AppError::Internal
            }
            AuthError::Authorization(error) => AppError::AuthenticationFailed(error.message),
            AuthError::Session(error) => {
                tracing::warn!(error = %error, "session payload rejected");
                AppError::Unauthorized
            }
        }
    }
}

impl From<AuthorizeError> for AppError {
    fn from(e: AuthorizeError) -> Self {
        match e {
            AuthorizeError::Unauthenticated => AppError::Unauthorized,
            AuthorizeError::Forbidden(message) => AppError::Forbidden(message),
            AuthorizeError::Authorization(error) => {
                tracing::error!(error = %error, "authorizer misconfigured");
                AppError::Internal
            }
            AuthorizeError::Rule(error) => {
                tracing::error!(error = %error, "policy rule failed");
                AppError::Internal
            }
            AuthorizeError::Auth(error) => AppError::from(error),
        }
    }
}
