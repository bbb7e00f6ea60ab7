/*
 * Responsibility
 * - auth core の型付きエラー
 * - 設定ミス (strategy 未登録) と認証失敗 (credential 拒否) を区別する
 */
use thiserror::Error;

/// Typed authentication/authorization failure with an optional underlying
/// cause. Produced by `Strategy::failure` when `throw_on_error` is set and by
/// the authorizer's error-raising mode.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AuthorizationError {
    pub message: String,
    #[source]
    pub cause: Option<anyhow::Error>,
}

impl AuthorizationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(message: impl Into<String>, cause: anyhow::Error) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Dispatch to a name nothing was registered under. A deployment bug,
    /// never a request-time condition; surfaced loudly.
    #[error("strategy {name} not found")]
    StrategyNotFound { name: String },

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    /// The session payload could not be (de)serialized as the identity type.
    #[error("invalid session payload")]
    Session(#[from] serde_json::Error),
}
