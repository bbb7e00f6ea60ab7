/*
 * Responsibility
 * - 環境変数や設定の読み込み (SSO provider, callback URL, ポートなど)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub sso_client_id: String,
    pub sso_client_secret: String,
    pub sso_callback_url: String,
    pub sso_authorize_url: String,
    pub sso_token_url: String,
    pub sso_profile_url: String,
    pub sso_scope: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let sso_client_id = std::env::var("SSO_ID").map_err(|_| ConfigError::Missing("SSO_ID"))?;

        let sso_client_secret =
            std::env::var("SSO_SECRET").map_err(|_| ConfigError::Missing("SSO_SECRET"))?;

        let sso_callback_url = std::env::var("SSO_CALLBACK_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}/auth/sso/callback", port));

        let sso_authorize_url = std::env::var("SSO_AUTHORIZE_URL")
            .map_err(|_| ConfigError::Missing("SSO_AUTHORIZE_URL"))?;

        let sso_token_url =
            std::env::var("SSO_TOKEN_URL").map_err(|_| ConfigError::Missing("SSO_TOKEN_URL"))?;

        let sso_profile_url = std::env::var("SSO_PROFILE_URL")
            .map_err(|_| ConfigError::Missing("SSO_PROFILE_URL"))?;

        let sso_scope = std::env::var("SSO_SCOPE").ok().filter(|s| !s.is_empty());

        Ok(Self {
            addr,
            app_env,
            sso_client_id,
            sso_client_secret,
            sso_callback_url,
            sso_authorize_url,
            sso_token_url,
            sso_profile_url,
            sso_scope,
        })
    }
}
