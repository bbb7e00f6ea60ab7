/*
 * Responsibility
 * - SessionAccessor: リクエスト単位の key/value セッション契約
 * - MemorySession: cookie 無しで使える in-memory 実装 (tests / embedding 用)
 */
use std::collections::HashMap;
use std::sync::Mutex;

/// Transport options attached to every session write.
///
/// The auth core never interprets these; it only threads them through to the
/// accessor so a cookie-backed implementation can emit proper `Set-Cookie`
/// attributes.
#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub path: String,
    /// Seconds until expiry. `None` means a session cookie.
    pub max_age: Option<u64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        }
    }
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            max_age: None,
            http_only: true,
            secure: false,
            same_site: SameSite::Lax,
        }
    }
}

/// Request-scoped key/value storage for serialized session state.
///
/// One accessor belongs to exactly one request/response cycle, so
/// implementations do not need cross-request synchronization.
pub trait SessionAccessor: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String, opts: &CookieOptions);
    fn delete(&self, key: &str);
}

/// In-memory `SessionAccessor`. Used by the test suite and by embedders that
/// manage their own transport.
#[derive(Debug, Default)]
pub struct MemorySession {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value, e.g. a pre-existing login for a test.
    pub fn with_value(key: &str, value: impl Into<String>) -> Self {
        let session = Self::new();
        session
            .values
            .lock()
            .expect("session lock poisoned")
            .insert(key.to_string(), value.into());
        session
    }
}

impl SessionAccessor for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .expect("session lock poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String, _opts: &CookieOptions) {
        self.values
            .lock()
            .expect("session lock poisoned")
            .insert(key.to_string(), value);
    }

    fn delete(&self, key: &str) {
        self.values
            .lock()
            .expect("session lock poisoned")
            .remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_session_round_trip() {
        let session = MemorySession::new();
        let opts = CookieOptions::default();

        assert_eq!(session.get("user"), None);
        session.set("user", "{\"id\":1}".to_string(), &opts);
        assert_eq!(session.get("user"), Some("{\"id\":1}".to_string()));
        session.delete("user");
        assert_eq!(session.get("user"), None);
    }
}
