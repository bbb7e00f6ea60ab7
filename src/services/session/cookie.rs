/*
 * Responsibility
 * - Cookie ヘッダを SessionAccessor として見せる transport 実装
 * - set/delete は pending に積み、response 側で Set-Cookie として適用する
 * - 署名・暗号化はしない (core の non-goal)
 */
use std::collections::HashMap;
use std::sync::Mutex;

use axum::http::{HeaderMap, HeaderValue, header};

use crate::services::auth::session::{CookieOptions, SessionAccessor};

enum Pending {
    Set {
        name: String,
        value: String,
        opts: CookieOptions,
    },
    Delete {
        name: String,
        path: String,
    },
}

/// `SessionAccessor` over one request's cookies.
///
/// Reads come from the parsed `Cookie` header; writes are visible to later
/// reads within the same request and are flushed as `Set-Cookie` headers via
/// `apply_to` once the response exists.
pub struct CookieSession {
    state: Mutex<State>,
    defaults: CookieOptions,
}

struct State {
    values: HashMap<String, String>,
    pending: Vec<Pending>,
}

impl CookieSession {
    pub fn from_headers(headers: &HeaderMap, defaults: CookieOptions) -> Self {
        let mut values = HashMap::new();
        for value in headers.get_all(header::COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            for pair in raw.split(';') {
                if let Some((name, value)) = pair.trim().split_once('=') {
                    values.insert(name.to_string(), decode(value));
                }
            }
        }
        Self {
            state: Mutex::new(State {
                values,
                pending: Vec::new(),
            }),
            defaults,
        }
    }

    /// Flush pending cookie writes onto the response headers.
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        let state = self.state.lock().expect("cookie session lock poisoned");
        for pending in &state.pending {
            let rendered = match pending {
                Pending::Set { name, value, opts } => render_set(name, value, opts),
                Pending::Delete { name, path } => {
                    format!("{}=; Path={}; Max-Age=0", name, path)
                }
            };
            if let Ok(value) = HeaderValue::from_str(&rendered) {
                headers.append(header::SET_COOKIE, value);
            }
        }
    }
}

impl SessionAccessor for CookieSession {
    fn get(&self, key: &str) -> Option<String> {
        self.state
            .lock()
            .expect("cookie session lock poisoned")
            .values
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String, opts: &CookieOptions) {
        let mut state = self.state.lock().expect("cookie session lock poisoned");
        state.values.insert(key.to_string(), value.clone());
        state.pending.push(Pending::Set {
            name: key.to_string(),
            value,
            opts: opts.clone(),
        });
    }

    fn delete(&self, key: &str) {
        let mut state = self.state.lock().expect("cookie session lock poisoned");
        state.values.remove(key);
        let path = self.defaults.path.clone();
        state.pending.push(Pending::Delete {
            name: key.to_string(),
            path,
        });
    }
}

fn render_set(name: &str, value: &str, opts: &CookieOptions) -> String {
    let mut cookie = format!("{}={}; Path={}", name, encode(value), opts.path);
    if let Some(max_age) = opts.max_age {
        cookie.push_str(&format!("; Max-Age={}", max_age));
    }
    if opts.http_only {
        cookie.push_str("; HttpOnly");
    }
    if opts.secure {
        cookie.push_str("; Secure");
    }
    cookie.push_str("; SameSite=");
    cookie.push_str(opts.same_site.as_str());
    cookie
}

// Cookie values carry serialized JSON, so they are form-encoded on the wire.
fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn decode(raw: &str) -> String {
    url::form_urlencoded::parse(format!("v={raw}").as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| raw.to_string())
}
