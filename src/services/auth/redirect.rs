/*
 * Responsibility
 * - RedirectSignal: 「このリクエストのレスポンスは確定した」を表す制御値
 * - error ではなく戻り値の variant として伝搬させる (例外による制御フロー禁止)
 */
use axum::{
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};

/// Terminal control value fixing the response to an HTTP redirect.
///
/// Always a 307 so the request method survives the hop. This is not an error:
/// every layer above the auth core must forward it unchanged instead of
/// logging or wrapping it.
#[derive(Debug, Clone)]
pub struct RedirectSignal {
    pub status: StatusCode,
    pub location: String,
    pub headers: Option<HeaderMap>,
}

impl RedirectSignal {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            status: StatusCode::TEMPORARY_REDIRECT,
            location: location.into(),
            headers: None,
        }
    }

    pub fn with_headers(location: impl Into<String>, headers: Option<HeaderMap>) -> Self {
        Self {
            status: StatusCode::TEMPORARY_REDIRECT,
            location: location.into(),
            headers,
        }
    }
}

impl IntoResponse for RedirectSignal {
    fn into_response(self) -> Response {
        let mut response = self.status.into_response();
        if let Some(extra) = self.headers {
            for (name, value) in extra.iter() {
                response.headers_mut().insert(name.clone(), value.clone());
            }
        }
        if let Ok(location) = self.location.parse() {
            response.headers_mut().insert(header::LOCATION, location);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_is_always_307() {
        let signal = RedirectSignal::to("/login");
        assert_eq!(signal.status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(signal.location, "/login");
    }

    #[test]
    fn into_response_sets_location_and_extra_headers() {
        let mut extra = HeaderMap::new();
        extra.insert("x-reason", "expired".parse().unwrap());

        let response = RedirectSignal::with_headers("/login", Some(extra)).into_response();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/login");
        assert_eq!(response.headers()["x-reason"], "expired");
    }
}
