use crate::services::auth::redirect::RedirectSignal;

/// Result of an authenticate / is_authenticated call.
///
/// Exactly one of identity, redirect, or "nothing" per call; real faults
/// travel separately as `Err(AuthError)`.
#[derive(Debug)]
pub enum AuthFlow<U> {
    /// Authenticated identity.
    User(U),
    /// The response is fixed; forward this unchanged.
    Redirect(RedirectSignal),
    /// Not authenticated and no redirect was requested.
    None,
}

impl<U> AuthFlow<U> {
    pub fn user(self) -> Option<U> {
        match self {
            AuthFlow::User(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, AuthFlow::User(_))
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, AuthFlow::Redirect(_))
    }
}
