pub mod authenticator;
pub mod authorizer;
pub mod error;
pub mod factory;
pub mod flow;
pub mod redirect;
pub mod session;
pub mod sso;
pub mod strategy;

pub use authenticator::{AuthenticateOverrides, Authenticator, CheckOptions};
pub use authorizer::{
    Authorized, AuthorizeError, AuthorizeOptions, Authorizer, PolicyRule, Raise, RuleContext,
};
pub use error::{AuthError, AuthorizationError};
pub use flow::AuthFlow;
pub use redirect::RedirectSignal;
pub use session::{CookieOptions, MemorySession, SameSite, SessionAccessor};
pub use strategy::{AuthenticateOptions, RequestContext, Strategy};
