mod cookie;

pub use cookie::CookieSession;
