//! Cookie handling for authenticated export requests.

mod cookies;

pub use cookies::{Cookie, CookieError, CookieSet, parse_cookie_header};
