//! Cookie-string parser and session cookie set.
//!
//! The cookie file holds a single browser-style header string: `name=value`
//! pairs separated by `"; "`. Parsing is all-or-nothing — a string with no
//! `"; "` separator at all, or any pair without an `=`, yields zero cookies
//! and an error. Partially applied cookie sets would send a half-valid
//! session to the server, so malformed input is rejected wholesale.

use std::fmt;

use tracing::{debug, instrument};

/// A single `name=value` cookie pair.
///
/// The value is intentionally redacted in Debug output to prevent accidental
/// logging of session tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value (sensitive — never log).
    value: String,
}

impl Cookie {
    /// Creates a new cookie pair.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the cookie value.
    ///
    /// Cookie values are sensitive — avoid logging the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookie")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Immutable set of cookies attached identically to every request in a
/// session. An empty set is valid and means "no cookies".
#[derive(Debug, Clone, Default)]
pub struct CookieSet {
    cookies: Vec<Cookie>,
}

impl CookieSet {
    /// Creates an empty cookie set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the number of cookies in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Returns true when the set holds no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Iterates over the cookie pairs.
    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.iter()
    }

    /// Builds the `Cookie` request-header value, or `None` for an empty set.
    #[must_use]
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Errors that can occur while parsing a cookie string.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    /// The string contains no `"; "` separator at all.
    #[error("invalid cookie format: expected `name=value` pairs separated by \"; \"")]
    MissingSeparator,

    /// A pair had no `=` between name and value.
    #[error("invalid cookie pair at position {index}: no `=` separator")]
    InvalidPair {
        /// 0-based position of the offending pair.
        index: usize,
    },

    /// A pair had an empty name.
    #[error("invalid cookie pair at position {index}: empty name")]
    EmptyName {
        /// 0-based position of the offending pair.
        index: usize,
    },
}

/// Parses a browser-style cookie header string into a [`CookieSet`].
///
/// Rejection is wholesale: any malformed pair invalidates the entire input
/// and no cookies are applied. The value keeps everything after the first
/// `=`, so values containing `=` survive intact.
///
/// # Errors
///
/// Returns [`CookieError::MissingSeparator`] when the input has no `"; "`,
/// [`CookieError::InvalidPair`] or [`CookieError::EmptyName`] for a bad pair.
#[instrument(level = "debug", skip(input))]
pub fn parse_cookie_header(input: &str) -> Result<CookieSet, CookieError> {
    let input = input.trim_end();

    let pairs: Vec<&str> = input.split("; ").collect();
    if pairs.len() == 1 {
        return Err(CookieError::MissingSeparator);
    }

    let mut cookies = Vec::with_capacity(pairs.len());
    for (index, pair) in pairs.iter().enumerate() {
        let Some((name, value)) = pair.split_once('=') else {
            return Err(CookieError::InvalidPair { index });
        };
        if name.is_empty() {
            return Err(CookieError::EmptyName { index });
        }
        cookies.push(Cookie::new(name, value));
    }

    debug!(count = cookies.len(), "parsed cookie string");
    Ok(CookieSet { cookies })
}
