//! HTTP fetch executor.
//!
//! [`HttpFetcher`] performs exactly one GET per call: no internal retry (the
//! session owns retry), no knowledge of manifest entries or output paths —
//! pure transport. The session's cookies ride along as a single `Cookie`
//! header on every request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::COOKIE;
use tracing::{debug, instrument};
use url::Url;

use crate::auth::CookieSet;

use super::error::FetchError;

/// Connect timeout for export requests.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Read timeout for export requests. Export CSVs are small; a minute is
/// generous.
const READ_TIMEOUT_SECS: u64 = 60;

/// Executes one fetch and reports the outcome.
///
/// The trait is the seam between the session and the network: tests
/// substitute scripted executors, production uses [`HttpFetcher`].
#[async_trait]
pub trait FetchExecutor: Send + Sync {
    /// Fetches `url` once and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on invalid URLs, network failures, timeouts, or
    /// non-success HTTP statuses. Implementations must not retry internally.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// reqwest-backed [`FetchExecutor`].
///
/// Created once per session and reused across fetches for connection
/// pooling.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    cookie_header: Option<String>,
}

impl HttpFetcher {
    /// Creates a fetcher carrying the session's cookies.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(cookies: &CookieSet) -> Self {
        Self::with_timeouts(cookies, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a fetcher with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the supplied timeout
    /// configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_timeouts(
        cookies: &CookieSet,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");

        Self {
            client,
            cookie_header: cookies.header_value(),
        }
    }
}

#[async_trait]
impl FetchExecutor for HttpFetcher {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        // Validate before handing to reqwest so malformed URLs classify as
        // permanent instead of surfacing as an opaque network error.
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let mut request = self.client.get(url);
        if let Some(header) = &self.cookie_header {
            request = request.header(COOKIE, header);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        debug!(bytes = body.len(), "fetch complete");
        Ok(body.to_vec())
    }
}

/// User-Agent identifying the tool and its version.
fn default_user_agent() -> String {
    format!("imdb-exporter/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::parse_cookie_header;

    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_success_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list/export"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"Const,Title\ntt0111161,x\n"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&CookieSet::empty());
        let url = format!("{}/list/export", server.uri());
        let body = fetcher.fetch(&url).await.unwrap();
        assert_eq!(body, b"Const,Title\ntt0111161,x\n");
    }

    #[tokio::test]
    async fn test_fetch_sends_cookie_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list/export"))
            .and(header("Cookie", "session=abc; uu=xyz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok"))
            .mount(&server)
            .await;

        let cookies = parse_cookie_header("session=abc; uu=xyz").unwrap();
        let fetcher = HttpFetcher::new(&cookies);
        let url = format!("{}/list/export", server.uri());
        let body = fetcher.fetch(&url).await.unwrap();
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn test_fetch_without_cookies_sends_no_cookie_header() {
        use wiremock::{Match, Request};

        struct NoCookieMatcher;

        impl Match for NoCookieMatcher {
            fn matches(&self, request: &Request) -> bool {
                !request.headers.contains_key("Cookie")
            }
        }

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list/export"))
            .and(NoCookieMatcher)
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&CookieSet::empty());
        let url = format!("{}/list/export", server.uri());
        assert!(fetcher.fetch(&url).await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_error_status_maps_to_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list/export"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&CookieSet::empty());
        let url = format!("{}/list/export", server.uri());
        let result = fetcher.fetch(&url).await;
        match result {
            Err(FetchError::HttpStatus { status, .. }) => assert_eq!(status, 503),
            other => panic!("expected HttpStatus error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let fetcher = HttpFetcher::new(&CookieSet::empty());
        let result = fetcher.fetch("not-a-valid-url").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_fetch_query_params_preserved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list/export"))
            .and(query_param("list_id", "ratings"))
            .and(query_param("author_id", "ur1234567"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&CookieSet::empty());
        let url = format!(
            "{}/list/export?list_id=ratings&author_id=ur1234567",
            server.uri()
        );
        assert!(fetcher.fetch(&url).await.is_ok());
    }

    #[test]
    fn test_user_agent_identifies_tool() {
        let ua = default_user_agent();
        assert!(ua.contains("imdb-exporter"));
        assert!(ua.contains(env!("CARGO_PKG_VERSION")));
    }
}
