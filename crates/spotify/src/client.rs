//! Spotify Web API player client.
//!
//! Sends `/me/player` requests with a bearer token from the
//! [`CredentialManager`] and retries once when rate limited. Playback
//! controls live in [`crate::player`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use tracing::{debug, warn};

use crate::auth::CredentialManager;
use crate::error::VolumeError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Wait applied to a 429 without a usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(2);

/// Player client for the active device: volume here, playback in
/// [`crate::player`].
pub struct VolumeClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<CredentialManager>,
}

impl VolumeClient {
    pub fn new(credentials: Arc<CredentialManager>) -> Result<Self, VolumeError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: DEFAULT_API_BASE_URL.to_string(),
            credentials,
        })
    }

    /// Sets a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the active device's volume to `percent` (0..=100).
    ///
    /// A 429 is retried once after the server-suggested delay, with a token
    /// re-fetched for the retry.
    pub async fn set_volume(&self, percent: u8) -> Result<(), VolumeError> {
        debug!(volume = percent, "sending volume request");
        self.execute(
            Method::PUT,
            "/me/player/volume",
            &[("volume_percent", percent.to_string())],
        )
        .await
    }

    /// Sends an authorized player request and maps the final status.
    pub(crate) async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<(), VolumeError> {
        let resp = self.send_with_retry(method, path, query).await?;
        check_status(resp).await
    }

    /// Sends a request, retrying once on 429.
    ///
    /// Returns the response of the last attempt unless that was a 429 too.
    pub(crate) async fn send_with_retry(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, VolumeError> {
        let resp = self.send(method.clone(), path, query).await?;
        if resp.status() != StatusCode::TOO_MANY_REQUESTS {
            return Ok(resp);
        }

        let delay = retry_delay(resp.headers());
        warn!(
            path,
            delay_secs = delay.as_secs(),
            "player request rate limited, retrying"
        );
        tokio::time::sleep(delay).await;

        let resp = self.send(method, path, query).await?;
        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(VolumeError::RateLimited);
        }
        Ok(resp)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, VolumeError> {
        let token = self.credentials.get_access_token().await?;
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.http.request(method.clone(), &url).bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if method != Method::GET {
            request = request.body("");
        }
        Ok(request.send().await?)
    }
}

pub(crate) async fn check_status(resp: reqwest::Response) -> Result<(), VolumeError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    Err(VolumeError::RequestFailed {
        status: status.as_u16(),
        body,
    })
}

/// Delay before retrying a rate-limited request.
///
/// Uses `Retry-After` in whole seconds, at least 1s. Missing or unparsable
/// values fall back to [`DEFAULT_RETRY_AFTER`].
pub fn retry_delay(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
        .map(|secs| Duration::from_secs(secs.max(1) as u64))
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    use crate::test_support::{MockResponse, MockServer};
    use crate::types::ClientCredentials;

    fn headers_with_retry_after(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn client(url: &str) -> VolumeClient {
        let creds = CredentialManager::new(ClientCredentials::default())
            .unwrap()
            .with_token_url("http://127.0.0.1:1")
            .with_cached_token("tok", Duration::from_secs(3600));
        VolumeClient::new(Arc::new(creds))
            .unwrap()
            .with_base_url(url)
    }

    #[test]
    fn retry_delay_uses_header_seconds() {
        assert_eq!(
            retry_delay(&headers_with_retry_after("5")),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn retry_delay_is_at_least_one_second() {
        assert_eq!(
            retry_delay(&headers_with_retry_after("0")),
            Duration::from_secs(1)
        );
        assert_eq!(
            retry_delay(&headers_with_retry_after("-3")),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn retry_delay_falls_back_to_default() {
        assert_eq!(retry_delay(&HeaderMap::new()), DEFAULT_RETRY_AFTER);
        assert_eq!(
            retry_delay(&headers_with_retry_after("soon")),
            DEFAULT_RETRY_AFTER
        );
    }

    #[tokio::test]
    async fn set_volume_success() {
        let server = MockServer::start(vec![MockResponse::empty(204)]).await;

        client(&server.url).set_volume(40).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(
            request.starts_with("PUT /me/player/volume?volume_percent=40 "),
            "{request}"
        );
        assert!(
            request.to_ascii_lowercase().contains("authorization: bearer tok"),
            "{request}"
        );
    }

    #[tokio::test]
    async fn rate_limited_request_is_retried_once() {
        let server = MockServer::start(vec![
            MockResponse::empty(429).with_header("Retry-After", "1"),
            MockResponse::empty(204),
        ])
        .await;

        let start = std::time::Instant::now();
        client(&server.url).set_volume(70).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(1));
        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].contains("volume_percent=70"));
    }

    #[tokio::test]
    async fn second_rate_limit_is_reported() {
        let server =
            MockServer::start(vec![MockResponse::empty(429).with_header("Retry-After", "1")])
                .await;

        let err = client(&server.url).set_volume(10).await.unwrap_err();
        assert!(matches!(err, VolumeError::RateLimited), "got {err:?}");
        assert_eq!(server.request_count(), 2);
    }

    #[tokio::test]
    async fn error_status_carries_body() {
        let server = MockServer::start(vec![MockResponse::json(
            404,
            r#"{"error":{"status":404,"reason":"NO_ACTIVE_DEVICE"}}"#,
        )])
        .await;

        let err = client(&server.url).set_volume(10).await.unwrap_err();
        match err {
            VolumeError::RequestFailed { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("NO_ACTIVE_DEVICE"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(server.request_count(), 1);
    }

    #[tokio::test]
    async fn token_failure_skips_api_call() {
        let server = MockServer::start(vec![MockResponse::empty(204)]).await;
        let token_server =
            MockServer::start(vec![MockResponse::json(401, r#"{"error":"invalid_client"}"#)])
                .await;

        let creds = CredentialManager::new(ClientCredentials::default())
            .unwrap()
            .with_token_url(&token_server.url);
        let client = VolumeClient::new(Arc::new(creds))
            .unwrap()
            .with_base_url(&server.url);

        let err = client.set_volume(10).await.unwrap_err();
        assert!(matches!(err, VolumeError::Auth(_)), "got {err:?}");
        assert_eq!(server.request_count(), 0);
    }
}
