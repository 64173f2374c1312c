//! OAuth2 refresh-token credential cache.
//!
//! [`CredentialManager`] keeps one bearer token and renews it through the
//! refresh-token grant when it is missing or about to expire. Concurrent
//! callers share a single in-flight refresh.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::types::{ClientCredentials, TokenResponse};

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// A token is only handed out while it has at least this much life left.
pub const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Lifetime assumed when the token response carries no `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Upper bound on any lifetime, reported or seeded.
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 3600);

#[derive(Debug, Clone)]
struct Credential {
    token: String,
    expires_at: Instant,
}

impl Credential {
    fn is_fresh(&self, now: Instant) -> bool {
        now + EXPIRY_MARGIN < self.expires_at
    }
}

/// Outcome of one token request, shared by every caller that joined it.
#[derive(Debug, Clone)]
struct Refreshed {
    result: Result<Credential, AuthError>,
    /// Applied even when `result` is an error.
    rotated_refresh_token: Option<String>,
}

type RefreshFuture = Shared<BoxFuture<'static, Refreshed>>;

struct State {
    cached: Option<Credential>,
    refresh_token: String,
    inflight: Option<RefreshFuture>,
}

/// Caches a Spotify access token and refreshes it on demand.
pub struct CredentialManager {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    state: Mutex<State>,
}

impl CredentialManager {
    /// Creates a manager with an empty cache.
    pub fn new(credentials: ClientCredentials) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AuthError::Http(e.to_string()))?;

        Ok(Self {
            http,
            token_url: DEFAULT_TOKEN_URL.to_string(),
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
            state: Mutex::new(State {
                cached: None,
                refresh_token: credentials.refresh_token,
                inflight: None,
            }),
        })
    }

    /// Overrides the token endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Seeds the cache with a token valid for `valid_for` from now, capped
    /// at [`MAX_TOKEN_LIFETIME`].
    pub fn with_cached_token(mut self, token: impl Into<String>, valid_for: Duration) -> Self {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        state.cached = Some(Credential {
            token: token.into(),
            expires_at: expiry_after(valid_for),
        });
        self
    }

    /// Returns a token with more than [`EXPIRY_MARGIN`] of life left.
    ///
    /// Serves the cached token without I/O when it is fresh; otherwise joins
    /// (or starts) the single in-flight refresh and returns its outcome.
    pub async fn get_access_token(&self) -> Result<String, AuthError> {
        let refresh = {
            let mut state = self.lock_state();
            if let Some(cred) = &state.cached
                && cred.is_fresh(Instant::now())
            {
                return Ok(cred.token.clone());
            }

            match &state.inflight {
                Some(inflight) => {
                    debug!("joining in-flight token refresh");
                    inflight.clone()
                }
                None => {
                    debug!("access token missing or expiring, refreshing");
                    let fut = request_token(
                        self.http.clone(),
                        self.token_url.clone(),
                        self.client_id.clone(),
                        self.client_secret.clone(),
                        state.refresh_token.clone(),
                    )
                    .boxed()
                    .shared();
                    state.inflight = Some(fut.clone());
                    fut
                }
            }
        };

        let guard = RefreshGuard {
            manager: self,
            refresh: refresh.clone(),
        };
        let outcome = refresh.await;
        drop(guard);

        outcome.result.map(|cred| cred.token)
    }

    /// Warms the cache. Safe to call repeatedly.
    pub async fn prefetch(&self) -> Result<(), AuthError> {
        self.get_access_token().await.map(|_| ())
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Retires the in-flight refresh a caller waited on, on every exit path.
///
/// A completed refresh is applied to the cache once. A refresh whose caller
/// unwound is dropped so the next call starts over. A refresh whose caller
/// was merely cancelled stays in place for the remaining waiters.
struct RefreshGuard<'a> {
    manager: &'a CredentialManager,
    refresh: RefreshFuture,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.manager.lock_state();
        let is_current = state
            .inflight
            .as_ref()
            .is_some_and(|inflight| inflight.ptr_eq(&self.refresh));
        if !is_current {
            return;
        }

        match self.refresh.peek() {
            Some(outcome) => {
                state.inflight = None;
                if let Some(rotated) = &outcome.rotated_refresh_token {
                    debug!("refresh token rotated");
                    state.refresh_token = rotated.clone();
                }
                if let Ok(cred) = &outcome.result {
                    state.cached = Some(cred.clone());
                }
            }
            None if std::thread::panicking() => {
                warn!("token refresh aborted, discarding it");
                state.inflight = None;
            }
            None => {}
        }
    }
}

fn expiry_after(lifetime: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(lifetime.min(MAX_TOKEN_LIFETIME))
        .unwrap_or(now)
}

/// Exchanges the refresh token for a new access token.
async fn request_token(
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
) -> Refreshed {
    let resp = match http
        .post(&token_url)
        .basic_auth(&client_id, Some(&client_secret))
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
        ])
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => return failed(AuthError::Http(e.to_string())),
    };

    let status = resp.status();
    let body = match resp.text().await {
        Ok(body) => body,
        Err(e) => return failed(AuthError::Http(e.to_string())),
    };

    if !status.is_success() {
        warn!(status = status.as_u16(), "token refresh rejected");
        return failed(AuthError::TokenRefresh {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: TokenResponse = match serde_json::from_str(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return failed(AuthError::MalformedResponse(format!(
                "invalid JSON from token endpoint: {e}"
            )));
        }
    };

    Refreshed {
        result: credential_from(parsed.access_token, parsed.expires_in.as_ref()),
        rotated_refresh_token: parsed.refresh_token,
    }
}

fn failed(err: AuthError) -> Refreshed {
    Refreshed {
        result: Err(err),
        rotated_refresh_token: None,
    }
}

/// Validates a token response into a cacheable credential.
///
/// Lifetimes that do not exceed [`EXPIRY_MARGIN`] are rejected: such a
/// token could never be handed out as fresh.
fn credential_from(
    access_token: Option<String>,
    expires_in: Option<&serde_json::Value>,
) -> Result<Credential, AuthError> {
    let token = access_token.ok_or_else(|| {
        AuthError::MalformedResponse("access_token missing in token response".into())
    })?;
    let lifetime = expires_in
        .and_then(serde_json::Value::as_u64)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TOKEN_LIFETIME);

    if lifetime <= EXPIRY_MARGIN {
        return Err(AuthError::MalformedResponse(format!(
            "token lifetime of {}s does not exceed the {}s expiry margin",
            lifetime.as_secs(),
            EXPIRY_MARGIN.as_secs()
        )));
    }

    info!(expires_in = lifetime.as_secs(), "access token refreshed");
    Ok(Credential {
        token,
        expires_at: expiry_after(lifetime),
    })
}
