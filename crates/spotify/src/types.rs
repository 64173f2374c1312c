//! API payload types.

use serde::Deserialize;

/// Client credentials used for the refresh-token grant.
#[derive(Clone, Default)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

// Keeps the secret and refresh token out of debug logs.
impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Token endpoint response (internal).
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    /// Seconds until expiry. Kept loose: non-numeric values fall back to
    /// the default lifetime.
    #[serde(default)]
    pub expires_in: Option<serde_json::Value>,
    /// Present when the server rotates the refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Subset of `GET /me/player` used to pick play or pause.
#[derive(Debug, Deserialize)]
pub(crate) struct PlaybackState {
    #[serde(default)]
    pub is_playing: bool,
}

/// Non-fatal failure of a volume send, reported to the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeWarning {
    /// Volume that could not be applied.
    pub value: u8,
    pub message: String,
}
