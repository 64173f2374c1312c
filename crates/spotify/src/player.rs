//! Playback controls for the active device.
//!
//! Same request path as the volume call: bearer token from the
//! [`CredentialManager`](crate::CredentialManager) and one retry on 429.

use reqwest::{Method, StatusCode};
use tracing::debug;

use crate::client::{check_status, VolumeClient};
use crate::error::VolumeError;
use crate::types::PlaybackState;

/// Transport action sent to the active device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackAction {
    Play,
    Pause,
    Next,
    Previous,
}

impl PlaybackAction {
    fn method(self) -> Method {
        match self {
            Self::Play | Self::Pause => Method::PUT,
            Self::Next | Self::Previous => Method::POST,
        }
    }

    fn path(self) -> &'static str {
        match self {
            Self::Play => "/me/player/play",
            Self::Pause => "/me/player/pause",
            Self::Next => "/me/player/next",
            Self::Previous => "/me/player/previous",
        }
    }
}

impl std::fmt::Display for PlaybackAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Next => "next",
            Self::Previous => "previous",
        };
        f.write_str(name)
    }
}

impl VolumeClient {
    /// Sends one transport action.
    pub async fn playback(&self, action: PlaybackAction) -> Result<(), VolumeError> {
        debug!(%action, "sending playback request");
        self.execute(action.method(), action.path(), &[]).await
    }

    /// Resumes playback.
    pub async fn play(&self) -> Result<(), VolumeError> {
        self.playback(PlaybackAction::Play).await
    }

    /// Pauses playback.
    pub async fn pause(&self) -> Result<(), VolumeError> {
        self.playback(PlaybackAction::Pause).await
    }

    /// Skips to the next track.
    pub async fn skip_next(&self) -> Result<(), VolumeError> {
        self.playback(PlaybackAction::Next).await
    }

    /// Skips to the previous track.
    pub async fn skip_previous(&self) -> Result<(), VolumeError> {
        self.playback(PlaybackAction::Previous).await
    }

    /// Pauses when something is playing, resumes otherwise.
    ///
    /// A 204 from `GET /me/player` (no active playback) counts as paused.
    /// Returns the action that was sent.
    pub async fn toggle_playback(&self) -> Result<PlaybackAction, VolumeError> {
        let resp = self.send_with_retry(Method::GET, "/me/player", &[]).await?;
        let playing = match resp.status() {
            StatusCode::NO_CONTENT => false,
            status if status.is_success() => {
                let body = resp.text().await?;
                serde_json::from_str::<PlaybackState>(&body)
                    .map(|state| state.is_playing)
                    .unwrap_or_default()
            }
            _ => {
                check_status(resp).await?;
                false
            }
        };

        let action = if playing {
            PlaybackAction::Pause
        } else {
            PlaybackAction::Play
        };
        self.playback(action).await?;
        Ok(action)
    }
}
