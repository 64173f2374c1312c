//! Spotify playback and volume control.
//!
//! - [`CredentialManager`] caches an OAuth2 access token and refreshes it
//!   through the refresh-token grant, one refresh at a time.
//! - [`VolumeClient`] sets the active device's volume and drives playback
//!   (play, pause, next, previous), retrying once on 429.
//! - [`VolumeDispatcher`] debounces slider input into serialized sends.

pub mod auth;
pub mod client;
pub mod dispatcher;
pub mod error;
pub mod player;
pub mod types;

#[cfg(test)]
mod test_support;

pub use auth::CredentialManager;
pub use client::VolumeClient;
pub use dispatcher::{VolumeDispatcher, VolumeSender};
pub use error::{AuthError, VolumeError};
pub use player::PlaybackAction;
pub use types::{ClientCredentials, VolumeWarning};
