//! OBS scene control over WebSocket.
//!
//! Provides a single-session client that authenticates with the
//! hello/identify handshake and switches the program scene.

mod handshake;
mod pumps;
pub mod types;
pub mod ws_client;

pub use types::ConnectionState;
pub use ws_client::{SceneControlClient, SceneError};
