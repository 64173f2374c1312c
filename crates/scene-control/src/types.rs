//! Public types for the scene-control client.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Lifecycle of a scene-control session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session has been opened yet.
    Disconnected,
    /// Transport open, handshake in progress.
    Connecting,
    /// Handshake completed; commands may be sent.
    Identified,
    /// Session ended (handshake failure, server close, or disconnect).
    Closed,
}

impl ConnectionState {
    pub fn is_identified(self) -> bool {
        self == Self::Identified
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Identified => "identified",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Connection state shared between the client and its read pump.
#[derive(Debug, Clone)]
pub(crate) struct SharedState(Arc<Mutex<ConnectionState>>);

impl SharedState {
    pub(crate) fn new() -> Self {
        Self(Arc::new(Mutex::new(ConnectionState::Disconnected)))
    }

    pub(crate) fn get(&self) -> ConnectionState {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set(&self, state: ConnectionState) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Moves an identified session to `to`; other states are left alone.
    ///
    /// Returns `true` if the transition happened.
    pub(crate) fn leave_identified(&self, to: ConnectionState) -> bool {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if *guard == ConnectionState::Identified {
            *guard = to;
            true
        } else {
            false
        }
    }
}
