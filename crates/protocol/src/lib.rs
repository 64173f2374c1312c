//! Wire protocol for the OBS scene-control WebSocket.

pub mod auth;
pub mod constants;
pub mod envelope;
pub mod messages;

// Re-export primary types for convenience.
pub use constants::OpCode;
pub use envelope::{Frame, FrameError};
pub use messages::{AuthChallenge, Hello, Identified, Identify, Request, RequestResponse};
