use std::time::Duration;

use serde::{Deserialize, Serialize};

/// RPC version announced in the identify frame.
pub const RPC_VERSION: u32 = 1;

/// Event subscription bitmask sent with identify (`General | Scenes`).
pub const EVENT_SUBSCRIPTIONS: u32 = 33;

/// Request type used to switch the program scene.
pub const SET_CURRENT_PROGRAM_SCENE: &str = "SetCurrentProgramScene";

/// Close code the server uses when the identify authentication is rejected.
pub const CLOSE_AUTHENTICATION_FAILED: u16 = 4009;

/// Maximum time to wait for each handshake frame (hello, identified).
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum time a graceful close may take before the transport is dropped.
pub const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Maximum incoming message size in bytes (1 MB).
pub const WS_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Frame op code.
///
/// Serialized as the bare integer used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum OpCode {
    Hello,
    Identify,
    Identified,
    Reidentify,
    Event,
    Request,
    RequestResponse,
    RequestBatch,
    RequestBatchResponse,
    /// Forward compatibility: unknown op codes deserialize here.
    Unknown(u8),
}

impl From<u8> for OpCode {
    fn from(op: u8) -> Self {
        match op {
            0 => Self::Hello,
            1 => Self::Identify,
            2 => Self::Identified,
            3 => Self::Reidentify,
            5 => Self::Event,
            6 => Self::Request,
            7 => Self::RequestResponse,
            8 => Self::RequestBatch,
            9 => Self::RequestBatchResponse,
            other => Self::Unknown(other),
        }
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self {
        match op {
            OpCode::Hello => 0,
            OpCode::Identify => 1,
            OpCode::Identified => 2,
            OpCode::Reidentify => 3,
            OpCode::Event => 5,
            OpCode::Request => 6,
            OpCode::RequestResponse => 7,
            OpCode::RequestBatch => 8,
            OpCode::RequestBatchResponse => 9,
            OpCode::Unknown(other) => other,
        }
    }
}
