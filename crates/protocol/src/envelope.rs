use serde::{Deserialize, Serialize};

use crate::constants::OpCode;

/// Errors raised while decoding a frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected op {expected:?}, got {got:?}")]
    UnexpectedOp { expected: OpCode, got: OpCode },
}

/// Envelope for every frame on the scene-control socket.
///
/// The `d` field uses `serde_json::value::RawValue` so the payload is only
/// decoded once the op code is known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub op: OpCode,
    pub d: Box<serde_json::value::RawValue>,
}

impl Frame {
    /// Creates a frame with the given op code and payload.
    pub fn new<T: Serialize>(op: OpCode, payload: &T) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_string(payload)?;
        Ok(Self {
            op,
            d: serde_json::value::RawValue::from_string(json)?,
        })
    }

    /// Parses a text frame.
    pub fn from_text(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serializes the frame for sending.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the payload into the given type.
    pub fn parse_payload<T: for<'de> Deserialize<'de>>(&self) -> Result<T, FrameError> {
        Ok(serde_json::from_str(self.d.get())?)
    }

    /// Deserializes the payload after checking the op code.
    pub fn expect_payload<T: for<'de> Deserialize<'de>>(
        &self,
        expected: OpCode,
    ) -> Result<T, FrameError> {
        if self.op != expected {
            return Err(FrameError::UnexpectedOp {
                expected,
                got: self.op,
            });
        }
        self.parse_payload()
    }
}
