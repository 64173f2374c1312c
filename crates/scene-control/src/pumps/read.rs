//! WebSocket read pump: drains server frames after identification.
//!
//! Scene requests are fire-and-forget, so responses are only logged. When
//! the stream ends the session is marked [`ConnectionState::Closed`].

use futures_util::StreamExt;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use wedge_protocol::constants::WS_MAX_MESSAGE_SIZE;
use wedge_protocol::{Frame, OpCode, RequestResponse};

use crate::types::{ConnectionState, SharedState};

/// Reads frames until the stream ends or `cancel` fires.
pub(crate) async fn read_pump<S>(mut read: S, state: SharedState, cancel: CancellationToken)
where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,

            msg = read.next() => {
                match msg {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        handle_text_message(text.as_str());
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        debug!(?frame, "received close frame");
                        break;
                    }
                    Some(Ok(_)) => {} // Ping/pong/binary: ignore
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {e}");
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    if state.leave_identified(ConnectionState::Closed) {
        warn!("OBS connection lost");
    }
}

/// Handles a text frame from the server.
///
/// Returns the parsed response when the frame answers a request.
fn handle_text_message(text: &str) -> Option<RequestResponse> {
    if text.len() > WS_MAX_MESSAGE_SIZE {
        warn!("message too large ({} bytes), dropping", text.len());
        return None;
    }

    let frame = match Frame::from_text(text) {
        Ok(f) => f,
        Err(e) => {
            warn!("failed to parse frame: {e}");
            return None;
        }
    };

    match frame.op {
        OpCode::RequestResponse => match frame.parse_payload::<RequestResponse>() {
            Ok(resp) => {
                if resp.request_status.result {
                    trace!(request_id = %resp.request_id, "request succeeded");
                } else {
                    warn!(
                        request_id = %resp.request_id,
                        request_type = %resp.request_type,
                        code = resp.request_status.code,
                        comment = resp.request_status.comment.as_deref().unwrap_or(""),
                        "request failed"
                    );
                }
                Some(resp)
            }
            Err(e) => {
                warn!("failed to parse request response: {e}");
                None
            }
        },
        op => {
            trace!(?op, "ignoring frame");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[test]
    fn handle_text_parses_request_response() {
        let json = r#"{"op":7,"d":{
            "requestType":"SetCurrentProgramScene",
            "requestId":"4",
            "requestStatus":{"result":false,"code":600,"comment":"missing"}
        }}"#;
        let resp = handle_text_message(json).unwrap();
        assert_eq!(resp.request_id, "4");
        assert!(!resp.request_status.result);
    }

    #[test]
    fn handle_text_ignores_events() {
        let json = r#"{"op":5,"d":{"eventType":"CurrentProgramSceneChanged"}}"#;
        assert!(handle_text_message(json).is_none());
    }

    #[test]
    fn handle_text_ignores_malformed_json() {
        assert!(handle_text_message("not valid json {{{").is_none());
    }

    #[test]
    fn handle_text_rejects_oversized_message() {
        let huge = "x".repeat(WS_MAX_MESSAGE_SIZE + 1);
        assert!(handle_text_message(&huge).is_none());
    }

    #[tokio::test]
    async fn read_pump_closes_session_on_stream_end() {
        let state = SharedState::new();
        state.set(ConnectionState::Identified);

        let empty = stream::empty::<Result<tungstenite::Message, tungstenite::Error>>();
        read_pump(empty, state.clone(), CancellationToken::new()).await;

        assert_eq!(state.get(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn read_pump_leaves_state_on_cancel() {
        let state = SharedState::new();
        state.set(ConnectionState::Identified);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let pending = stream::pending::<Result<tungstenite::Message, tungstenite::Error>>();
        read_pump(pending, state.clone(), cancel).await;

        assert_eq!(state.get(), ConnectionState::Identified);
    }
}
