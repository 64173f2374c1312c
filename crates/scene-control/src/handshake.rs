//! Hello/identify handshake.

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::tungstenite;
use tracing::{debug, warn};

use wedge_protocol::auth::authentication_for;
use wedge_protocol::constants::{CLOSE_AUTHENTICATION_FAILED, HANDSHAKE_TIMEOUT};
use wedge_protocol::{Frame, Hello, Identified, Identify, OpCode};

use crate::ws_client::SceneError;

/// Performs the handshake on a freshly opened socket.
///
/// Reads the hello, answers with identify (authenticated when the server
/// sent a challenge and a password is configured), and waits for the
/// identified acknowledgement.
pub(crate) async fn perform_handshake<S>(ws: &mut S, password: &str) -> Result<Identified, SceneError>
where
    S: Stream<Item = Result<tungstenite::Message, tungstenite::Error>>
        + Sink<tungstenite::Message, Error = tungstenite::Error>
        + Unpin,
{
    let hello: Hello = next_frame(ws)
        .await?
        .expect_payload(OpCode::Hello)
        .map_err(|e| SceneError::Protocol(format!("bad hello: {e}")))?;

    debug!(
        version = hello.obs_web_socket_version.as_deref().unwrap_or("unknown"),
        auth_required = hello.authentication.is_some(),
        "received hello"
    );
    if hello.authentication.is_some() && password.is_empty() {
        warn!("server requires authentication but no password is configured");
    }

    let identify = Identify::new(authentication_for(hello.authentication.as_ref(), password));
    let text = Frame::new(OpCode::Identify, &identify)?.to_text()?;
    ws.send(tungstenite::Message::Text(text.into()))
        .await
        .map_err(|e| SceneError::Connection(e.to_string()))?;

    let identified: Identified = next_frame(ws)
        .await?
        .expect_payload(OpCode::Identified)
        .map_err(|e| SceneError::Protocol(format!("bad identify acknowledgement: {e}")))?;

    debug!(rpc_version = ?identified.negotiated_rpc_version, "identified");
    Ok(identified)
}

/// Waits for the next text frame, skipping ping/pong control frames.
async fn next_frame<S>(ws: &mut S) -> Result<Frame, SceneError>
where
    S: Stream<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    loop {
        let msg = tokio::time::timeout(HANDSHAKE_TIMEOUT, ws.next())
            .await
            .map_err(|_| SceneError::Timeout)?;

        match msg {
            Some(Ok(tungstenite::Message::Text(text))) => {
                return Frame::from_text(text.as_str())
                    .map_err(|e| SceneError::Protocol(format!("malformed frame: {e}")));
            }
            Some(Ok(tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_))) => continue,
            Some(Ok(tungstenite::Message::Close(frame))) => {
                return Err(match frame {
                    Some(f) if u16::from(f.code) == CLOSE_AUTHENTICATION_FAILED => {
                        SceneError::Auth(f.reason.as_str().to_string())
                    }
                    Some(f) => SceneError::Protocol(format!(
                        "server closed the connection ({}): {}",
                        u16::from(f.code),
                        f.reason.as_str()
                    )),
                    None => SceneError::Protocol("server closed the connection".into()),
                });
            }
            Some(Ok(_)) => {
                return Err(SceneError::Protocol("unexpected binary frame".into()));
            }
            Some(Err(e)) => return Err(SceneError::Connection(e.to_string())),
            None => {
                return Err(SceneError::Protocol(
                    "connection ended during handshake".into(),
                ));
            }
        }
    }
}
