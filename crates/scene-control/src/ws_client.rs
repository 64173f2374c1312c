//! WebSocket client for OBS scene control.
//!
//! Opens a session, performs the hello/identify handshake, and sends
//! fire-and-forget `SetCurrentProgramScene` requests.

use futures_util::SinkExt;
use futures_util::StreamExt;
use futures_util::stream::SplitSink;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use wedge_protocol::constants::{DISCONNECT_TIMEOUT, WS_MAX_MESSAGE_SIZE};
use wedge_protocol::{Frame, OpCode, Request};

use crate::types::{ConnectionState, SharedState};

/// Errors from the scene-control client.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("not connected")]
    NotConnected,

    #[error("scene name must not be empty")]
    InvalidScene,

    #[error("handshake timed out")]
    Timeout,

    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open transport of an identified session.
struct Connection {
    write: SplitSink<WsStream, tungstenite::Message>,
    cancel: CancellationToken,
    read_handle: tokio::task::JoinHandle<()>,
}

/// Client owning a single OBS WebSocket session.
///
/// Every operation takes `&mut self`; callers sharing a client across tasks
/// must wrap it in their own lock.
pub struct SceneControlClient {
    url: String,
    password: String,
    state: SharedState,
    last_request_id: u64,
    conn: Option<Connection>,
}

impl SceneControlClient {
    /// Creates a client for the given endpoint. No I/O happens until
    /// [`connect`](Self::connect).
    pub fn new(url: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            password: password.into(),
            state: SharedState::new(),
            last_request_id: 0,
            conn: None,
        }
    }

    /// Returns the endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the current session state.
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Opens the socket and performs the handshake.
    ///
    /// An existing session is disconnected first. Handshake failures leave
    /// the client in [`ConnectionState::Closed`]; nothing is retried.
    pub async fn connect(&mut self) -> Result<(), SceneError> {
        if self.conn.is_some() {
            debug!("replacing existing OBS session");
            self.disconnect().await;
        }

        self.state.set(ConnectionState::Connecting);
        info!(url = %self.url, "connecting to OBS");

        let mut ws_config = tungstenite::protocol::WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);
        let mut ws = match tokio_tungstenite::connect_async_with_config(
            self.url.as_str(),
            Some(ws_config),
            false,
        )
        .await
        {
            Ok((ws, _)) => ws,
            Err(e) => {
                self.state.set(ConnectionState::Disconnected);
                return Err(SceneError::Connection(format!("{}: {e}", self.url)));
            }
        };

        if let Err(e) = crate::handshake::perform_handshake(&mut ws, &self.password).await {
            warn!("OBS handshake failed: {e}");
            match tokio::time::timeout(DISCONNECT_TIMEOUT, ws.close(None)).await {
                Ok(Ok(())) => debug!("OBS connection closed after failed handshake"),
                Ok(Err(e)) => debug!("error while closing OBS connection: {e}"),
                Err(_) => debug!("close after failed handshake timed out"),
            }
            self.state.set(ConnectionState::Closed);
            return Err(e);
        }

        // Identified before the read pump starts so an early close from the
        // server is never overwritten.
        self.state.set(ConnectionState::Identified);

        let (write, read) = ws.split();
        let cancel = CancellationToken::new();
        let read_handle = {
            let state = self.state.clone();
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::read::read_pump(read, state, cancel))
        };

        self.conn = Some(Connection {
            write,
            cancel,
            read_handle,
        });
        info!("OBS session identified");
        Ok(())
    }

    /// Switches the program scene.
    ///
    /// Returns the request id once the frame has been written. The server's
    /// response is not awaited.
    pub async fn set_scene(&mut self, name: &str) -> Result<u64, SceneError> {
        let conn = match self.conn.as_mut() {
            Some(conn) if self.state.get().is_identified() => conn,
            _ => return Err(SceneError::NotConnected),
        };
        if name.is_empty() {
            return Err(SceneError::InvalidScene);
        }

        self.last_request_id += 1;
        let request_id = self.last_request_id;
        let request = Request::set_scene(request_id, name);
        let text = Frame::new(OpCode::Request, &request)?.to_text()?;

        if let Err(e) = conn.write.send(tungstenite::Message::Text(text.into())).await {
            self.state.leave_identified(ConnectionState::Closed);
            return Err(SceneError::Ws(e));
        }

        debug!(scene = name, request_id, "scene switch sent");
        Ok(request_id)
    }

    /// Closes the session.
    ///
    /// Waits at most [`DISCONNECT_TIMEOUT`] for a graceful close, then drops
    /// the transport. Never fails; a no-op when not connected.
    pub async fn disconnect(&mut self) {
        let Some(mut conn) = self.conn.take() else {
            return;
        };

        conn.cancel.cancel();
        match tokio::time::timeout(DISCONNECT_TIMEOUT, conn.write.close()).await {
            Ok(Ok(())) => debug!("OBS connection closed"),
            Ok(Err(e)) => debug!("error while closing OBS connection: {e}"),
            Err(_) => warn!("graceful close timed out, dropping connection"),
        }
        conn.read_handle.abort();
        self.state.set(ConnectionState::Closed);
    }
}

impl Drop for SceneControlClient {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            conn.cancel.cancel();
            conn.read_handle.abort();
        }
    }
}
