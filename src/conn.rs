//! The outbound CDP contract (§6): a `CdpConnection` hands out per-session
//! `CdpClient`s; sending a command is send-only request/response, routed
//! independently per session. The concrete WebSocket transport here is
//! ambient plumbing grounded in the teacher's `conn::Connection`, not core
//! logic — the core only ever depends on the trait.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;

use async_tungstenite::tokio::ConnectStream;
use async_tungstenite::tungstenite::Message as WsMessage;
use async_tungstenite::WebSocketStream;
use futures::channel::oneshot;
use futures::{SinkExt, StreamExt};
use serde::Serialize;

use crate::cdp::SessionId;
use crate::error::CdpError;

/// A single outbound CDP session: the browser-wide session (no id) or a
/// target session attached via `Target.attachToTarget`.
#[async_trait::async_trait]
pub trait CdpClient: Send + Sync {
    fn session_id(&self) -> Option<&SessionId>;

    async fn send_command(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, CdpError>;

    /// §6/§7: the "close"-class predicate the unblock/close sequences use to
    /// tell "the target vanished" apart from a real failure.
    fn is_close_error(&self, err: &CdpError) -> bool {
        err.is_close_error()
    }
}

/// The connection-level contract: `browserClient()` and
/// `getCdpClient(sessionId)` from §6.
pub trait CdpConnection: Send + Sync {
    fn browser_client(&self) -> Arc<dyn CdpClient>;
    fn get_cdp_client(&self, session_id: &SessionId) -> Option<Arc<dyn CdpClient>>;
}

#[derive(Debug, Serialize)]
struct MethodCall {
    id: u64,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    session_id: Option<SessionId>,
    method: Cow<'static, str>,
    params: serde_json::Value,
}

type PendingMap = StdMutex<HashMap<u64, oneshot::Sender<Result<serde_json::Value, CdpError>>>>;

/// Multiplexes commands for every session over one browser-wide WebSocket,
/// the way the real Chrome DevTools endpoint expects (one socket, many
/// `sessionId`-tagged messages) — directly analogous to the teacher's
/// `Connection<T>` + `Handler::on_response` pairing.
pub struct WebSocketConnection {
    write: Mutex<
        futures::stream::SplitSink<WebSocketStream<ConnectStream>, WsMessage>,
    >,
    next_id: AtomicU64,
    pending: Arc<PendingMap>,
    events: tokio::sync::broadcast::Sender<RawIncomingEvent>,
}

#[derive(Debug, Clone)]
pub struct RawIncomingEvent {
    pub session_id: Option<SessionId>,
    pub method: String,
    pub params: serde_json::Value,
}

impl WebSocketConnection {
    pub async fn connect(debug_ws_url: &str) -> Result<Arc<Self>, CdpError> {
        let (ws, _) = async_tungstenite::tokio::connect_async(debug_ws_url).await?;
        let (write, mut read) = ws.split();
        let pending: Arc<PendingMap> = Arc::new(StdMutex::new(HashMap::new()));
        let (events_tx, _) = tokio::sync::broadcast::channel(1024);

        let conn = Arc::new(Self {
            write: Mutex::new(write),
            next_id: AtomicU64::new(0),
            pending: pending.clone(),
            events: events_tx.clone(),
        });

        tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                let Ok(WsMessage::Text(text)) = msg else { continue };
                route_incoming(&text, &pending, &events_tx);
            }
        });

        Ok(conn)
    }

    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<RawIncomingEvent> {
        self.events.subscribe()
    }

    async fn call(
        &self,
        session_id: Option<SessionId>,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, CdpError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(id, tx);

        let call = MethodCall {
            id,
            session_id,
            method: Cow::Owned(method.to_string()),
            params,
        };
        let text = serde_json::to_string(&call)?;
        self.write.lock().await.send(WsMessage::Text(text)).await?;

        rx.await.map_err(|_| CdpError::ChannelClosed)?
    }
}

fn route_incoming(
    text: &str,
    pending: &PendingMap,
    events: &tokio::sync::broadcast::Sender<RawIncomingEvent>,
) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return;
    };
    if let Some(id) = value.get("id").and_then(|v| v.as_u64()) {
        if let Some(tx) = pending.lock().unwrap().remove(&id) {
            let result = if let Some(err) = value.get("error") {
                let code = err.get("code").and_then(|c| c.as_i64()).unwrap_or(-1);
                let message = err
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or_default()
                    .to_string();
                Err(CdpError::Protocol(bidi_mapper_types::ProtocolError { code, message }))
            } else {
                Ok(value.get("result").cloned().unwrap_or(serde_json::Value::Null))
            };
            let _ = tx.send(result);
        }
        return;
    }
    if let Some(method) = value.get("method").and_then(|m| m.as_str()) {
        let session_id = value
            .get("sessionId")
            .and_then(|s| s.as_str())
            .map(SessionId::new);
        let params = value.get("params").cloned().unwrap_or(serde_json::Value::Null);
        let _ = events.send(RawIncomingEvent {
            session_id,
            method: method.to_string(),
            params,
        });
    }
}

/// A thin per-session handle sharing the one multiplexed socket.
pub struct WebSocketClient {
    conn: Arc<WebSocketConnection>,
    session_id: Option<SessionId>,
}

impl WebSocketClient {
    pub fn new(conn: Arc<WebSocketConnection>, session_id: Option<SessionId>) -> Self {
        Self { conn, session_id }
    }
}

#[async_trait::async_trait]
impl CdpClient for WebSocketClient {
    fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    async fn send_command(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, CdpError> {
        self.conn.call(self.session_id.clone(), method, params).await
    }
}

/// Holds one `WebSocketConnection` and lazily hands out per-session clients,
/// implementing the `CdpConnection` contract end to end.
pub struct WebSocketCdpConnection {
    conn: Arc<WebSocketConnection>,
}

impl WebSocketCdpConnection {
    pub async fn connect(debug_ws_url: &str) -> Result<Self, CdpError> {
        Ok(Self {
            conn: WebSocketConnection::connect(debug_ws_url).await?,
        })
    }

    pub fn raw(&self) -> &Arc<WebSocketConnection> {
        &self.conn
    }
}

impl CdpConnection for WebSocketCdpConnection {
    fn browser_client(&self) -> Arc<dyn CdpClient> {
        Arc::new(WebSocketClient::new(self.conn.clone(), None))
    }

    fn get_cdp_client(&self, session_id: &SessionId) -> Option<Arc<dyn CdpClient>> {
        Some(Arc::new(WebSocketClient::new(
            self.conn.clone(),
            Some(session_id.clone()),
        )))
    }
}
