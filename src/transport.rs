//! §6.1 `BidiTransport`: the front-end connection a remote-end client
//! speaks over. `WebSocketTransport` is the ambient default (grounded on
//! the teacher's `conn::Connection`, the same way `conn::WebSocketConnection`
//! is for the outbound CDP side); `mock::MockTransport` is the in-memory
//! stand-in the test suite drives instead of a real socket.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_tungstenite::tokio::ConnectStream;
use async_tungstenite::tungstenite::Message as WsMessage;
use async_tungstenite::WebSocketStream;
use futures::{Sink, Stream, StreamExt};
use pin_project_lite::pin_project;
use thiserror::Error;

use crate::bidi::{IncomingCommand, OutgoingMessage};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Ws(#[from] async_tungstenite::tungstenite::Error),
    #[error("{0}")]
    Serde(#[from] serde_json::Error),
    #[error("transport closed")]
    Closed,
}

/// The inbound half of the remote end: anything that yields decoded BiDi
/// commands and accepts outgoing BiDi messages. The mapper core only ever
/// depends on this trait, never on WebSocket directly (§1, §6.1).
pub trait BidiTransport:
    Stream<Item = Result<IncomingCommand, TransportError>> + Sink<OutgoingMessage, Error = TransportError>
{
}

impl<T> BidiTransport for T where
    T: Stream<Item = Result<IncomingCommand, TransportError>> + Sink<OutgoingMessage, Error = TransportError>
{
}

pin_project! {
    pub struct WebSocketTransport {
        #[pin]
        inner: WebSocketStream<ConnectStream>,
    }
}

impl WebSocketTransport {
    pub fn new(inner: WebSocketStream<ConnectStream>) -> Self {
        Self { inner }
    }
}

impl Stream for WebSocketTransport {
    type Item = Result<IncomingCommand, TransportError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        match futures::ready!(this.inner.poll_next(cx)) {
            Some(Ok(WsMessage::Text(text))) => {
                Poll::Ready(Some(serde_json::from_str(&text).map_err(TransportError::from)))
            }
            Some(Ok(_)) => Poll::Ready(Some(Err(TransportError::Closed))),
            Some(Err(err)) => Poll::Ready(Some(Err(TransportError::from(err)))),
            None => Poll::Ready(None),
        }
    }
}

impl Sink<OutgoingMessage> for WebSocketTransport {
    type Error = TransportError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_ready(cx).map_err(TransportError::from)
    }

    fn start_send(self: Pin<&mut Self>, item: OutgoingMessage) -> Result<(), Self::Error> {
        let text = serde_json::to_string(&item)?;
        self.project().inner.start_send(WsMessage::Text(text)).map_err(TransportError::from)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_flush(cx).map_err(TransportError::from)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_close(cx).map_err(TransportError::from)
    }
}

/// In-memory transport used by integration tests in place of a real socket
/// (§2.1 ambient test tooling).
pub mod mock {
    use super::*;
    use futures::channel::mpsc;

    pub struct MockTransport {
        pub incoming: mpsc::UnboundedReceiver<IncomingCommand>,
        pub outgoing: mpsc::UnboundedSender<OutgoingMessage>,
    }

    /// The test-side handle: feed commands in, observe what the mapper
    /// sends back.
    pub struct MockTransportHandle {
        pub send_command: mpsc::UnboundedSender<IncomingCommand>,
        pub received: mpsc::UnboundedReceiver<OutgoingMessage>,
    }

    pub fn mock_pair() -> (MockTransport, MockTransportHandle) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded();
        let (out_tx, out_rx) = mpsc::unbounded();
        (
            MockTransport { incoming: cmd_rx, outgoing: out_tx },
            MockTransportHandle { send_command: cmd_tx, received: out_rx },
        )
    }

    impl Stream for MockTransport {
        type Item = Result<IncomingCommand, TransportError>;

        fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            self.incoming.poll_next_unpin(cx).map(|opt| opt.map(Ok))
        }
    }

    impl Sink<OutgoingMessage> for MockTransport {
        type Error = TransportError;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn start_send(self: Pin<&mut Self>, item: OutgoingMessage) -> Result<(), Self::Error> {
            self.outgoing.unbounded_send(item).map_err(|_| TransportError::Closed)
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
    }
}
