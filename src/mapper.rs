//! §5.1 runner: the single task that drains inbound BiDi commands and
//! inbound CDP responses/events, keeps [`BrowsingContextProcessor`] and its
//! per-target/per-request futures making progress, and pushes outbound BiDi
//! messages back out over the transport.
//!
//! Grounded on the teacher's `Handler: Stream<Item = Result<CdpEventMessage,
//! CdpError>>` (`handler/mod.rs`): one task owns every manager and is driven
//! by a single poll loop rather than scattered callbacks. The teacher's loop
//! is entirely synchronous inside `poll_next` because nothing it does needs
//! to await; the unblock sequence here does (it sends real CDP commands and
//! waits on their responses), so the loop is written as an `async fn` driven
//! by `StreamExt::next()` on the transport side and `recv()` on the event
//! broadcast side, rather than a hand-rolled `poll_next`. `Mapper::run` is
//! the executor-agnostic driver the teacher's own consumers build on top of
//! `Handler`; the shipped default here is `tokio`, matching the rest of the
//! crate's dependency stack.

use std::collections::HashMap;

use futures::{SinkExt, StreamExt};

use crate::bidi;
use crate::cdp::{CdpEvent, SessionId};
use crate::conn::{CdpConnection, RawIncomingEvent, WebSocketCdpConnection};
use crate::config::MapperConfig;
use crate::dispatcher;
use crate::domain::ids::BrowsingContextId;
use crate::error::CdpError;
use crate::processor::BrowsingContextProcessor;
use crate::transport::{BidiTransport, TransportError};

/// Owns the processor, the outbound BiDi transport, and the inbound CDP
/// event broadcast; `run` drives all three to completion.
pub struct Mapper<T> {
    processor: BrowsingContextProcessor,
    transport: T,
    cdp_events: tokio::sync::broadcast::Receiver<RawIncomingEvent>,
    /// `browsingContext.create` commands whose `Target.createTarget` round
    /// trip has already completed but whose BiDi reply is held back until
    /// the matching `attachedToTarget` lands the context in storage. Keyed
    /// by the context id the new target will have.
    pending_creates: HashMap<BrowsingContextId, u64>,
}

impl<T> Mapper<T>
where
    T: BidiTransport + Unpin,
{
    pub fn new(conn: &WebSocketCdpConnection, transport: T, config: MapperConfig) -> Self {
        let cdp_events = conn.raw().subscribe_events();
        let processor = BrowsingContextProcessor::new(shared_connection(conn), config);
        Self { processor, transport, cdp_events, pending_creates: HashMap::new() }
    }

    /// Marks the mapper's own target (the tab/session the automation client
    /// is driving the mapper from) so `on_attached_to_target` releases its
    /// debugger instead of treating it as an automatable browsing context
    /// (§4.3).
    pub fn set_self_target_id(&mut self, id: crate::cdp::TargetId) {
        self.processor.set_self_target_id(id);
    }

    /// Runs until the transport or the CDP connection closes. Transient
    /// per-command/per-event errors are logged and swallowed (§7: nothing in
    /// here is allowed to panic into the client's connection); only the
    /// transport/connection closing ends the loop.
    pub async fn run(&mut self) -> Result<(), CdpError> {
        loop {
            tokio::select! {
                command = self.transport.next() => {
                    match command {
                        Some(Ok(command)) => self.handle_command(&command).await?,
                        Some(Err(err)) => {
                            tracing::warn!(%err, "malformed inbound bidi command");
                        }
                        None => return Ok(()),
                    }
                }
                event = self.cdp_events.recv() => {
                    match event {
                        Ok(raw) => self.handle_cdp_event(raw).await,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "cdp event broadcast lagged, events were dropped");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => return Ok(()),
                    }
                }
            }
            self.flush_events().await?;
        }
    }

    async fn handle_command(&mut self, command: &bidi::IncomingCommand) -> Result<(), CdpError> {
        if command.method == "browsingContext.create" {
            return self.handle_create_browsing_context(command).await;
        }
        let reply = dispatcher::dispatch(&mut self.processor, command).await;
        self.transport.send(reply).await.map_err(transport_to_cdp_error)
    }

    /// `browsingContext.create` never gets an immediate reply from
    /// [`dispatcher::dispatch`]: once `Target.createTarget` returns, the
    /// command id is stashed in `pending_creates` and the actual
    /// `{context: ...}` result is only sent once the corresponding
    /// `attachedToTarget` is processed below, so the client never sees a
    /// context id before it exists in storage.
    async fn handle_create_browsing_context(&mut self, command: &bidi::IncomingCommand) -> Result<(), CdpError> {
        match dispatcher::begin_create_browsing_context(&mut self.processor, command).await {
            Ok(context_id) => {
                self.pending_creates.insert(context_id, command.id);
                Ok(())
            }
            Err(err) => {
                let reply = bidi::OutgoingMessage::error(Some(command.id), &err);
                self.transport.send(reply).await.map_err(transport_to_cdp_error)
            }
        }
    }

    async fn handle_cdp_event(&mut self, raw: RawIncomingEvent) {
        let RawIncomingEvent { session_id, method, params } = raw;
        let event = CdpEvent::decode(&method, params);
        match event {
            CdpEvent::TargetAttachedToTarget(e) => {
                let target_id = e.target_info.target_id.clone();
                self.processor.on_attached_to_target(session_id, e).await;
                let context_id = BrowsingContextId::from(target_id);
                if let Some(command_id) = self.pending_creates.remove(&context_id) {
                    let reply = bidi::OutgoingMessage::success(
                        command_id,
                        serde_json::json!({ "context": context_id.0 }),
                    );
                    if let Err(err) = self.transport.send(reply).await {
                        tracing::warn!(%err, "failed to send browsingContext.create reply");
                    }
                }
            }
            CdpEvent::TargetDetachedFromTarget(e) => self.processor.on_detached_from_target(e),
            CdpEvent::RuntimeExecutionContextCreated(e) => {
                if let Some(session_id) = session_id {
                    self.processor.on_execution_context_created(session_id, e);
                }
            }
            CdpEvent::TargetTargetCrashed(_) => {
                if let Some(session_id) = session_id {
                    self.processor.on_target_crashed(&session_id);
                }
            }
            CdpEvent::PageFrameAttached(e) => self.processor.on_frame_attached(e),
            CdpEvent::PageFrameDetached(e) => self.processor.on_frame_detached(e),
            CdpEvent::FetchRequestPaused(e) => {
                if let Some(session_id) = session_id {
                    self.processor.on_request_paused(e, session_id).await;
                }
            }
            CdpEvent::FetchAuthRequired(e) => {
                if let Some(session_id) = session_id {
                    self.processor.on_auth_required(e, session_id).await;
                }
            }
            other @ (CdpEvent::NetworkRequestWillBeSent(_)
            | CdpEvent::NetworkRequestWillBeSentExtraInfo(_)
            | CdpEvent::NetworkResponseReceived(_)
            | CdpEvent::NetworkResponseReceivedExtraInfo(_)
            | CdpEvent::NetworkLoadingFailed(_)
            | CdpEvent::NetworkLoadingFinished(_)
            | CdpEvent::NetworkRequestServedFromCache(_)) => {
                self.processor.on_network_event(other, session_id);
            }
            _ => {}
        }
    }

    async fn flush_events(&mut self) -> Result<(), CdpError> {
        for message in self.processor.drain_events() {
            self.transport.send(message).await.map_err(transport_to_cdp_error)?;
        }
        Ok(())
    }
}

fn transport_to_cdp_error(err: TransportError) -> CdpError {
    match err {
        TransportError::Ws(err) => CdpError::Ws(err),
        TransportError::Serde(err) => CdpError::Serde(err),
        TransportError::Closed => CdpError::SessionClosed("transport closed".into()),
    }
}

fn shared_connection(conn: &WebSocketCdpConnection) -> std::sync::Arc<dyn CdpConnection> {
    std::sync::Arc::new(BorrowedConnection { raw: conn.raw().clone() })
}

/// A cheap `CdpConnection` impl over an already-connected socket, used to
/// hand the processor an owned `Arc<dyn CdpConnection>` without requiring
/// callers to have wrapped their connection in one up front.
struct BorrowedConnection {
    raw: std::sync::Arc<crate::conn::WebSocketConnection>,
}

impl CdpConnection for BorrowedConnection {
    fn browser_client(&self) -> std::sync::Arc<dyn crate::conn::CdpClient> {
        std::sync::Arc::new(crate::conn::WebSocketClient::new(self.raw.clone(), None))
    }

    fn get_cdp_client(&self, session_id: &SessionId) -> Option<std::sync::Arc<dyn crate::conn::CdpClient>> {
        Some(std::sync::Arc::new(crate::conn::WebSocketClient::new(
            self.raw.clone(),
            Some(session_id.clone()),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::mock_pair;

    #[tokio::test]
    async fn unknown_command_replies_with_an_error_without_touching_cdp() {
        // Exercises the command half of the loop in isolation: dispatch a
        // single unknown command through a mock transport and confirm the
        // mapper replies instead of hanging or panicking. Building a full
        // `Mapper` needs a live `WebSocketCdpConnection`; the dispatcher path
        // it delegates to is covered directly here instead.
        let (_transport, _handle) = mock_pair();
        let conn = std::sync::Arc::new(NullConnection);
        let mut processor = BrowsingContextProcessor::new(conn, MapperConfig::default());
        let command = bidi::IncomingCommand {
            id: 1,
            method: "bogus.command".into(),
            params: serde_json::Value::Null,
        };
        let reply = dispatcher::dispatch(&mut processor, &command).await;
        match reply {
            bidi::OutgoingMessage::Error { id, .. } => assert_eq!(id, Some(1)),
            _ => panic!("expected an error reply"),
        }
    }

    struct NullConnection;

    impl CdpConnection for NullConnection {
        fn browser_client(&self) -> std::sync::Arc<dyn crate::conn::CdpClient> {
            unimplemented!("not exercised by this test")
        }

        fn get_cdp_client(&self, _session_id: &SessionId) -> Option<std::sync::Arc<dyn crate::conn::CdpClient>> {
            None
        }
    }

    /// Answers `Target.createTarget` with a canned `targetId` and everything
    /// else with `{}`, mirroring `processor.rs`'s own `StubClient`/
    /// `StubConnection` test doubles.
    struct StubClient;

    #[async_trait::async_trait]
    impl crate::conn::CdpClient for StubClient {
        fn session_id(&self) -> Option<&SessionId> {
            None
        }

        async fn send_command(&self, method: &str, _params: serde_json::Value) -> Result<serde_json::Value, CdpError> {
            if method == "Target.createTarget" {
                return Ok(serde_json::json!({ "targetId": "t-new" }));
            }
            Ok(serde_json::json!({}))
        }
    }

    struct StubConnection;

    impl CdpConnection for StubConnection {
        fn browser_client(&self) -> std::sync::Arc<dyn crate::conn::CdpClient> {
            std::sync::Arc::new(StubClient)
        }

        fn get_cdp_client(&self, _session_id: &SessionId) -> Option<std::sync::Arc<dyn crate::conn::CdpClient>> {
            Some(std::sync::Arc::new(StubClient))
        }
    }

    /// S1 at the `Mapper` level: `browsingContext.create`'s reply must not
    /// reach the transport until the matching `attachedToTarget` has landed
    /// the context in storage, even though the `Target.createTarget` round
    /// trip (and thus `pending_creates` bookkeeping) completes first.
    #[tokio::test]
    async fn create_command_reply_waits_for_the_matching_attach() {
        let (transport, mut handle) = mock_pair();
        let (events_tx, events_rx) = tokio::sync::broadcast::channel(16);
        let processor = BrowsingContextProcessor::new(std::sync::Arc::new(StubConnection), MapperConfig::default());
        let mut mapper = Mapper { processor, transport, cdp_events: events_rx, pending_creates: HashMap::new() };

        let create = bidi::IncomingCommand {
            id: 7,
            method: "browsingContext.create".into(),
            params: serde_json::json!({ "type": "tab", "referenceContext": null, "userContext": null }),
        };
        mapper.handle_command(&create).await.unwrap();

        assert!(
            handle.received.try_next().is_err(),
            "no reply may be sent before the new target's attachedToTarget lands"
        );
        assert_eq!(mapper.pending_creates.get(&BrowsingContextId::from("t-new")), Some(&7));

        let attached = serde_json::json!({
            "sessionId": "s-new",
            "targetInfo": {
                "targetId": "t-new",
                "type": "page",
                "title": "",
                "url": "about:blank",
                "attached": true,
                "openerId": null,
                "browserContextId": null,
            },
            "waitingForDebugger": true,
        });
        events_tx
            .send(RawIncomingEvent { session_id: None, method: "Target.attachedToTarget".into(), params: attached })
            .unwrap();
        let raw = mapper.cdp_events.recv().await.unwrap();
        mapper.handle_cdp_event(raw).await;

        let reply = handle.received.try_next().expect("a reply is now queued").expect("channel still open");
        match reply {
            bidi::OutgoingMessage::Success { id, result, .. } => {
                assert_eq!(id, 7);
                assert_eq!(result.get("context").and_then(|v| v.as_str()), Some("t-new"));
            }
            _ => panic!("expected a success reply"),
        }
        assert!(mapper.pending_creates.is_empty());
    }
}
