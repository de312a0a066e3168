//! Scenario-level integration tests driving [`BrowsingContextProcessor`] and
//! [`dispatcher::dispatch`] against a recording [`CdpConnection`] stand-in,
//! the way the teacher's own `handler` tests drive `Handler` against a fake
//! `Connection` instead of a live socket.
//!
//! `browsingContext.create`'s full "hold the reply until the attach lands"
//! behaviour lives in `Mapper` (it needs the interleaving of an inbound
//! command with an inbound CDP event, which only the runner's own select
//! loop ever sees) and is covered by `mapper.rs`'s own `#[cfg(test)]`
//! module instead, since `Mapper` cannot be constructed here without a real
//! WebSocket connection. This file exercises its CDP round trip plus every
//! other scenario through the public processor/dispatcher surface.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bidi_mapper::bidi;
use bidi_mapper::cdp::{self, CdpEvent, SessionId};
use bidi_mapper::config::MapperConfig;
use bidi_mapper::conn::{CdpClient, CdpConnection};
use bidi_mapper::dispatcher;
use bidi_mapper::domain::ids::RequestId as BidiRequestId;
use bidi_mapper::error::CdpError;
use bidi_mapper::processor::BrowsingContextProcessor;

struct Inner {
    calls: Mutex<Vec<(Option<SessionId>, String, serde_json::Value)>>,
    canned: HashMap<&'static str, serde_json::Value>,
}

/// Stands in for a live browser: every `send_command` is recorded and
/// answered with a canned result keyed by method name, `{}` otherwise.
struct RecordingConnection(Arc<Inner>);

struct RecordingHandle(Arc<Inner>);

impl RecordingHandle {
    fn calls(&self) -> Vec<(Option<SessionId>, String, serde_json::Value)> {
        self.0.calls.lock().unwrap().clone()
    }
}

impl RecordingConnection {
    fn new(canned: HashMap<&'static str, serde_json::Value>) -> Self {
        Self(Arc::new(Inner { calls: Mutex::new(Vec::new()), canned }))
    }

    fn handle(&self) -> RecordingHandle {
        RecordingHandle(self.0.clone())
    }
}

struct RecordingClient {
    inner: Arc<Inner>,
    session_id: Option<SessionId>,
}

#[async_trait::async_trait]
impl CdpClient for RecordingClient {
    fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    async fn send_command(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, CdpError> {
        self.inner
            .calls
            .lock()
            .unwrap()
            .push((self.session_id.clone(), method.to_string(), params));
        Ok(self.inner.canned.get(method).cloned().unwrap_or_else(|| serde_json::json!({})))
    }
}

impl CdpConnection for RecordingConnection {
    fn browser_client(&self) -> Arc<dyn CdpClient> {
        Arc::new(RecordingClient { inner: self.0.clone(), session_id: None })
    }

    fn get_cdp_client(&self, session_id: &SessionId) -> Option<Arc<dyn CdpClient>> {
        Some(Arc::new(RecordingClient { inner: self.0.clone(), session_id: Some(session_id.clone()) }))
    }
}

fn target_info(id: &str, kind: cdp::target::TargetType) -> cdp::target::TargetInfo {
    cdp::target::TargetInfo {
        target_id: cdp::TargetId::new(id),
        target_type: kind,
        title: String::new(),
        url: "about:blank".into(),
        attached: true,
        opener_id: None,
        browser_context_id: None,
    }
}

async fn attach_page(proc: &mut BrowsingContextProcessor, target: &str, session: &str) {
    proc.on_attached_to_target(
        None,
        cdp::target::EventAttachedToTarget {
            session_id: SessionId::new(session),
            target_info: target_info(target, cdp::target::TargetType::Page),
            waiting_for_debugger: true,
        },
    )
    .await;
}

fn event_method(message: &bidi::OutgoingMessage) -> Option<&str> {
    match message {
        bidi::OutgoingMessage::Event { method, .. } => Some(method.as_str()),
        _ => None,
    }
}

/// S1: `browsingContext.create` sends `Target.createTarget` and resolves
/// the new context's id, but the context only exists in storage (and only
/// emits `contextCreated`) once the matching `attachedToTarget` lands.
#[tokio::test]
async fn s1_create_resolves_id_then_attach_populates_the_context() {
    let mut canned = HashMap::new();
    canned.insert("Target.createTarget", serde_json::json!({ "targetId": "t-new" }));
    let conn = RecordingConnection::new(canned);
    let handle = conn.handle();
    let mut proc = BrowsingContextProcessor::new(Arc::new(conn), MapperConfig::default());
    proc.subscribe(vec!["browsingContext".into()], None);

    let command = bidi::IncomingCommand {
        id: 1,
        method: "browsingContext.create".into(),
        params: serde_json::json!({ "type": "tab", "referenceContext": null, "userContext": null }),
    };
    let context_id = dispatcher::begin_create_browsing_context(&mut proc, &command)
        .await
        .expect("Target.createTarget round trip succeeds");
    assert_eq!(context_id.0, "t-new");
    assert!(
        proc.contexts.find_by_id(&context_id).is_none(),
        "context must not exist before the attach lands"
    );

    let calls = handle.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, "Target.createTarget");
    assert_eq!(calls[0].2.get("newWindow").and_then(|v| v.as_bool()), Some(false));

    attach_page(&mut proc, "t-new", "s1").await;

    assert!(proc.contexts.find_by_id(&context_id).is_some());
    let events = proc.drain_events();
    assert!(events.iter().any(|e| event_method(e) == Some("browsingContext.contextCreated")));
}

/// S2: an armed `beforeRequestSent` intercept blocks a matching request
/// until `network.continueRequest` settles it.
#[tokio::test]
async fn s2_intercepted_request_blocks_until_continued() {
    let conn = RecordingConnection::new(HashMap::new());
    let mut proc = BrowsingContextProcessor::new(Arc::new(conn), MapperConfig::default());
    attach_page(&mut proc, "t1", "s1").await;
    proc.drain_events();
    proc.subscribe(vec!["network".into()], None);

    let add = bidi::IncomingCommand {
        id: 2,
        method: "network.addIntercept".into(),
        params: serde_json::json!({ "phases": ["beforeRequestSent"], "urlPatterns": [], "contexts": null }),
    };
    let reply = dispatcher::dispatch(&mut proc, &add).await;
    assert!(matches!(reply, bidi::OutgoingMessage::Success { .. }));

    proc.on_network_event(
        CdpEvent::NetworkRequestWillBeSent(cdp::network::EventRequestWillBeSent {
            request_id: cdp::RequestId::new("r1"),
            loader_id: cdp::LoaderId::new("l1"),
            request: cdp::network::RequestData {
                url: "http://example.com/".into(),
                method: "GET".into(),
                headers: Default::default(),
            },
            redirect_response: None,
        }),
        Some(SessionId::new("s1")),
    );

    let events = proc.drain_events();
    let before_request_sent = events
        .iter()
        .find(|e| event_method(e) == Some("network.beforeRequestSent"))
        .expect("beforeRequestSent was emitted");
    let params = match before_request_sent {
        bidi::OutgoingMessage::Event { params, .. } => params,
        _ => unreachable!(),
    };
    assert_eq!(params.get("isBlocked").and_then(|v| v.as_bool()), Some(true));

    let id = BidiRequestId("r1".into());
    assert!(!proc.requests.get(&id).unwrap().blocked_by.is_empty());

    let continue_cmd = bidi::IncomingCommand {
        id: 3,
        method: "network.continueRequest".into(),
        params: serde_json::json!({ "request": "r1" }),
    };
    let reply = dispatcher::dispatch(&mut proc, &continue_cmd).await;
    assert!(matches!(reply, bidi::OutgoingMessage::Success { .. }));
    proc.requests.get(&id).unwrap().phase_settled.wait().await;
}

/// S3: a redirect re-keys the request under the same id, increments its
/// redirect count and rearms the phase waiter instead of emitting a new
/// `beforeRequestSent` itself (the caller observes that by re-entering the
/// initial transition).
#[tokio::test]
async fn s3_redirect_increments_count_and_rearms_the_same_request() {
    let conn = RecordingConnection::new(HashMap::new());
    let mut proc = BrowsingContextProcessor::new(Arc::new(conn), MapperConfig::default());
    attach_page(&mut proc, "t1", "s1").await;
    proc.drain_events();

    proc.on_network_event(
        CdpEvent::NetworkRequestWillBeSent(cdp::network::EventRequestWillBeSent {
            request_id: cdp::RequestId::new("r1"),
            loader_id: cdp::LoaderId::new("l1"),
            request: cdp::network::RequestData {
                url: "http://example.com/a".into(),
                method: "GET".into(),
                headers: Default::default(),
            },
            redirect_response: None,
        }),
        Some(SessionId::new("s1")),
    );
    proc.drain_events();

    proc.on_network_event(
        CdpEvent::NetworkRequestWillBeSent(cdp::network::EventRequestWillBeSent {
            request_id: cdp::RequestId::new("r1"),
            loader_id: cdp::LoaderId::new("l1"),
            request: cdp::network::RequestData {
                url: "http://example.com/b".into(),
                method: "GET".into(),
                headers: Default::default(),
            },
            redirect_response: Some(cdp::network::ResponseData {
                url: "http://example.com/a".into(),
                status: 302,
                status_text: "Found".into(),
                headers: Default::default(),
                from_disk_cache: false,
            }),
        }),
        Some(SessionId::new("s1")),
    );

    let id = BidiRequestId("r1".into());
    let request = proc.requests.get(&id).expect("the redirected request keeps the same id");
    assert_eq!(request.redirect_count, 1);
    assert_eq!(request.url, "http://example.com/b");
    // A redirect settles the waiter the paused `Fetch.requestPaused`
    // continuation is parked on, it never emits a BiDi event of its own.
    let events = proc.drain_events();
    assert!(!events.iter().any(|e| event_method(e) == Some("network.beforeRequestSent")));
}

/// S4: an OOPIF swap (`Page.frameDetached { reason: "swap" }` followed by a
/// fresh `attachedToTarget` for the same target id) keeps the existing
/// context and its id instead of tearing it down and recreating it.
#[tokio::test]
async fn s4_oopif_swap_keeps_the_existing_context_identity() {
    let conn = RecordingConnection::new(HashMap::new());
    let mut proc = BrowsingContextProcessor::new(Arc::new(conn), MapperConfig::default());
    attach_page(&mut proc, "t1", "s1").await;
    proc.drain_events();

    proc.on_frame_detached(cdp::page::EventFrameDetached {
        frame_id: cdp::FrameId::new("t1"),
        reason: cdp::page::FrameDetachedReason::Swap,
    });
    assert_eq!(proc.contexts.len(), 1, "a swap detach must not remove the context");

    proc.on_attached_to_target(
        None,
        cdp::target::EventAttachedToTarget {
            session_id: SessionId::new("s2"),
            target_info: target_info("t1", cdp::target::TargetType::Page),
            waiting_for_debugger: true,
        },
    )
    .await;

    assert_eq!(proc.contexts.len(), 1, "the swap rebinds the same context, it does not add one");
    assert_eq!(proc.contexts.session_for_context(&"t1".into()), Some(SessionId::new("s2")));
    let events = proc.drain_events();
    assert!(
        !events.iter().any(|e| event_method(e) == Some("browsingContext.contextCreated")),
        "a swap must not look like a second context being created"
    );
}

/// S5: an auth challenge nobody asked to intercept resumes with CDP's own
/// default credential flow and never reaches the BiDi client as an event.
#[tokio::test]
async fn s5_unintercepted_auth_challenge_resumes_with_default() {
    let conn = RecordingConnection::new(HashMap::new());
    let handle = conn.handle();
    let mut proc = BrowsingContextProcessor::new(Arc::new(conn), MapperConfig::default());
    attach_page(&mut proc, "t1", "s1").await;
    proc.drain_events();

    proc.on_auth_required(
        cdp::fetch::EventAuthRequired {
            request_id: cdp::FetchId::new("f1"),
            network_id: Some(cdp::RequestId::new("r1")),
            request: cdp::network::RequestData {
                url: "http://example.com/".into(),
                method: "GET".into(),
                headers: Default::default(),
            },
            frame_id: cdp::FrameId::new("t1"),
            auth_challenge: cdp::fetch::AuthChallenge {
                source: None,
                origin: "http://example.com".into(),
                scheme: "basic".into(),
                realm: String::new(),
            },
        },
        SessionId::new("s1"),
    )
    .await;

    let calls = handle.calls();
    let continue_with_auth = calls
        .iter()
        .find(|(_, method, _)| method == "Fetch.continueWithAuth")
        .expect("the default credential flow was resumed");
    assert_eq!(
        continue_with_auth.2.get("authChallengeResponse").and_then(|r| r.get("response")).and_then(|v| v.as_str()),
        Some("Default")
    );

    let events = proc.drain_events();
    assert!(!events.iter().any(|e| event_method(e) == Some("network.authRequired")));
}

/// S6: removing an intercept id that was never registered is a client
/// error, not a silent no-op.
#[tokio::test]
async fn s6_removing_an_unknown_intercept_is_a_no_such_intercept_error() {
    let conn = RecordingConnection::new(HashMap::new());
    let mut proc = BrowsingContextProcessor::new(Arc::new(conn), MapperConfig::default());

    let remove = bidi::IncomingCommand {
        id: 1,
        method: "network.removeIntercept".into(),
        params: serde_json::json!({ "intercept": "bogus" }),
    };
    let reply = dispatcher::dispatch(&mut proc, &remove).await;
    match reply {
        bidi::OutgoingMessage::Error { error, message, .. } => {
            assert_eq!(error, "no such intercept");
            assert!(message.contains("bogus"));
        }
        _ => panic!("expected an error reply"),
    }
}
