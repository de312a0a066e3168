//! §4.3 BrowsingContextProcessor: owns every storage and reduces CDP events
//! plus inbound BiDi commands into BiDi outbound messages. Grounded on the
//! teacher's `Handler` (`handler/mod.rs`), which plays the identical role
//! for chromiumoxide — one struct owning every manager, driven by a single
//! `on_event`/`on_response`-shaped reducer instead of scattered callbacks.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;

use crate::bidi;
use crate::cdp::{self, CdpEvent, SessionId, TargetId};
use crate::config::MapperConfig;
use crate::conn::CdpConnection;
use crate::domain::browsing_context::BrowsingContext;
use crate::domain::browsing_context_storage::BrowsingContextStorage;
use crate::domain::cdp_target::{self, CdpTarget, PendingPreloadInstall, UnblockPlan};
use crate::domain::ids::{BrowsingContextId, InterceptId, PreloadScriptId, RequestId as BidiRequestId, SubscriptionId, UserContextId};
use crate::domain::network_request::{InterceptPhase, NetworkOutcome, NetworkRequestStorage, NetworkStorage};
use crate::domain::preload_script::PreloadScript;
use crate::domain::preload_script_storage::PreloadScriptStorage;
use crate::domain::realm::{Realm, RealmType};
use crate::domain::realm_storage::RealmStorage;
use crate::domain::url_pattern::UrlPattern;
use crate::error::{BidiError, ErrorCode};
use crate::event_manager::EventManager;

/// A realm waiting to be materialised once the worker's first
/// `Runtime.executionContextCreated` arrives (§4.3 worker/service-worker
/// attach branch).
#[derive(Clone)]
struct PendingWorkerRealm {
    realm_type: RealmType,
    owners: Vec<crate::domain::ids::RealmId>,
}

pub struct BrowsingContextProcessor {
    pub contexts: BrowsingContextStorage,
    pub realms: RealmStorage,
    pub preload_scripts: PreloadScriptStorage,
    pub network: NetworkStorage,
    pub requests: NetworkRequestStorage,
    pub targets: HashMap<TargetId, CdpTarget>,
    pub events: EventManager,
    config: MapperConfig,
    conn: Arc<dyn CdpConnection>,
    self_target_id: Option<TargetId>,
    /// Realm type/ownership staged for a worker session until its default
    /// execution context is reported.
    worker_realms: HashMap<SessionId, PendingWorkerRealm>,
}

impl BrowsingContextProcessor {
    pub fn new(conn: Arc<dyn CdpConnection>, config: MapperConfig) -> Self {
        Self {
            contexts: BrowsingContextStorage::default(),
            realms: RealmStorage::default(),
            preload_scripts: PreloadScriptStorage::default(),
            network: NetworkStorage::default(),
            requests: NetworkRequestStorage::default(),
            targets: HashMap::new(),
            events: EventManager::new(config.event_buffer_bound),
            config,
            conn,
            self_target_id: None,
            worker_realms: HashMap::new(),
        }
    }

    pub fn set_self_target_id(&mut self, id: TargetId) {
        self.self_target_id = Some(id);
    }

    // ---- §4.3 attach/detach -------------------------------------------------

    /// `parent_session_id` is the session the `Target.attachedToTarget`
    /// event itself arrived on — the parent's session when CDP reports it
    /// in flattened mode, distinct from `event.session_id` (the new
    /// target's own session). Worker/service-worker attach needs it to find
    /// the realm that owns the new worker (§4.3).
    pub async fn on_attached_to_target(&mut self, parent_session_id: Option<SessionId>, event: cdp::target::EventAttachedToTarget) {
        let target_info = event.target_info;
        if Some(&target_info.target_id) == self.self_target_id.as_ref() {
            if let Some(client) = self.conn.get_cdp_client(&event.session_id) {
                let _ = cdp_target::release_debugger(client.as_ref()).await;
                let _ = client
                    .send_command("Target.detachFromTarget", json!({ "sessionId": event.session_id }))
                    .await;
            }
            return;
        }

        use cdp::target::TargetType;
        match target_info.target_type {
            TargetType::Page | TargetType::Iframe => {
                self.attach_browsing_context(event.session_id, target_info).await;
            }
            TargetType::Worker | TargetType::ServiceWorker => {
                let Some(parent_session_id) = parent_session_id else {
                    return;
                };
                let Some(parent_realm) = self.realms.find_by_session(&parent_session_id).next() else {
                    // Owning realm already gone; the worker is already
                    // terminated from the BiDi client's point of view.
                    return;
                };
                let realm_type = if matches!(target_info.target_type, TargetType::ServiceWorker) {
                    RealmType::ServiceWorker
                } else {
                    RealmType::DedicatedWorker
                };
                self.worker_realms.insert(
                    event.session_id.clone(),
                    PendingWorkerRealm { realm_type, owners: vec![parent_realm.id.clone()] },
                );
                self.create_cdp_target(event.session_id, target_info.target_id, None).await;
            }
            TargetType::SharedWorker => {
                self.worker_realms.insert(
                    event.session_id.clone(),
                    PendingWorkerRealm { realm_type: RealmType::SharedWorker, owners: Vec::new() },
                );
                self.create_cdp_target(event.session_id, target_info.target_id, None).await;
            }
            _ => {
                if let Some(client) = self.conn.get_cdp_client(&event.session_id) {
                    let _ = cdp_target::release_debugger(client.as_ref()).await;
                }
            }
        }
    }

    /// `Runtime.executionContextCreated` (§3 Realm, §4.3 worker branch):
    /// materialises a window realm when `session_id` drives a browsing
    /// context, or the realm staged in `worker_realms` when it drives a
    /// bare worker target.
    pub fn on_execution_context_created(&mut self, session_id: SessionId, event: cdp::runtime::EventExecutionContextCreated) {
        let desc = event.context;
        if let Some(context_id) = self.contexts.find_by_session(&session_id).map(|c| c.id.clone()) {
            if desc.is_default() {
                self.realms.invalidate_context(&context_id);
            }
            let sandbox = if desc.is_default() { None } else { Some(desc.name.clone()) };
            self.realms.insert(Realm {
                id: crate::domain::ids::RealmId::new(),
                realm_type: RealmType::Window { sandbox },
                origin: desc.origin,
                execution_context_id: desc.id,
                session: session_id,
                browsing_context: Some(context_id),
                owners: Vec::new(),
            });
            return;
        }

        if let Some(pending) = self.worker_realms.get(&session_id).cloned() {
            self.realms.insert(Realm {
                id: crate::domain::ids::RealmId::new(),
                realm_type: pending.realm_type,
                origin: desc.origin,
                execution_context_id: desc.id,
                session: session_id,
                browsing_context: None,
                owners: pending.owners,
            });
        }
    }

    async fn attach_browsing_context(&mut self, session_id: SessionId, target_info: cdp::target::TargetInfo) {
        let context_id = BrowsingContextId::from(target_info.target_id.clone());
        let user_context = UserContextId::from_cdp(target_info.browser_context_id.clone());

        let is_swap = self.contexts.find_by_id(&context_id).is_some();
        if !is_swap {
            self.contexts.insert(BrowsingContext::new_top_level(
                context_id.clone(),
                user_context,
                target_info.target_id.clone(),
            ));
            if let Some(context) = self.contexts.find_by_id(&context_id).cloned() {
                self.publish_context_created(&context);
            }
        } else if let Ok(ctx) = self.contexts.get_by_id_mut(&context_id) {
            ctx.owning_target = target_info.target_id.clone();
        }
        self.contexts.bind_session(session_id.clone(), context_id.clone());

        self.create_cdp_target(session_id, target_info.target_id, Some(context_id)).await;
    }

    async fn create_cdp_target(&mut self, session_id: SessionId, target_id: TargetId, context_id: Option<BrowsingContextId>) {
        let top_level_id = context_id
            .clone()
            .unwrap_or_else(|| BrowsingContextId::from(target_id.clone()));
        let target = CdpTarget::new(target_id.clone(), session_id.clone(), top_level_id.clone());
        self.targets.insert(target_id.clone(), target);

        let Some(client) = self.conn.get_cdp_client(&session_id) else {
            return;
        };

        let enable_network = self.events.has_network_subscriber_for_subtree(&top_level_id, &self.contexts);
        let fetch_stages = self.network.interception_stages(&top_level_id, &self.contexts);
        let preload_scripts: Vec<PendingPreloadInstall> = context_id
            .as_ref()
            .map(|ctx| {
                self.preload_scripts
                    .matching(ctx)
                    .into_iter()
                    .map(|s| PendingPreloadInstall {
                        id: s.id.clone(),
                        source: s.source.clone(),
                        sandbox: s.sandbox.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let plan = UnblockPlan {
            accept_insecure_certs: self.config.accept_insecure_certs,
            enable_network,
            fetch_stages,
            preload_scripts,
        };

        let (outcome, network_enabled, stages, installed) =
            cdp_target::run_unblock_sequence(client.as_ref(), &plan).await;

        if let Some(target) = self.targets.get_mut(&target_id) {
            target.network_enabled = network_enabled;
            target.fetch_stages = stages;
            target.installed_preload_scripts = installed;
            target.resolve_unblocked(outcome);
        }
        self.network.commit_stages(target_id, stages);
    }

    pub fn on_detached_from_target(&mut self, event: cdp::target::EventDetachedFromTarget) {
        if let Some(ctx) = self.contexts.find_by_session(&event.session_id).cloned() {
            let removed = self.contexts.remove_subtree(&ctx.id);
            self.contexts.unbind_session(&event.session_id);
            for dead in &removed {
                self.realms.invalidate_context(&dead.id);
                self.publish_context_destroyed(dead);
                self.preload_scripts_forget_target(&dead.owning_target);
                self.events.forget_context(&dead.id);
            }
        } else {
            self.realms.remove_by_session(&event.session_id);
        }
        self.worker_realms.remove(&event.session_id);
        self.requests.dispose_by_session(&event.session_id);
        if let Some(target_id) = event.target_id {
            self.targets.remove(&target_id);
        }
    }

    fn preload_scripts_forget_target(&mut self, target: &TargetId) {
        for script in self.preload_scripts.all().map(|s| s.id.clone()).collect::<Vec<_>>() {
            if let Some(script) = self.preload_scripts.get_mut(&script) {
                script.installed_on.remove(target);
            }
        }
    }

    pub fn on_target_crashed(&mut self, session_id: &SessionId) {
        self.realms.remove_by_session(session_id);
    }

    pub fn on_frame_attached(&mut self, event: cdp::page::EventFrameAttached) {
        let parent_id = BrowsingContextId::from(event.parent_frame_id.clone());
        let Ok(parent) = self.contexts.get_by_id(&parent_id) else {
            return;
        };
        let user_context = parent.user_context.clone();
        let owning_target = parent.owning_target.clone();
        let child_id = BrowsingContextId::from(event.frame_id);
        self.contexts
            .insert(BrowsingContext::new_child(child_id.clone(), parent_id, user_context, owning_target));
        if let Some(context) = self.contexts.find_by_id(&child_id).cloned() {
            self.publish_context_created(&context);
        }
    }

    pub fn on_frame_detached(&mut self, event: cdp::page::EventFrameDetached) {
        if event.reason == cdp::page::FrameDetachedReason::Swap {
            return;
        }
        let id = BrowsingContextId::from(event.frame_id);
        for dead in self.contexts.remove_subtree(&id) {
            self.realms.invalidate_context(&dead.id);
            self.publish_context_destroyed(&dead);
            self.events.forget_context(&dead.id);
        }
    }

    // ---- §4.4 intercept registry --------------------------------------------

    pub fn add_intercept(
        &mut self,
        patterns: Vec<UrlPattern>,
        phases: Vec<InterceptPhase>,
        contexts: Option<Vec<BrowsingContextId>>,
    ) -> InterceptId {
        self.network.add_intercept(patterns, phases, contexts)
    }

    pub fn remove_intercept(&mut self, id: &InterceptId) -> Result<(), BidiError> {
        self.network.remove_intercept(id)
    }

    // ---- §4.5 network lifecycle ----------------------------------------------

    pub fn on_network_event(&mut self, event: CdpEvent, session_id: Option<SessionId>) {
        let Some(session_id) = session_id else { return };
        let Some(context) = self.contexts.find_by_session(&session_id).cloned() else {
            return;
        };
        match event {
            CdpEvent::NetworkRequestWillBeSent(e) => {
                let is_redirect = e.redirect_response.is_some();
                let outcome = self.requests.on_request_will_be_sent(
                    BidiRequestId(e.request_id.0.clone()),
                    session_id,
                    context.id.clone(),
                    e.request.url,
                    e.request.method,
                    is_redirect,
                    &self.network,
                    &self.contexts,
                );
                self.publish_network_outcome(&context.id, outcome);
            }
            CdpEvent::NetworkResponseReceived(e) => {
                let id = BidiRequestId(e.request_id.0.clone());
                let outcome = self.requests.on_response_received(&id, &self.network, &self.contexts);
                self.publish_network_outcome(&context.id, outcome);
            }
            CdpEvent::NetworkLoadingFailed(e) => {
                let id = BidiRequestId(e.request_id.0.clone());
                let outcome = self.requests.on_loading_failed(&id);
                self.publish_network_outcome(&context.id, outcome);
            }
            CdpEvent::NetworkLoadingFinished(e) => {
                let outcome = self.requests.on_loading_finished(&BidiRequestId(e.request_id.0.clone()));
                self.publish_network_outcome(&context.id, outcome);
            }
            CdpEvent::NetworkRequestServedFromCache(e) => {
                self.requests.on_served_from_cache(&BidiRequestId(e.request_id.0.clone()));
            }
            CdpEvent::NetworkRequestWillBeSentExtraInfo(e) => {
                self.requests.merge_request_extra_info(&BidiRequestId(e.request_id.0.clone()));
            }
            CdpEvent::NetworkResponseReceivedExtraInfo(e) => {
                self.requests.merge_response_extra_info(&BidiRequestId(e.request_id.0.clone()));
            }
            _ => {}
        }
    }

    /// §4.5 S5: resolve an unmatched auth challenge with CDP's own default
    /// flow; this is the one case that needs a live `CdpClient`, so it is
    /// handled separately from the pure `on_network_event` reducer.
    pub async fn on_auth_required(&mut self, event: cdp::fetch::EventAuthRequired, session_id: SessionId) {
        let Some(context) = self.contexts.find_by_session(&session_id).cloned() else {
            return;
        };
        let bidi_id = event
            .network_id
            .map(|id| BidiRequestId(id.0))
            .unwrap_or_else(|| BidiRequestId(event.request_id.0.clone()));
        let outcome = self.requests.on_auth_required(&bidi_id, event.request_id, &self.network, &self.contexts);
        match outcome {
            NetworkOutcome::ResumeAuthWithDefault { fetch_id } => {
                if let Some(client) = self.conn.get_cdp_client(&session_id) {
                    let _ = client
                        .send_command(
                            "Fetch.continueWithAuth",
                            json!({
                                "requestId": fetch_id.0,
                                "authChallengeResponse": { "response": "Default" },
                            }),
                        )
                        .await;
                }
            }
            other => self.publish_network_outcome(&context.id, other),
        }
    }

    /// `Fetch.requestPaused` fires whenever either interception stage is
    /// armed on the target, whether or not this particular request actually
    /// matched a registered intercept. An unmatched pause is continued
    /// immediately; a matched one waits for the corresponding BiDi phase to
    /// settle (`network.continueRequest`/`continueResponse`/`failRequest`)
    /// before the fetch domain is told to proceed.
    pub async fn on_request_paused(&mut self, event: cdp::fetch::EventRequestPaused, session_id: SessionId) {
        let Some(network_id) = event.network_id.clone() else { return };
        let bidi_id = BidiRequestId(network_id.0);
        self.requests.set_fetch_id(&bidi_id, event.request_id.clone());

        let Some(client) = self.conn.get_cdp_client(&session_id) else {
            return;
        };
        let Some(request) = self.requests.get(&bidi_id) else {
            let _ = client
                .send_command("Fetch.continueRequest", json!({ "requestId": event.request_id.0 }))
                .await;
            return;
        };

        if request.blocked_by.is_empty() {
            let _ = client
                .send_command("Fetch.continueRequest", json!({ "requestId": event.request_id.0 }))
                .await;
        } else {
            let settled = request.phase_settled.clone();
            let fetch_id = event.request_id.clone();
            tokio::spawn(async move {
                settled.wait().await;
                let _ = client
                    .send_command("Fetch.continueRequest", json!({ "requestId": fetch_id.0 }))
                    .await;
            });
        }
    }

    fn publish_network_outcome(&mut self, context_id: &BrowsingContextId, outcome: NetworkOutcome) {
        let method = match &outcome {
            NetworkOutcome::EmitBeforeRequestSent { .. } => Some("network.beforeRequestSent"),
            NetworkOutcome::EmitResponseStarted { .. } => Some("network.responseStarted"),
            NetworkOutcome::EmitAuthRequired { .. } => Some("network.authRequired"),
            NetworkOutcome::EmitFetchError => Some("network.fetchError"),
            NetworkOutcome::EmitResponseCompleted => Some("network.responseCompleted"),
            NetworkOutcome::Redirected | NetworkOutcome::ResumeAuthWithDefault { .. } | NetworkOutcome::Ignored => None,
        };
        let Some(method) = method else { return };
        let is_blocked = match &outcome {
            NetworkOutcome::EmitBeforeRequestSent { is_blocked }
            | NetworkOutcome::EmitResponseStarted { is_blocked }
            | NetworkOutcome::EmitAuthRequired { is_blocked } => *is_blocked,
            _ => false,
        };
        self.events.register_event(
            method.split('.').next().unwrap_or(method),
            Some(context_id.clone()),
            json!({ "method": method, "params": { "context": context_id.0, "isBlocked": is_blocked } }),
            &self.contexts,
        );
    }

    /// §3 invariant (c): always called once storage already reflects the
    /// disposal, never before.
    fn publish_context_destroyed(&mut self, context: &BrowsingContext) {
        self.events.register_event(
            "browsingContext",
            Some(context.id.clone()),
            json!({
                "method": "browsingContext.contextDestroyed",
                "params": {
                    "context": context.id.0,
                    "url": context.url,
                    "parent": context.parent.as_ref().map(|p| p.0.clone()),
                }
            }),
            &self.contexts,
        );
    }

    fn publish_context_created(&mut self, context: &BrowsingContext) {
        self.events.register_event(
            "browsingContext",
            Some(context.id.clone()),
            json!({
                "method": "browsingContext.contextCreated",
                "params": {
                    "context": context.id.0,
                    "url": context.url,
                    "parent": context.parent.as_ref().map(|p| p.0.clone()),
                }
            }),
            &self.contexts,
        );
    }

    // ---- §8 S1 browsingContext.create/close/navigate ---------------------------

    /// `browsingContext.create` (§8 S1): sends `Target.createTarget` and
    /// resolves the id the new context will have. The reply to the BiDi
    /// client is held back by [`crate::mapper::Mapper`] until the
    /// corresponding `attachedToTarget` actually lands the context in
    /// storage — this method only performs the CDP round trip, it does not
    /// itself wait for that, since the wait has to happen from the same
    /// place that drives `on_attached_to_target`.
    pub async fn create_browsing_context(
        &mut self,
        create_type: bidi::browsing_context::CreateType,
        user_context: Option<UserContextId>,
    ) -> Result<BrowsingContextId, BidiError> {
        let client = self.conn.browser_client();
        let browser_context_id = user_context.filter(|u| !u.is_default()).map(|u| u.0);
        let result = client
            .send_command(
                "Target.createTarget",
                json!({
                    "url": "about:blank",
                    "newWindow": matches!(create_type, bidi::browsing_context::CreateType::Window),
                    "browserContextId": browser_context_id,
                }),
            )
            .await
            .map_err(BidiError::from)?;
        let target_id = result
            .get("targetId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BidiError::new(ErrorCode::UnknownError, "Target.createTarget returned no targetId"))?;
        Ok(BrowsingContextId::from(TargetId::new(target_id)))
    }

    /// `browsingContext.close`: the context's own removal and
    /// `contextDestroyed` emission follow from the `Target.detachedFromTarget`
    /// this triggers (§4.3), same as any other target going away.
    pub async fn close_browsing_context(&mut self, context_id: &BrowsingContextId) -> Result<(), BidiError> {
        let context = self.contexts.get_by_id(context_id)?;
        let target_id = context.owning_target.clone();
        self.conn
            .browser_client()
            .send_command("Target.closeTarget", json!({ "targetId": target_id.0 }))
            .await
            .map_err(BidiError::from)?;
        Ok(())
    }

    pub async fn navigate_browsing_context(&mut self, context_id: &BrowsingContextId, url: String) -> Result<(), BidiError> {
        self.contexts.get_by_id(context_id)?;
        let Some(session_id) = self.contexts.session_for_context(context_id) else {
            return Ok(());
        };
        let Some(client) = self.conn.get_cdp_client(&session_id) else {
            return Ok(());
        };
        client
            .send_command("Page.navigate", json!({ "url": url }))
            .await
            .map_err(BidiError::from)?;
        Ok(())
    }

    // ---- §3 preload scripts ---------------------------------------------------

    pub fn add_preload_script(
        &mut self,
        source: String,
        sandbox: Option<String>,
        context_filter: Option<BrowsingContextId>,
    ) -> PreloadScriptId {
        let script = PreloadScript::new(source, sandbox, Vec::new(), context_filter);
        self.preload_scripts.insert(script)
    }

    pub fn remove_preload_script(&mut self, id: &PreloadScriptId) -> Result<(), BidiError> {
        self.preload_scripts.remove(id).map(|_| ())
    }

    // ---- §4.6 subscriptions ----------------------------------------------------

    pub fn subscribe(&mut self, names: Vec<String>, contexts: Option<Vec<BrowsingContextId>>) -> SubscriptionId {
        self.events.subscribe(names, contexts, &self.contexts)
    }

    pub fn unsubscribe(&mut self, ids: &[SubscriptionId]) {
        self.events.unsubscribe(ids);
    }

    // ---- §2.2 setViewport supplement -------------------------------------------

    /// §9 Open Question, resolved: `browsingContext.setViewport` is
    /// rejected outright for any non-top-level context.
    pub fn set_viewport(&self, context_id: &BrowsingContextId) -> Result<(), BidiError> {
        let context = self.contexts.get_by_id(context_id)?;
        if !context.is_top_level() {
            return Err(BidiError::invalid_argument(
                "setViewport is only supported on top-level browsing contexts",
            ));
        }
        Ok(())
    }

    pub fn drain_events(&mut self) -> Vec<bidi::OutgoingMessage> {
        self.events
            .drain_outbox()
            .into_iter()
            .map(|e| {
                let method = e.payload.get("method").and_then(|m| m.as_str()).unwrap_or(&e.module).to_string();
                let params = e.payload.get("params").cloned().unwrap_or(serde_json::Value::Null);
                bidi::OutgoingMessage::event(method, params)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conn::CdpClient;
    use crate::domain::cdp_target::UnblockOutcome;
    use crate::error::CdpError;

    struct StubClient;

    #[async_trait::async_trait]
    impl CdpClient for StubClient {
        fn session_id(&self) -> Option<&SessionId> {
            None
        }

        async fn send_command(&self, method: &str, _params: serde_json::Value) -> Result<serde_json::Value, CdpError> {
            if method == "Page.addScriptToEvaluateOnNewDocument" {
                return Ok(json!({ "identifier": "script-0" }));
            }
            Ok(json!({}))
        }
    }

    struct StubConnection;

    impl CdpConnection for StubConnection {
        fn browser_client(&self) -> Arc<dyn CdpClient> {
            Arc::new(StubClient)
        }

        fn get_cdp_client(&self, _session_id: &SessionId) -> Option<Arc<dyn CdpClient>> {
            Some(Arc::new(StubClient))
        }
    }

    fn processor() -> BrowsingContextProcessor {
        BrowsingContextProcessor::new(Arc::new(StubConnection), MapperConfig::default())
    }

    fn target_info(id: &str, kind: cdp::target::TargetType) -> cdp::target::TargetInfo {
        cdp::target::TargetInfo {
            target_id: TargetId::new(id),
            target_type: kind,
            title: String::new(),
            url: "about:blank".into(),
            attached: true,
            opener_id: None,
            browser_context_id: None,
        }
    }

    #[tokio::test]
    async fn attaching_a_page_target_creates_a_top_level_context_and_unblocks() {
        let mut proc = processor();
        proc.on_attached_to_target(None, cdp::target::EventAttachedToTarget {
            session_id: SessionId::new("s1"),
            target_info: target_info("t1", cdp::target::TargetType::Page),
            waiting_for_debugger: true,
        })
        .await;

        assert_eq!(proc.contexts.len(), 1);
        let context = proc.contexts.get_by_id(&"t1".into()).unwrap();
        assert!(context.is_top_level());
        let target = proc.targets.get(&TargetId::new("t1")).unwrap();
        assert!(matches!(target.unblocked.wait().await, UnblockOutcome::Success));
    }

    #[tokio::test]
    async fn detaching_removes_the_context_and_disposes_its_requests() {
        let mut proc = processor();
        proc.on_attached_to_target(None, cdp::target::EventAttachedToTarget {
            session_id: SessionId::new("s1"),
            target_info: target_info("t1", cdp::target::TargetType::Page),
            waiting_for_debugger: true,
        })
        .await;
        proc.requests.on_request_will_be_sent(
            BidiRequestId("r1".into()),
            SessionId::new("s1"),
            "t1".into(),
            "http://example.com/".into(),
            "GET".into(),
            false,
            &proc.network,
            &proc.contexts,
        );

        proc.on_detached_from_target(cdp::target::EventDetachedFromTarget {
            session_id: SessionId::new("s1"),
            target_id: Some(TargetId::new("t1")),
        });

        assert!(proc.contexts.is_empty());
        assert!(proc.requests.is_empty());
    }

    #[tokio::test]
    async fn setting_a_self_target_releases_the_debugger_instead_of_attaching() {
        let mut proc = processor();
        proc.set_self_target_id(TargetId::new("self"));
        proc.on_attached_to_target(None, cdp::target::EventAttachedToTarget {
            session_id: SessionId::new("s1"),
            target_info: target_info("self", cdp::target::TargetType::Page),
            waiting_for_debugger: true,
        })
        .await;
        assert!(proc.contexts.is_empty());
    }
}
